//! Integration tests for devpack
//!
//! These tests verify:
//! - Range resolution against candidate lists and manifests
//! - Layered devcontainer.json merging
//! - Archive extraction against hostile and well-formed archives
//! - Command implementations end to end through the library

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Test fixture directory creation helper
fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Build a tar.gz from (name, contents, mode) triples, writing names verbatim
fn build_archive(files: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, contents, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(contents.len() as u64);
        header.set_mode(*mode);
        header.set_cksum();
        builder.append(&header, *contents).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

const NODE_MANIFEST: &str = r#"[
  {"version": "16.20.2", "stable": true, "release_url": "", "files": []},
  {"version": "18.19.0", "stable": true, "release_url": "", "files": [
    {"filename": "node-18.19.0-linux-x64.tar.gz", "arch": "x64", "platform": "linux",
     "download_url": "https://example.com/node-18.19.0-linux-x64.tar.gz"}
  ]},
  {"version": "18.20.1", "stable": true, "release_url": "", "files": [
    {"filename": "node-18.20.1-linux-x64.tar.gz", "arch": "x64", "platform": "linux",
     "download_url": "https://example.com/node-18.20.1-linux-x64.tar.gz"}
  ]},
  {"version": "20.11.0", "stable": true, "release_url": "", "files": []},
  {"version": "21.0.0-rc.1", "stable": false, "release_url": "", "files": []}
]"#;

mod version_resolution {
    use devpack::error::ResolveError;
    use devpack::version::{resolve, CandidateVersion, VersionManifest};

    fn candidates(versions: &[(&str, bool)]) -> Vec<CandidateVersion> {
        versions
            .iter()
            .map(|(v, stable)| CandidateVersion::new(*v, *stable))
            .collect()
    }

    #[test]
    fn test_caret_stays_below_next_major() {
        let list = candidates(&[
            ("1.2.2", true),
            ("1.2.3", true),
            ("1.9.9", true),
            ("2.0.0", true),
        ]);
        let resolution = resolve("^1.2.3", &list, true).unwrap();
        assert_eq!(resolution.version.to_string(), "1.9.9");
    }

    #[test]
    fn test_tilde_stays_below_next_minor() {
        let list = candidates(&[("1.2.3", true), ("1.2.9", true), ("1.3.0", true)]);
        let resolution = resolve("~1.2.3", &list, true).unwrap();
        assert_eq!(resolution.version.to_string(), "1.2.9");
    }

    #[test]
    fn test_hyphen_and_wildcard_ranges() {
        let list = candidates(&[("1.0.0", true), ("1.4.2", true), ("2.1.0", true)]);
        assert_eq!(
            resolve("1.0.0 - 1.5.0", &list, true).unwrap().version.to_string(),
            "1.4.2"
        );
        assert_eq!(resolve("2.*", &list, true).unwrap().version.to_string(), "2.1.0");
        assert_eq!(resolve("1", &list, true).unwrap().version.to_string(), "1.4.2");
    }

    #[test]
    fn test_latest_respects_stability() {
        let list = candidates(&[("1.0.0", true), ("1.1.0", true), ("2.0.0-beta.1", false)]);
        assert_eq!(resolve("latest", &list, true).unwrap().version.to_string(), "1.1.0");
        assert_eq!(
            resolve("latest", &list, false).unwrap().version.to_string(),
            "2.0.0-beta.1"
        );
    }

    #[test]
    fn test_no_match_and_malformed() {
        let list = candidates(&[("1.0.0", true)]);
        assert!(matches!(
            resolve("^2.0.0", &list, true),
            Err(ResolveError::NoMatch { .. })
        ));
        assert!(matches!(
            resolve("^1.a", &list, true),
            Err(ResolveError::MalformedExpression { .. })
        ));
        assert!(matches!(
            resolve("latest", &candidates(&[("1.0.0", false)]), true),
            Err(ResolveError::NoMatch { .. })
        ));
    }

    #[test]
    fn test_huge_operands_fail_without_panicking() {
        let list = candidates(&[("1.0.0", true)]);
        for expression in ["^18446744073709551615", "~0.18446744073709551615.1", "18446744073709551615"] {
            assert!(matches!(
                resolve(expression, &list, true),
                Err(ResolveError::MalformedExpression { .. })
            ));
        }
    }

    #[test]
    fn test_manifest_resolution() {
        let manifest = VersionManifest::from_slice(super::NODE_MANIFEST.as_bytes()).unwrap();
        assert_eq!(manifest.find_version("18", true).unwrap(), "18.20.1");
        assert_eq!(manifest.find_version("~18.19", true).unwrap(), "18.19.0");
        assert_eq!(manifest.find_version("latest", true).unwrap(), "20.11.0");
        assert_eq!(manifest.find_version("latest", false).unwrap(), "21.0.0-rc.1");
        assert_eq!(manifest.find_version(">=16 <18", true).unwrap(), "16.20.2");
    }
}

mod config_merge {
    use super::*;
    use devpack::devcontainer::{merge, DevContainer, MergeMode};
    use devpack::error::MergeError;
    use serde_json::{json, Value};

    fn doc(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_array_concatenation() {
        let merged = merge(
            &[doc(json!({"a": [1, 2]})), doc(json!({"a": [3]}))],
            MergeMode::Lenient,
        )
        .unwrap();
        assert_eq!(Value::Object(merged), json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn test_lifecycle_hooks_are_chained() {
        let merged = merge(
            &[
                doc(json!({"postCreateCommand": "echo a"})),
                doc(json!({"postCreateCommand": "echo b"})),
            ],
            MergeMode::Lenient,
        )
        .unwrap();
        assert_eq!(merged["postCreateCommand"], json!("echo a; echo b"));
    }

    #[test]
    fn test_strict_type_conflict() {
        let result = merge(&[doc(json!({"a": 1})), doc(json!({"a": [1]}))], MergeMode::Strict);
        assert!(matches!(result, Err(MergeError::TypeConflict { .. })));

        let lenient = merge(&[doc(json!({"a": 1})), doc(json!({"a": [1]}))], MergeMode::Lenient)
            .unwrap();
        assert_eq!(lenient["a"], json!([1]));
    }

    #[test]
    fn test_sequence_associativity() {
        let a = doc(json!({"x": {"y": [1]}, "postStartCommand": "a"}));
        let b = doc(json!({"x": {"y": [2], "z": true}, "postStartCommand": "b"}));
        let c = doc(json!({"x": {"z": false}, "name": "c", "postStartCommand": "c"}));

        let all = merge(&[a.clone(), b.clone(), c.clone()], MergeMode::Lenient).unwrap();
        let ab = merge(&[a, b], MergeMode::Lenient).unwrap();
        let stepwise = merge(&[ab, c], MergeMode::Lenient).unwrap();
        assert_eq!(all, stepwise);
    }

    #[test]
    fn test_feature_fragment_into_project_config() {
        let temp_dir = create_test_dir();
        fs::create_dir(temp_dir.path().join(".devcontainer")).unwrap();
        fs::write(
            temp_dir.path().join(".devcontainer/devcontainer.json"),
            r#"{
                // project settings
                "image": "mcr.microsoft.com/devcontainers/base:ubuntu",
                "forwardPorts": [3000],
                "postCreateCommand": "npm ci",
            }"#,
        )
        .unwrap();
        let feature_path = temp_dir.path().join("feature.json");
        fs::write(
            &feature_path,
            r#"{"forwardPorts": [9229], "postCreateCommand": "node --version", "privileged": true}"#,
        )
        .unwrap();

        let mut project = DevContainer::load(temp_dir.path()).unwrap().unwrap();
        let feature = DevContainer::from_path(&feature_path).unwrap();
        project.merge(&feature).unwrap();
        project.convert_unsupported_properties_to_run_args();

        assert_eq!(
            Value::Object(project.properties),
            json!({
                "image": "mcr.microsoft.com/devcontainers/base:ubuntu",
                "forwardPorts": [3000, 9229],
                "postCreateCommand": "npm ci; node --version",
                "runArgs": ["--privileged"]
            })
        );
    }
}

mod archive_extraction {
    use super::*;
    use devpack::archive::{copy_recursive, extract, Extractor};
    use devpack::error::ArchiveError;

    #[test]
    fn test_traversal_entry_is_skipped_and_rest_extracted() {
        let temp_dir = create_test_dir();
        let destination = temp_dir.path().join("a/b");
        let archive = build_archive(&[
            ("bin/tool", b"tool", 0o755),
            ("../../etc/passwd", b"owned", 0o644),
            ("share/doc", b"doc", 0o644),
        ]);

        let summary = Extractor::new(&destination)
            .extract_from(archive.as_slice())
            .unwrap();
        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.skipped, 1);
        assert!(!temp_dir.path().join("etc/passwd").exists());
        assert!(destination.join("bin/tool").is_file());
        assert!(destination.join("share/doc").is_file());
    }

    #[test]
    fn test_strip_one_component() {
        let temp_dir = create_test_dir();
        let archive = build_archive(&[("node-v18/bin/node", b"elf", 0o755)]);

        extract(&archive, temp_dir.path(), 1).unwrap();
        assert_eq!(fs::read(temp_dir.path().join("bin/node")).unwrap(), b"elf");
        assert!(!temp_dir.path().join("node-v18").exists());
    }

    #[test]
    fn test_strip_more_than_depth_skips_everything() {
        let temp_dir = create_test_dir();
        let archive = build_archive(&[("pkg/file", b"x", 0o644)]);

        let summary = Extractor::new(temp_dir.path())
            .with_strip_components(2)
            .extract_from(archive.as_slice())
            .unwrap();
        assert_eq!(summary.extracted, 0);
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_round_trip_from_file_tree() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = create_test_dir();
        let source = temp_dir.path().join("source");
        fs::create_dir_all(source.join("bin")).unwrap();
        fs::write(source.join("bin/run"), "#!/bin/sh\n").unwrap();
        fs::set_permissions(source.join("bin/run"), fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(source.join("config"), "key=value\n").unwrap();
        fs::set_permissions(source.join("config"), fs::Permissions::from_mode(0o640)).unwrap();

        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        builder.append_dir_all("pkg", &source).unwrap();
        let archive = builder.into_inner().unwrap().finish().unwrap();

        let destination = temp_dir.path().join("out");
        extract(&archive, &destination, 1).unwrap();

        for (path, mode) in [("bin/run", 0o755), ("config", 0o640)] {
            let original = source.join(path);
            let extracted = destination.join(path);
            assert_eq!(fs::read(&original).unwrap(), fs::read(&extracted).unwrap());
            assert_eq!(
                fs::metadata(&extracted).unwrap().permissions().mode() & 0o777,
                mode
            );
        }
    }

    #[test]
    fn test_corrupt_archive() {
        let temp_dir = create_test_dir();
        let result = extract(b"not a gzip stream at all", temp_dir.path(), 0);
        assert!(matches!(result, Err(ArchiveError::Format { .. })));
    }

    #[test]
    fn test_copy_extracted_tree() {
        let temp_dir = create_test_dir();
        let archive = build_archive(&[("layer/bin/tool", b"tool", 0o755)]);
        let staging = temp_dir.path().join("staging");
        extract(&archive, &staging, 0).unwrap();

        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();
        copy_recursive(&staging.join("layer"), &target).unwrap();
        copy_recursive(&staging.join("optional"), &target).unwrap();

        assert_eq!(fs::read(target.join("layer/bin/tool")).unwrap(), b"tool");
        assert!(!target.join("optional").exists());
    }
}

mod commands {
    use super::*;
    use devpack::cli::{ExtractArgs, MergeArgs, ResolveArgs};
    use devpack::commands;
    use devpack::error::{AppError, ResolveError};

    fn resolve_args(manifest: &Path, range: &str) -> ResolveArgs {
        ResolveArgs {
            range: range.to_string(),
            manifest: manifest.to_string_lossy().into_owned(),
            include_unstable: false,
            download_url: false,
            arch: None,
            os: None,
            distro_version: None,
        }
    }

    #[tokio::test]
    async fn test_resolve_from_manifest_file() {
        let temp_dir = create_test_dir();
        let manifest = temp_dir.path().join("versions-manifest.json");
        fs::write(&manifest, NODE_MANIFEST).unwrap();

        let output = commands::resolve(&resolve_args(&manifest, "^18"), false)
            .await
            .unwrap();
        assert_eq!(output, "18.20.1");
    }

    #[tokio::test]
    async fn test_resolve_with_download_url() {
        let temp_dir = create_test_dir();
        let manifest = temp_dir.path().join("versions-manifest.json");
        fs::write(&manifest, NODE_MANIFEST).unwrap();

        let args = ResolveArgs {
            download_url: true,
            arch: Some("x64".to_string()),
            os: Some("linux".to_string()),
            ..resolve_args(&manifest, "~18.19")
        };
        let output = commands::resolve(&args, false).await.unwrap();
        assert_eq!(
            output,
            "18.19.0\nhttps://example.com/node-18.19.0-linux-x64.tar.gz"
        );
    }

    #[tokio::test]
    async fn test_resolve_without_download_for_platform() {
        let temp_dir = create_test_dir();
        let manifest = temp_dir.path().join("versions-manifest.json");
        fs::write(&manifest, NODE_MANIFEST).unwrap();

        let args = ResolveArgs {
            download_url: true,
            arch: Some("arm64".to_string()),
            os: Some("darwin".to_string()),
            ..resolve_args(&manifest, "18")
        };
        let err = commands::resolve(&args, false).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Resolve(ResolveError::NoDownload { .. })
        ));
    }

    #[test]
    fn test_merge_command_with_directory_and_file() {
        let temp_dir = create_test_dir();
        fs::write(
            temp_dir.path().join("devcontainer.json"),
            r#"{"name": "app", "capAdd": ["SYS_PTRACE"]}"#,
        )
        .unwrap();
        let fragment = temp_dir.path().join("fragment.json");
        fs::write(&fragment, r#"{"name": "override", "init": true}"#).unwrap();

        let args = MergeArgs {
            files: vec![temp_dir.path().to_path_buf(), fragment],
            strict: false,
            run_args: true,
        };
        let output = commands::merge(&args).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "override",
                "runArgs": ["--init", "--cap-add=SYS_PTRACE"]
            })
        );
    }

    #[tokio::test]
    async fn test_extract_command() {
        let temp_dir = create_test_dir();
        let archive_path = temp_dir.path().join("pkg.tar.gz");
        fs::write(&archive_path, build_archive(&[("pkg/bin/tool", b"tool", 0o755)])).unwrap();

        let args = ExtractArgs {
            archive: archive_path.to_string_lossy().into_owned(),
            destination: temp_dir.path().join("out"),
            strip: 1,
        };
        let summary = commands::extract(&args, false).await.unwrap();
        assert_eq!(summary.extracted, 1);
        assert!(temp_dir.path().join("out/bin/tool").is_file());
    }
}
