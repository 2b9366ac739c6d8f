//! Lexical path handling for extraction targets

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root stays at the root; leading `..` of a relative path is kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::Prefix(_)) | Some(Component::RootDir) => {}
                _ => normalized.push(".."),
            },
            Component::Normal(name) => normalized.push(name),
        }
    }
    normalized
}

/// Returns true if `candidate` lies within `base` once both are normalized
pub fn is_within(base: &Path, candidate: &Path) -> bool {
    normalize_lexically(candidate).starts_with(normalize_lexically(base))
}

/// Drop the first `count` components of an archive entry path.
///
/// Root and `.` components are ignored. Returns `None` when nothing is left.
pub fn strip_components(path: &Path, count: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path
        .components()
        .filter(|component| matches!(component, Component::Normal(_) | Component::ParentDir))
        .skip(count)
        .collect();

    if stripped.as_os_str().is_empty() {
        None
    } else {
        Some(stripped)
    }
}

/// Returns true if every `..` of a relative path comes before its first name
pub fn ascends_only_first(path: &Path) -> bool {
    let mut descended = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => descended = true,
            Component::ParentDir if descended => return false,
            _ => {}
        }
    }
    true
}
