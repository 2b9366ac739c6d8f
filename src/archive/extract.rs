//! tar.gz extraction with traversal protection
//!
//! Entries are applied in stream order. An entry whose target, or whose link
//! target, would land outside the destination is skipped with a warning and
//! extraction continues. A corrupt stream is an [`ArchiveError::Format`]; a
//! failed write is an [`ArchiveError::Io`] and leaves whatever was already
//! written in place.

use crate::archive::path::{ascends_only_first, is_within, normalize_lexically, strip_components};
use crate::error::ArchiveError;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Entry, EntryType};
use tracing::{debug, warn};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Counts of applied and skipped entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub extracted: usize,
    pub skipped: usize,
}

/// Extract gzip-compressed tar bytes into `destination`
pub fn extract(
    archive: &[u8],
    destination: &Path,
    strip_components: usize,
) -> Result<(), ArchiveError> {
    Extractor::new(destination)
        .with_strip_components(strip_components)
        .extract_from(archive)
        .map(|_| ())
}

/// Extracts tar.gz streams into a destination directory
#[derive(Debug, Clone)]
pub struct Extractor {
    destination: PathBuf,
    strip_components: usize,
}

impl Extractor {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            strip_components: 0,
        }
    }

    /// Drop this many leading path components from every entry
    pub fn with_strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }

    /// Extract a gzip-compressed tar stream
    pub fn extract_from<R: Read>(&self, reader: R) -> Result<ExtractSummary, ArchiveError> {
        fs::create_dir_all(&self.destination)
            .map_err(|e| ArchiveError::io(&self.destination, e))?;
        let root = std::path::absolute(&self.destination)
            .map(|path| normalize_lexically(&path))
            .map_err(|e| ArchiveError::io(&self.destination, e))?;
        let canonical_root = root.canonicalize().map_err(|e| ArchiveError::io(&root, e))?;

        let unpacker = Unpacker {
            root,
            canonical_root,
            strip_components: self.strip_components,
            directories: Vec::new(),
        };
        unpacker.run(reader)
    }
}

struct Unpacker {
    root: PathBuf,
    canonical_root: PathBuf,
    strip_components: usize,
    /// Directory modes, applied once every entry is written
    directories: Vec<(PathBuf, u32)>,
}

impl Unpacker {
    fn run<R: Read>(mut self, reader: R) -> Result<ExtractSummary, ArchiveError> {
        let mut archive = Archive::new(GzDecoder::new(reader));
        let entries = archive.entries().map_err(format_error)?;

        let mut summary = ExtractSummary::default();
        for entry in entries {
            let mut entry = entry.map_err(format_error)?;
            if self.unpack(&mut entry)? {
                summary.extracted += 1;
            } else {
                summary.skipped += 1;
            }
        }

        for (path, mode) in self.directories.iter().rev() {
            set_mode(path, *mode)?;
        }

        debug!(
            destination = %self.root.display(),
            extracted = summary.extracted,
            skipped = summary.skipped,
            "extraction finished"
        );
        Ok(summary)
    }

    /// Apply one entry; returns false if it was skipped
    fn unpack<R: Read>(&mut self, entry: &mut Entry<'_, R>) -> Result<bool, ArchiveError> {
        let raw_path = entry.path().map_err(format_error)?.into_owned();
        let Some(relative) = strip_components(&raw_path, self.strip_components) else {
            debug!(entry = %raw_path.display(), "skipping entry removed by strip");
            return Ok(false);
        };

        let target = normalize_lexically(&self.root.join(&relative));
        if target == self.root {
            debug!(entry = %raw_path.display(), "skipping entry for the destination itself");
            return Ok(false);
        }
        if !is_within(&self.root, &target) {
            warn!(entry = %raw_path.display(), "skipping entry outside the destination");
            return Ok(false);
        }
        if !self.resolves_inside(target.parent().unwrap_or(self.root.as_path())) {
            warn!(entry = %raw_path.display(), "skipping entry below a link leaving the destination");
            return Ok(false);
        }

        let entry_type = entry.header().entry_type();
        let mode = entry.header().mode().map_err(format_error)? & 0o777;

        match entry_type {
            EntryType::Directory => {
                // create_dir_all and the deferred chmod would both follow a planted link
                if !self.resolves_inside(&target) {
                    warn!(entry = %raw_path.display(), "skipping directory over a link leaving the destination");
                    return Ok(false);
                }
                fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
                self.directories.push((target, mode));
            }
            EntryType::Regular | EntryType::Continuous => {
                create_parent(&target)?;
                remove_existing(&target)?;
                write_file(entry, &target)?;
                set_mode(&target, mode)?;
            }
            EntryType::Symlink => {
                let Some(link) = link_name(entry)? else {
                    warn!(entry = %raw_path.display(), "skipping symlink without a target");
                    return Ok(false);
                };
                create_parent(&target)?;
                if !self.symlink_stays_inside(&link, &target)? {
                    warn!(entry = %raw_path.display(), link = %link.display(), "skipping symlink pointing outside the destination");
                    return Ok(false);
                }

                remove_existing(&target)?;
                create_symlink(&link, &target).map_err(|e| ArchiveError::io(&target, e))?;
            }
            EntryType::Link => {
                let Some(link) = link_name(entry)? else {
                    warn!(entry = %raw_path.display(), "skipping hard link without a target");
                    return Ok(false);
                };
                // Hard link names are archive paths, so they are stripped like entry paths
                let Some(source) = strip_components(&link, self.strip_components)
                    .map(|relative| normalize_lexically(&self.root.join(relative)))
                else {
                    warn!(entry = %raw_path.display(), link = %link.display(), "skipping hard link to a stripped path");
                    return Ok(false);
                };
                if !is_within(&self.root, &source) || !self.resolves_inside(&source) {
                    warn!(entry = %raw_path.display(), link = %link.display(), "skipping hard link pointing outside the destination");
                    return Ok(false);
                }

                create_parent(&target)?;
                // A hard link to a symlink copies its relative target into a new directory
                if fs::symlink_metadata(&source).is_ok_and(|m| m.file_type().is_symlink()) {
                    let pointee = fs::read_link(&source).map_err(|e| ArchiveError::io(&source, e))?;
                    if !self.symlink_stays_inside(&pointee, &target)? {
                        warn!(entry = %raw_path.display(), link = %link.display(), "skipping hard link to a symlink leaving the destination");
                        return Ok(false);
                    }
                }
                remove_existing(&target)?;
                fs::hard_link(&source, &target).map_err(|e| ArchiveError::io(&target, e))?;
            }
            other => {
                debug!(entry = %raw_path.display(), kind = ?other, "skipping unsupported entry type");
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Check a symlink target as seen from the physical directory of `target`.
    ///
    /// Absolute targets and `..` after a name are refused: `name/..` is
    /// resolved through whatever `name` is at lookup time.
    fn symlink_stays_inside(&self, link: &Path, target: &Path) -> Result<bool, ArchiveError> {
        if link.is_absolute() || !ascends_only_first(link) {
            return Ok(false);
        }
        let link_dir = target.parent().unwrap_or(self.root.as_path());
        let physical_dir = link_dir
            .canonicalize()
            .map_err(|e| ArchiveError::io(link_dir, e))?;
        Ok(is_within(&self.canonical_root, &physical_dir.join(link)))
    }

    /// Returns true if the deepest existing ancestor of `path` resolves inside the root
    fn resolves_inside(&self, path: &Path) -> bool {
        let mut current = path;
        while fs::symlink_metadata(current).is_err() {
            match current.parent() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        current
            .canonicalize()
            .is_ok_and(|resolved| is_within(&self.canonical_root, &resolved))
    }
}

fn format_error(error: io::Error) -> ArchiveError {
    ArchiveError::format(error.to_string())
}

fn link_name<R: Read>(entry: &Entry<'_, R>) -> Result<Option<PathBuf>, ArchiveError> {
    entry
        .link_name()
        .map(|name| name.map(|name| name.into_owned()))
        .map_err(format_error)
}

fn create_parent(target: &Path) -> Result<(), ArchiveError> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e)),
        None => Ok(()),
    }
}

/// Remove a file or link already at `target` so it is replaced, not written through
fn remove_existing(target: &Path) -> Result<(), ArchiveError> {
    match fs::symlink_metadata(target) {
        Ok(metadata) if !metadata.is_dir() => {
            fs::remove_file(target).map_err(|e| ArchiveError::io(target, e))
        }
        _ => Ok(()),
    }
}

/// Copy an entry's payload; read failures are format errors, write failures are I/O errors
fn write_file(reader: &mut impl Read, target: &Path) -> Result<(), ArchiveError> {
    let mut file = File::create(target).map_err(|e| ArchiveError::io(target, e))?;
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(format_error(e)),
        };
        file.write_all(&buffer[..read])
            .map_err(|e| ArchiveError::io(target, e))?;
    }
    file.flush().map_err(|e| ArchiveError::io(target, e))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), ArchiveError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| ArchiveError::io(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), ArchiveError> {
    Ok(())
}

#[cfg(unix)]
fn create_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, target)
}

#[cfg(windows)]
fn create_symlink(link: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(link, target)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_link: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symbolic links are not supported on this platform",
    ))
}
