//! Copying files and trees with their permission bits and ownership

use crate::error::ArchiveError;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copy `source` into `target_dir`, keeping its file name, mode and (on Unix) owner.
///
/// Returns the path of the copy.
pub fn copy_file(source: &Path, target_dir: &Path) -> Result<PathBuf, ArchiveError> {
    let metadata = fs::metadata(source).map_err(|e| ArchiveError::io(source, e))?;
    let target = target_dir.join(file_name(source)?);

    let mut reader = File::open(source).map_err(|e| ArchiveError::io(source, e))?;
    let mut writer = File::create(&target).map_err(|e| ArchiveError::io(&target, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| ArchiveError::io(&target, e))?;

    fs::set_permissions(&target, metadata.permissions())
        .map_err(|e| ArchiveError::io(&target, e))?;
    sync_owner(&target, &metadata);

    Ok(target)
}

/// Copy a file or directory tree into `target_dir`.
///
/// A missing source is not an error, so optional files can be passed directly.
pub fn copy_recursive(source: &Path, target_dir: &Path) -> Result<(), ArchiveError> {
    let metadata = match fs::metadata(source) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(source = %source.display(), "nothing to copy");
            return Ok(());
        }
        Err(e) => return Err(ArchiveError::io(source, e)),
    };

    if !metadata.is_dir() {
        return copy_file(source, target_dir).map(|_| ());
    }

    let target = target_dir.join(file_name(source)?);
    fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;

    let mut children = fs::read_dir(source)
        .map_err(|e| ArchiveError::io(source, e))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ArchiveError::io(source, e))?;
    children.sort();

    for child in &children {
        copy_recursive(child, &target)?;
    }

    fs::set_permissions(&target, metadata.permissions())
        .map_err(|e| ArchiveError::io(&target, e))?;
    sync_owner(&target, &metadata);
    Ok(())
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr, ArchiveError> {
    path.file_name().ok_or_else(|| {
        ArchiveError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })
}

/// Give `target` the owner of the source; needs privileges, so failures are ignored
#[cfg(unix)]
fn sync_owner(target: &Path, source: &Metadata) {
    use std::os::unix::fs::MetadataExt;

    if let Err(e) = std::os::unix::fs::chown(target, Some(source.uid()), Some(source.gid())) {
        debug!(target = %target.display(), error = %e, "could not sync owner");
    }
}

#[cfg(not(unix))]
fn sync_owner(_target: &Path, _source: &Metadata) {}
