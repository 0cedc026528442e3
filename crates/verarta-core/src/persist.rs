//! Atomic file replacement
//!
//! Writers never leave a half-written file behind: content goes to a temp
//! file in the destination directory, is flushed to disk, and is then renamed
//! over the destination.

use std::fs::Permissions;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Owner read/write only, for files holding private keys or passwords
#[cfg(unix)]
pub const SECRET_FILE_MODE: u32 = 0o600;

/// Atomically replace `path` with `contents`
///
/// When `permissions` is `None` the file keeps the temp-file default, which
/// is owner-only on Unix.
pub fn write_atomic(
    path: &Path,
    contents: &[u8],
    permissions: Option<Permissions>,
) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Check that [`write_atomic`] could replace `path`, without touching it
///
/// Creates and removes a temp file in the destination directory. Missing
/// directories are not created.
pub fn ensure_writable(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Err(io::Error::other(format!("{} is a directory", path.display())));
    }
    NamedTempFile::new_in(parent_dir(path))?.close()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Atomically write a file readable only by its owner
pub fn write_secret(path: &Path, contents: &[u8]) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        write_atomic(path, contents, Some(Permissions::from_mode(SECRET_FILE_MODE)))
    }
    #[cfg(not(unix))]
    {
        write_atomic(path, contents, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, b"old").unwrap();

        write_atomic(&path, b"new", None).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        // only the destination remains, no stray temp files
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("file.txt");
        assert!(write_atomic(&path, b"data", None).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn writability_check_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");

        ensure_writable(&path).unwrap();

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn writability_check_rejects_missing_directories_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_writable(&dir.path().join("missing").join("file.txt")).is_err());
        assert!(!dir.path().join("missing").exists());
        assert!(ensure_writable(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn secret_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secret");
        write_secret(&path, b"pw").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SECRET_FILE_MODE);
    }
}
