//! File helpers shared by key and license persistence.
//!
//! Writes go to a hidden temp file next to the target and are renamed into
//! place, so a reader never observes a half-written file. There is no
//! locking: if two processes save the same path, the last rename wins.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::errors::{LicenseError, LicenseResult};

/// Permissions for key material readable only by the owner.
const PRIVATE_MODE: u32 = 0o600;

/// Permissions for public artifacts (public keys, license files).
const PUBLIC_MODE: u32 = 0o644;

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> LicenseResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| LicenseError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Atomically replace `path` with `contents`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> LicenseResult<()> {
    write_atomic_with_mode(path, contents, PUBLIC_MODE)
}

/// Like [`write_atomic`], but the file is only readable by its owner on Unix.
pub fn write_atomic_private(path: &Path, contents: &[u8]) -> LicenseResult<()> {
    write_atomic_with_mode(path, contents, PRIVATE_MODE)
}

/// Read a whole file as UTF-8.
pub fn read_to_string(path: &Path) -> LicenseResult<String> {
    fs::read_to_string(path).map_err(|e| LicenseError::io(path, e))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

fn write_atomic_with_mode(path: &Path, contents: &[u8], mode: u32) -> LicenseResult<()> {
    ensure_parent_dir(path)?;

    let tmp = temp_path_for(path);
    let result = (|| -> std::io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let mut file = options.open(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(LicenseError::io(path, e));
    }
    Ok(())
}
