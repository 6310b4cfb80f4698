//! Atomic, owner-only file writes.
//!
//! Both the key file and export files carry the store key, so they are
//! written to a temp file in the target directory with `0o600`
//! permissions and then renamed over the destination.  Readers never see
//! a half-written file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{Result, VaultError};

/// Write `contents` to `path` atomically with owner-only permissions.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = temp_path_for(path);

    // A stale temp file from an interrupted write would block create_new.
    if tmp_path.exists() {
        fs::remove_file(&tmp_path).map_err(|e| VaultError::io_at(&tmp_path, e))?;
    }

    create_private(&tmp_path, contents)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        VaultError::io_at(path, e)
    })
}

/// Create `path`, which must not exist yet, and write `contents` into it.
pub fn create_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    // On Unix, restrict permissions to owner-only read/write.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path).map_err(|e| VaultError::io_at(path, e))?;
    file.write_all(contents)
        .and_then(|()| file.sync_all())
        .map_err(|e| VaultError::io_at(path, e))
}

/// `<dir>/.<name>.tmp` next to `path`, so the rename stays on one filesystem.
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}
