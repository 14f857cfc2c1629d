pub mod catalog;
pub mod daily_log;
pub mod profile;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

pub use catalog::FoodCatalog;
pub use daily_log::{DailyLog, LogRow};
pub use profile::ProfileStore;

/// Replace `path` with `contents` through a temporary sibling file and an
/// atomic rename, so readers never observe a partial write.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp = path.with_extension("tmp");
    let mut f = File::create(&temp)?;
    f.write_all(contents)?;
    f.sync_all()?;
    fs::rename(temp, path)?;
    Ok(())
}

/// `None` when the file does not exist yet.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
