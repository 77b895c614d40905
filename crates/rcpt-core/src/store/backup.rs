//! Timestamped copies of the workbook taken before each write.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info, warn};

/// Copy `file` to `<stem>_backup_<timestamp>.<ext>` next to it, then keep
/// only the `max_backups` newest copies (0 keeps all).
///
/// Returns `None` when there is nothing to back up. Failing to prune old
/// copies is logged and does not fail the backup that was just taken.
pub fn create_backup(file: &Path, max_backups: usize) -> io::Result<Option<PathBuf>> {
    if !file.exists() {
        return Ok(None);
    }

    let (stem, ext) = name_parts(file);
    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let backup = file.with_file_name(format!("{}_backup_{}{}", stem, timestamp, ext));

    fs::copy(file, &backup)?;
    info!("Backup created: {}", backup.display());

    if let Err(e) = cleanup_old_backups(file, max_backups) {
        warn!("Failed to prune backups of {}: {}", file.display(), e);
    }
    Ok(Some(backup))
}

/// Existing backups of `file`, oldest first.
pub fn list_backups(file: &Path) -> io::Result<Vec<PathBuf>> {
    let (stem, ext) = name_parts(file);
    let prefix = format!("{}_backup_", stem);
    let dir = match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(&ext) {
            backups.push(path);
        }
    }

    // Timestamps sort lexicographically.
    backups.sort();
    Ok(backups)
}

fn cleanup_old_backups(file: &Path, max_backups: usize) -> io::Result<()> {
    if max_backups == 0 {
        return Ok(());
    }

    let backups = list_backups(file)?;
    let excess = backups.len().saturating_sub(max_backups);
    for old in &backups[..excess] {
        match fs::remove_file(old) {
            Ok(()) => debug!("Removed old backup {}", old.display()),
            Err(e) => warn!("Failed to remove old backup {}: {}", old.display(), e),
        }
    }
    Ok(())
}

fn name_parts(file: &Path) -> (String, String) {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (stem, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_no_backup_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("receipts.xlsx");

        assert_eq!(create_backup(&file, 10).unwrap(), None);
    }

    #[test]
    fn test_backup_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("receipts.xlsx");
        fs::write(&file, "workbook bytes").unwrap();

        let backup = create_backup(&file, 10).unwrap().unwrap();
        let name = backup.file_name().unwrap().to_str().unwrap();

        assert!(name.starts_with("receipts_backup_"));
        assert!(name.ends_with(".xlsx"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "workbook bytes");
    }

    #[test]
    fn test_old_backups_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("receipts.xlsx");
        fs::write(&file, "workbook bytes").unwrap();

        let mut created = Vec::new();
        for _ in 0..4 {
            created.push(create_backup(&file, 2).unwrap().unwrap());
            thread::sleep(Duration::from_millis(5));
        }

        let remaining = list_backups(&file).unwrap();
        assert_eq!(remaining, created[2..].to_vec());
        assert!(file.exists());
    }

    #[test]
    fn test_other_files_are_not_backups() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("receipts.xlsx");
        fs::write(&file, "workbook bytes").unwrap();
        fs::write(dir.path().join("other_backup_1.xlsx"), "{}").unwrap();
        fs::write(dir.path().join("receipts_backup_1.csv"), "").unwrap();

        assert!(list_backups(&file).unwrap().is_empty());
    }

    #[test]
    fn test_prune_failure_keeps_new_backup() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("receipts.xlsx");
        fs::write(&file, "workbook bytes").unwrap();
        // Sorts first and cannot be removed with remove_file.
        let stuck = dir.path().join("receipts_backup_0.xlsx");
        fs::create_dir(&stuck).unwrap();

        let backup = create_backup(&file, 1).unwrap().unwrap();

        assert!(backup.exists());
        assert!(stuck.exists());
        assert_eq!(list_backups(&file).unwrap(), vec![stuck, backup]);
    }
}
