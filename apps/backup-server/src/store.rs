//! # Backup Store
//!
//! Snapshot files on disk, one per save, newest `max_backups` kept.
//!
//! ## Layout
//! ```text
//! DATA_DIR/
//!   backup_2024-03-01T10-00-00-000Z.json    ← oldest kept
//!   backup_2024-03-01T10-05-12-431Z.json
//!   ...
//!   backup_2024-03-02T08-14-55-907Z.json    ← newest
//!   .backup_<ts>.json.tmp                   ← in-flight write, never listed
//! ```
//!
//! Names embed a fixed-width UTC timestamp, so lexical order is time order.
//! Two saves in the same millisecond get distinct, increasing names: the
//! later one is stamped one millisecond after the newest existing backup.
//!
//! Each save writes a temp file and renames it into place, so readers only
//! ever see complete snapshots. Saves are serialized; reads are not.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tally_core::{BackupInfo, BackupSnapshot, SavedBackup};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BackupError, BackupResult};

const FILE_PREFIX: &str = "backup_";
const FILE_SUFFIX: &str = ".json";
const TEMP_SUFFIX: &str = ".tmp";
const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

// =============================================================================
// Filenames
// =============================================================================

/// Backup filename for a save received at `stamp`.
pub fn filename_for(stamp: DateTime<Utc>) -> String {
    format!("{FILE_PREFIX}{}{FILE_SUFFIX}", stamp.format(STAMP_FORMAT))
}

/// Returns the date part of a backup filename, or `None` if `name` is not
/// one this store would have written.
///
/// Anything with a path separator or a character outside `[A-Za-z0-9-]` in
/// the date part is rejected, so a valid name never leaves the data dir.
pub fn parse_filename(name: &str) -> Option<&str> {
    let date = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    let valid = !date.is_empty() && date.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    valid.then_some(date)
}

fn stamp_millis(name: &str) -> Option<i64> {
    let date = parse_filename(name)?;
    chrono::NaiveDateTime::parse_from_str(date, STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

// =============================================================================
// Store
// =============================================================================

/// Directory of snapshot files with newest-N retention.
pub struct BackupStore {
    dir: PathBuf,
    max_backups: usize,
    /// Millisecond stamp of the newest backup written or found on disk.
    /// Held for the whole save, which serializes writers.
    last_stamp: Mutex<Option<i64>>,
}

impl BackupStore {
    /// Opens (creating if needed) the data directory, drops leftover temp
    /// files and applies retention once.
    pub async fn open(dir: impl Into<PathBuf>, max_backups: usize) -> BackupResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;

        remove_temp_files(&dir).await?;

        let names = backup_names(&dir).await?;
        let last_stamp = names.last().and_then(|name| stamp_millis(name));

        let store = BackupStore {
            dir,
            max_backups: max_backups.max(1),
            last_stamp: Mutex::new(last_stamp),
        };
        store.prune(names).await?;

        info!(
            dir = %store.dir.display(),
            max_backups = store.max_backups,
            "Backup store opened"
        );
        Ok(store)
    }

    /// Directory the backups live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `snapshot` stamped with the current time.
    pub async fn save(&self, snapshot: &BackupSnapshot) -> BackupResult<SavedBackup> {
        self.save_at(snapshot, Utc::now()).await
    }

    /// Saves `snapshot` stamped with `now`, bumped forward if needed so the
    /// name sorts after every existing backup.
    pub async fn save_at(
        &self,
        snapshot: &BackupSnapshot,
        now: DateTime<Utc>,
    ) -> BackupResult<SavedBackup> {
        let mut last_stamp = self.last_stamp.lock().await;

        let mut millis = now.timestamp_millis();
        if let Some(last) = *last_stamp {
            if millis <= last {
                millis = last + 1;
            }
        }
        let stamp = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(now);
        let filename = filename_for(stamp);

        let body = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.dir.join(format!(".{filename}{TEMP_SUFFIX}"));
        fs::write(&temp, &body).await?;
        if let Err(e) = fs::rename(&temp, self.dir.join(&filename)).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }
        *last_stamp = Some(millis);

        info!(
            %filename,
            records = snapshot.record_count(),
            bytes = body.len(),
            "Backup saved"
        );

        let names = backup_names(&self.dir).await?;
        self.prune(names).await?;

        Ok(SavedBackup { filename })
    }

    /// All backups, newest first.
    pub async fn list(&self) -> BackupResult<Vec<BackupInfo>> {
        let names = backup_names(&self.dir).await?;
        Ok(names
            .into_iter()
            .rev()
            .filter_map(|filename| {
                let date = parse_filename(&filename)?.to_string();
                Some(BackupInfo { filename, date })
            })
            .collect())
    }

    /// The newest backup, or `None` if there are none.
    pub async fn latest(&self) -> BackupResult<Option<BackupSnapshot>> {
        let names = backup_names(&self.dir).await?;
        match names.last() {
            Some(name) => self.get(name).await.map(Some),
            None => Ok(None),
        }
    }

    /// The backup stored under `filename`.
    ///
    /// A file that exists but doesn't decode as a snapshot is reported as
    /// not found, like a missing one.
    pub async fn get(&self, filename: &str) -> BackupResult<BackupSnapshot> {
        if parse_filename(filename).is_none() {
            return Err(BackupError::NotFound(filename.to_string()));
        }

        let body = match fs::read(self.dir.join(filename)).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackupError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_slice(&body).map_err(|e| {
            warn!(filename, error = %e, "Stored backup is unreadable");
            BackupError::NotFound(filename.to_string())
        })
    }

    /// Deletes the oldest backups beyond `max_backups`. `names` is sorted
    /// oldest first.
    async fn prune(&self, names: Vec<String>) -> BackupResult<()> {
        if names.len() <= self.max_backups {
            return Ok(());
        }

        let excess = names.len() - self.max_backups;
        for name in &names[..excess] {
            match fs::remove_file(self.dir.join(name)).await {
                Ok(()) => debug!(filename = %name, "Old backup removed"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        info!(removed = excess, kept = self.max_backups, "Retention applied");
        Ok(())
    }
}

/// Backup filenames in `dir`, oldest first.
async fn backup_names(dir: &Path) -> BackupResult<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if parse_filename(&name).is_some() && entry.file_type().await?.is_file() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

async fn remove_temp_files(dir: &Path) -> BackupResult<()> {
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with(&format!(".{FILE_PREFIX}")) && name.ends_with(TEMP_SUFFIX) {
            warn!(filename = %name, "Removing interrupted backup write");
            fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tally_core::{Customer, Money};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn snapshot_with_customer(title: &str) -> BackupSnapshot {
        let mut snapshot = BackupSnapshot::empty(base_time());
        snapshot.customers.push(Customer {
            id: "c1".into(),
            title: title.into(),
            tax_number: String::new(),
            phone: String::new(),
            balance: Money::zero(),
            created_at: base_time(),
        });
        snapshot
    }

    #[test]
    fn test_filename_format() {
        let stamp = base_time() + Duration::milliseconds(431);
        let name = filename_for(stamp);
        assert_eq!(name, "backup_2024-03-01T10-00-00-431Z.json");
        assert_eq!(parse_filename(&name), Some("2024-03-01T10-00-00-431Z"));
        assert_eq!(stamp_millis(&name), Some(stamp.timestamp_millis()));
    }

    #[test]
    fn test_rejects_foreign_names() {
        assert!(parse_filename("backup_.json").is_none());
        assert!(parse_filename("backup_../../etc/passwd.json").is_none());
        assert!(parse_filename("backup_2024.json.tmp").is_none());
        assert!(parse_filename("notes.txt").is_none());
        assert!(parse_filename(".backup_2024-03-01T10-00-00-000Z.json.tmp").is_none());
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        let snapshot = snapshot_with_customer("Acme Foods");
        let saved = store.save_at(&snapshot, base_time()).await.unwrap();
        assert_eq!(saved.filename, "backup_2024-03-01T10-00-00-000Z.json");

        let loaded = store.get(&saved.filename).await.unwrap();
        assert_eq!(loaded, snapshot);

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest, snapshot);
    }

    #[tokio::test]
    async fn test_latest_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        assert!(store.latest().await.unwrap().is_none());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_instant_gets_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        let first = store.save_at(&snapshot_with_customer("A"), base_time()).await.unwrap();
        let second = store.save_at(&snapshot_with_customer("B"), base_time()).await.unwrap();
        // Clock stepped backwards.
        let third = store
            .save_at(&snapshot_with_customer("C"), base_time() - Duration::seconds(5))
            .await
            .unwrap();

        assert!(first.filename < second.filename);
        assert!(second.filename < third.filename);
        assert_eq!(second.filename, "backup_2024-03-01T10-00-00-001Z.json");

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.customers[0].title, "C");
    }

    #[tokio::test]
    async fn test_retention_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        let mut saved = Vec::new();
        for i in 0..57 {
            let at = base_time() + Duration::seconds(i);
            saved.push(store.save_at(&snapshot_with_customer("A"), at).await.unwrap().filename);
        }

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 50);

        let expected: Vec<String> = saved[7..].iter().rev().cloned().collect();
        let names: Vec<String> = listed.iter().map(|b| b.filename.clone()).collect();
        assert_eq!(names, expected);

        assert!(matches!(
            store.get(&saved[0]).await,
            Err(BackupError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_dates_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        store.save_at(&snapshot_with_customer("A"), base_time()).await.unwrap();
        store
            .save_at(&snapshot_with_customer("B"), base_time() + Duration::minutes(5))
            .await
            .unwrap();
        std::fs::write(dir.path().join("README.txt"), "not a backup").unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, "2024-03-01T10-05-00-000Z");
        assert_eq!(listed[1].date, "2024-03-01T10-00-00-000Z");
    }

    #[tokio::test]
    async fn test_open_prunes_and_resumes_stamps() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = BackupStore::open(dir.path(), 50).await.unwrap();
            for i in 0..5 {
                let at = base_time() + Duration::seconds(i);
                store.save_at(&snapshot_with_customer("A"), at).await.unwrap();
            }
        }
        std::fs::write(dir.path().join(".backup_x.json.tmp"), "{").unwrap();

        let store = BackupStore::open(dir.path(), 3).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 3);
        assert!(!dir.path().join(".backup_x.json.tmp").exists());

        // Newest on disk is base + 4s; an older clock still sorts after it.
        let saved = store.save_at(&snapshot_with_customer("B"), base_time()).await.unwrap();
        assert_eq!(saved.filename, "backup_2024-03-01T10-00-04-001Z.json");
    }

    #[tokio::test]
    async fn test_invalid_and_missing_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        for name in ["../secret.json", "backup_2024-01-01T00-00-00-000Z.json", "x"] {
            assert!(matches!(store.get(name).await, Err(BackupError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = BackupStore::open(dir.path(), 50).await.unwrap();

        let name = filename_for(base_time());
        std::fs::write(dir.path().join(&name), "{\"customers\": ").unwrap();

        let err = store.get(&name).await.unwrap_err();
        assert!(matches!(err, BackupError::NotFound(ref f) if f == &name));
        assert!(matches!(store.latest().await, Err(BackupError::NotFound(_))));

        // Valid JSON that isn't a snapshot is treated the same way.
        std::fs::write(dir.path().join(&name), "[1, 2, 3]").unwrap();
        assert!(matches!(store.get(&name).await, Err(BackupError::NotFound(_))));
    }
}
