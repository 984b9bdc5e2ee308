use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::EVENTS_FILE_NAME;
use crate::events::{EventSink, InventoryEvent, SinkError};

/// Append-only JSON Lines file, one event per line.
pub struct JsonlEventLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlEventLog {
    /// Creates `log_dir` if needed and opens `events.jsonl` inside it for appending.
    pub fn open_in(log_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        Self::open(log_dir.join(EVENTS_FILE_NAME))
    }

    pub fn open(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for JsonlEventLog {
    fn append(&self, event: &InventoryEvent) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut file = match self.file.lock() {
            Ok(file) => file,
            Err(poisoned) => poisoned.into_inner(),
        };
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use crate::domain::catalog::{ProductId, WarehouseId};
    use crate::event_log::JsonlEventLog;
    use crate::events::{EventKind, EventSink, EventType, InventoryEvent};

    fn order(quantity: u32, remaining_inventory: u32) -> InventoryEvent {
        InventoryEvent::new(
            Utc.with_ymd_and_hms(2026, 5, 2, 14, 0, 0).single().expect("valid timestamp"),
            EventKind::Order {
                product_id: ProductId("MOUSE-004".to_string()),
                warehouse_id: WarehouseId("WH-LDN".to_string()),
                quantity,
                remaining_inventory,
            },
        )
    }

    #[test]
    fn creates_missing_directory_and_writes_one_line_per_event() {
        let dir = TempDir::new().expect("tempdir");
        let log_dir = dir.path().join("nested").join("logs");
        let log = JsonlEventLog::open_in(&log_dir).expect("event log should open");

        log.append(&order(2, 98)).expect("first append");
        log.append(&order(1, 97)).expect("second append");

        assert_eq!(log.path(), log_dir.join("events.jsonl").as_path());
        let contents = fs::read_to_string(log.path()).expect("log should be readable");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: InventoryEvent = serde_json::from_str(lines[1]).expect("valid json line");
        assert_eq!(parsed.event_type(), EventType::Order);
        assert_eq!(parsed, order(1, 97));
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = TempDir::new().expect("tempdir");

        JsonlEventLog::open_in(dir.path())
            .expect("first open")
            .append(&order(4, 50))
            .expect("append before reopen");
        JsonlEventLog::open_in(dir.path())
            .expect("second open")
            .append(&order(3, 47))
            .expect("append after reopen");

        let contents =
            fs::read_to_string(dir.path().join("events.jsonl")).expect("log should be readable");
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn open_fails_when_directory_is_a_file() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"occupied").expect("write blocker");

        assert!(JsonlEventLog::open_in(&blocker).is_err());
    }
}
