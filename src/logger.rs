/*
 * This file is part of ecfan.
 *
 * Copyright (C) 2025 ecfan contributors
 *
 * ecfan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * ecfan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with ecfan. If not, see <https://www.gnu.org/licenses/>.
 */

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lazy_static::lazy_static;
use serde_json::{json, Value};

const DEFAULT_LOG_PATH: &str = "/var/log/ecfan/events.json";
const FALLBACK_LOG_PATH: &str = "/tmp/ecfan_events.json";

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

fn open_append(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

pub fn init_logging() {
    let file = open_append(Path::new(DEFAULT_LOG_PATH))
        .or_else(|| open_append(Path::new(FALLBACK_LOG_PATH)));
    if let (Some(f), Ok(mut guard)) = (file, LOG_FILE.lock()) {
        *guard = Some(f);
    }
}

/// Log to an explicit file instead of the default location.
pub fn init_logging_at(path: &Path) -> std::io::Result<()> {
    let f = OpenOptions::new().create(true).append(true).open(path)?;
    if let Ok(mut guard) = LOG_FILE.lock() {
        *guard = Some(f);
    }
    Ok(())
}

pub fn log_event(event: &str, data: Value) {
    let Ok(mut guard) = LOG_FILE.lock() else { return };
    // silent until init_logging has run
    let Some(f) = guard.as_mut() else { return };
    let line = json!({
        "ts_ms": now_millis(),
        "event": event,
        "data": data,
    });
    let _ = writeln!(f, "{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_log_event_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("events.json");
        init_logging_at(&path).unwrap();

        log_event("snapshot_commit", json!({ "bytes": 256 }));
        log_event("user_error", json!({ "error": "unknown command" }));

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "snapshot_commit");
        assert_eq!(lines[0]["data"]["bytes"], 256);
        assert!(lines[1]["ts_ms"].is_u64());

        *LOG_FILE.lock().unwrap() = None;
    }

    #[test]
    #[serial]
    fn test_log_event_without_init_is_silent() {
        *LOG_FILE.lock().unwrap() = None;
        log_event("startup", json!({}));
    }
}
