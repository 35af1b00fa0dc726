//! Registry processing.
//!
//! Runs every discovered legacy definition through the transform and writes
//! the result to the registry as `<machine_name>.json`. A run always rewrites
//! whole files; there is no merge with earlier output and no rollback.

use crate::config::RegistryConstants;
use crate::discovery::Discovery;
use crate::error::{RegistryError, Result};
use crate::registry::RegistryStorage;
use crate::transform::{transform, TransformWarning};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// A library whose file could not be written.
#[derive(Debug)]
pub struct WriteFailure {
    pub library: String,
    pub filename: String,
    pub error: RegistryError,
}

/// Summary of one processing run.
#[derive(Debug)]
pub struct RunReport {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<TransformWarning>,
    pub failures: Vec<WriteFailure>,
    pub finished_at: DateTime<Local>,
}

impl RunReport {
    pub fn written_count(&self) -> usize {
        self.written.len()
    }

    /// Status line shown once the batch is done.
    pub fn summary(&self) -> String {
        format!("{} registry files were updated.", self.written_count())
    }
}

/// Registry filename for a machine name.
pub fn registry_filename(machine_name: &str) -> String {
    format!("{}.{}", machine_name, RegistryConstants::FILE_EXTENSION)
}

/// Discover, convert and write every library.
///
/// Only discovery failures abort the run. Per-library problems end up in the
/// report.
pub fn process_libraries(
    discovery: &Discovery,
    storage: &dyn RegistryStorage,
) -> Result<RunReport> {
    let libraries = discovery.discover()?;
    info!("Processing {} libraries", libraries.len());

    let mut written = Vec::new();
    let mut warnings = Vec::new();
    let mut failures = Vec::new();

    for (name, raw) in libraries {
        let converted = transform(&name, raw);
        debug!("Converted {} as {}", name, converted.machine_name);

        for warning in &converted.warnings {
            warn!("{}", warning);
        }
        warnings.extend(converted.warnings);

        let filename = registry_filename(&converted.machine_name);
        let outcome = serde_json::to_vec_pretty(&converted.definition)
            .map_err(|e| RegistryError::Json {
                message: format!("Failed to serialize {}", name),
                source: e,
            })
            .and_then(|serialized| storage.write(&filename, &serialized));

        match outcome {
            Ok(path) => written.push(path),
            Err(error) => {
                warn!("Failed to write {}: {}", filename, error);
                failures.push(WriteFailure {
                    library: name,
                    filename,
                    error,
                });
            }
        }
    }

    let report = RunReport {
        written,
        warnings,
        failures,
        finished_at: Local::now(),
    };
    info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::StaticSource;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Records writes in memory and fails for selected filenames.
    #[derive(Default)]
    struct MemoryStorage {
        files: RefCell<BTreeMap<String, Vec<u8>>>,
        reject: Vec<String>,
    }

    impl RegistryStorage for MemoryStorage {
        fn write(&self, filename: &str, contents: &[u8]) -> Result<PathBuf> {
            if self.reject.iter().any(|r| r == filename) {
                return Err(RegistryError::io(
                    "Failed to write",
                    filename,
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
                ));
            }
            self.files.borrow_mut().insert(filename.to_string(), contents.to_vec());
            Ok(PathBuf::from(filename))
        }
    }

    fn discovery() -> Discovery {
        let mut discovery = Discovery::new();
        discovery.register(
            StaticSource::new("test")
                .with_library(
                    "jQuery UI 1.2",
                    json!({
                        "name": "jQuery UI",
                        "files": { "js": { "jquery-ui.js": {} } },
                        "version arguments": { "pattern": "v([0-9.]+)", "cols": 20 }
                    })
                    .as_object()
                    .cloned()
                    .unwrap(),
                )
                .with_library(
                    "mystery",
                    json!({ "files": { "css": { "m.css": {} } } }).as_object().cloned().unwrap(),
                ),
        );
        discovery
    }

    #[test]
    fn test_process_writes_each_library() {
        let storage = MemoryStorage::default();
        let started = Local::now();
        let report = process_libraries(&discovery(), &storage).unwrap();

        assert!(report.finished_at >= started);
        assert_eq!(report.written_count(), 2);
        assert_eq!(report.summary(), "2 registry files were updated.");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].library(), "mystery");

        let files = storage.files.borrow();
        let text = String::from_utf8(files["jquery_ui_1_2.json"].clone()).unwrap();
        assert!(text.starts_with("{\n  \"type\": \"asset\""));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version_detector"]["configuration"]["columns"], json!(20));
        assert!(files.contains_key("mystery.json"));
    }

    #[test]
    fn test_failed_write_is_not_counted() {
        let storage = MemoryStorage {
            reject: vec!["mystery.json".to_string()],
            ..MemoryStorage::default()
        };
        let report = process_libraries(&discovery(), &storage).unwrap();

        assert_eq!(report.written_count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].library, "mystery");
        assert!(matches!(report.failures[0].error, RegistryError::Io { .. }));
    }

    #[test]
    fn test_empty_discovery() {
        let storage = MemoryStorage::default();
        let report = process_libraries(&Discovery::new(), &storage).unwrap();
        assert_eq!(report.written_count(), 0);
        assert_eq!(report.summary(), "0 registry files were updated.");
    }
}
