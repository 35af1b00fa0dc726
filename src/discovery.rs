//! Discovery of legacy library definitions.
//!
//! Sources are registered up front on a `Discovery`; there is no runtime
//! lookup of providers.

use crate::error::{RegistryError, Result};
use crate::library::{RawLibraries, RawLibraryDefinition};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Anything that can hand out `libraries_info` data.
pub trait LibrarySource {
    /// Human readable name used in logs and errors.
    fn name(&self) -> &str;

    /// Return every library this source defines, keyed by library name.
    fn libraries_info(&self) -> Result<RawLibraries>;
}

/// Definitions held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    name: String,
    libraries: RawLibraries,
}

impl StaticSource {
    pub fn new(name: impl Into<String>) -> Self {
        StaticSource {
            name: name.into(),
            libraries: RawLibraries::new(),
        }
    }

    pub fn with_library(
        mut self,
        library: impl Into<String>,
        definition: RawLibraryDefinition,
    ) -> Self {
        self.libraries.insert(library.into(), Value::Object(definition));
        self
    }
}

impl LibrarySource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn libraries_info(&self) -> Result<RawLibraries> {
        Ok(self.libraries.clone())
    }
}

/// A JSON export of one module's `hook_libraries_info` result.
///
/// The file holds a single object mapping library names to definitions.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        JsonFileSource { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LibrarySource for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn libraries_info(&self) -> Result<RawLibraries> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| RegistryError::io("Failed to read library source", &self.path, e))?;

        let value: Value = serde_json::from_str(&contents).map_err(|e| RegistryError::Json {
            message: format!("Failed to parse {}", self.path.display()),
            source: e,
        })?;

        match value {
            Value::Object(libraries) => Ok(libraries),
            _ => Err(RegistryError::Source {
                source_name: self.name.clone(),
                message: "expected a JSON object keyed by library name".to_string(),
            }),
        }
    }
}

/// The full set of registered sources.
#[derive(Default)]
pub struct Discovery {
    sources: Vec<Box<dyn LibrarySource>>,
}

impl Discovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: LibrarySource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Collect definitions from every source, in registration order.
    ///
    /// A library defined by several sources is deep-merged: nested objects
    /// combine, lists are appended and later scalars win. Entries that are not
    /// objects are skipped.
    pub fn discover(&self) -> Result<Vec<(String, RawLibraryDefinition)>> {
        let mut merged: Vec<(String, RawLibraryDefinition)> = Vec::new();

        for source in &self.sources {
            let libraries = source.libraries_info().map_err(|e| match e {
                RegistryError::Source { .. } => e,
                other => RegistryError::Source {
                    source_name: source.name().to_string(),
                    message: other.to_string(),
                },
            })?;
            debug!("Source {} defines {} libraries", source.name(), libraries.len());

            for (library, definition) in libraries {
                let Value::Object(definition) = definition else {
                    warn!("{}: skipping {}, definition is not an object", source.name(), library);
                    continue;
                };
                match merged.iter_mut().find(|(name, _)| *name == library) {
                    Some((_, existing)) => {
                        debug!("{}: extends library {}", source.name(), library);
                        merge_deep(existing, definition);
                    }
                    None => merged.push((library, definition)),
                }
            }
        }

        Ok(merged)
    }
}

/// Recursively merge `incoming` into `target`.
pub fn merge_deep(target: &mut Map<String, Value>, incoming: Map<String, Value>) {
    for (key, value) in incoming {
        let replacement = match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(value)) => {
                merge_deep(existing, value);
                None
            }
            (Some(Value::Array(existing)), Value::Array(value)) => {
                existing.extend(value);
                None
            }
            (_, value) => Some(value),
        };
        if let Some(value) = replacement {
            target.insert(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn object(value: Value) -> RawLibraryDefinition {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_static_sources_merge_in_order() {
        let mut discovery = Discovery::new();
        discovery
            .register(
                StaticSource::new("first")
                    .with_library("alpha", object(json!({ "name": "Alpha" })))
                    .with_library("beta", object(json!({ "name": "Beta" }))),
            )
            .register(
                StaticSource::new("second")
                    .with_library("alpha", object(json!({ "name": "Alpha 2" }))),
            );

        let found = discovery.discover().unwrap();
        let names: Vec<_> = found.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(found[0].1["name"], json!("Alpha 2"));
    }

    #[test]
    fn test_redefined_library_is_deep_merged() {
        let mut discovery = Discovery::new();
        discovery
            .register(StaticSource::new("colorbox").with_library(
                "colorbox",
                object(json!({
                    "name": "Colorbox",
                    "files": { "js": { "jquery.colorbox-min.js": {} } },
                    "dependencies": ["jquery"]
                })),
            ))
            .register(StaticSource::new("colorbox_extras").with_library(
                "colorbox",
                object(json!({
                    "files": { "css": { "colorbox.css": {} } },
                    "variants": { "source": { "files": { "js": { "jquery.colorbox.js": {} } } } },
                    "dependencies": ["jquery.once"]
                })),
            ));

        let found = discovery.discover().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(
            Value::Object(found[0].1.clone()),
            json!({
                "name": "Colorbox",
                "files": {
                    "js": { "jquery.colorbox-min.js": {} },
                    "css": { "colorbox.css": {} }
                },
                "dependencies": ["jquery", "jquery.once"],
                "variants": { "source": { "files": { "js": { "jquery.colorbox.js": {} } } } }
            })
        );
    }

    #[test]
    fn test_merge_deep_later_scalar_wins() {
        let mut target = object(json!({ "version": "1.0", "nested": { "a": 1, "b": 2 } }));
        merge_deep(&mut target, object(json!({ "version": "2.0", "nested": { "b": 3 } })));
        assert_eq!(
            Value::Object(target),
            json!({ "version": "2.0", "nested": { "a": 1, "b": 3 } })
        );
    }

    #[test]
    fn test_json_file_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("mymodule.libraries.json");
        fs::write(
            &path,
            r#"{"colorbox": {"name": "Colorbox"}, "broken": "not a definition"}"#,
        )
        .unwrap();

        let mut discovery = Discovery::new();
        discovery.register(JsonFileSource::new(&path));
        let found = discovery.discover().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "colorbox");
    }

    #[test]
    fn test_json_file_source_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileSource::new(&path).libraries_info().unwrap_err();
        assert!(matches!(err, RegistryError::Source { .. }));
    }

    #[test]
    fn test_missing_file_fails_discovery() {
        let mut discovery = Discovery::new();
        discovery.register(JsonFileSource::new("/nonexistent/libraries.json"));
        let err = discovery.discover().unwrap_err();
        assert!(matches!(err, RegistryError::Source { .. }));
    }
}
