//! Conversion of legacy `libraries_info` definitions to the registry schema.
//!
//! The conversion never fails: anything it cannot map is reported as a
//! `TransformWarning` and the rest of the definition is still produced.

use crate::config::RegistryConstants;
use crate::library::{
    is_empty_value, AssetFiles, CssAssets, DetectorId, LibraryDefinition, RawLibraryDefinition,
    VersionDetector,
};
use serde_json::{Map, Value};
use std::fmt;

/// Keys that only have meaning for legacy definitions.
const FILES: &str = "files";
const CALLBACKS: &str = "callbacks";
const VARIANTS: &str = "variants";
const VERSION_CALLBACK: &str = "version callback";
const VERSION_ARGUMENTS: &str = "version arguments";

/// A non-fatal problem found while converting one library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformWarning {
    /// A version callback was set but maps to no known detector.
    UnconvertibleVersionCallback { library: String, callback: String },
    /// The static-version callback was used without a `force` argument.
    MissingForcedVersion { library: String },
    /// Neither a line pattern nor a usable callback was found.
    VersionUndetermined { library: String },
}

impl TransformWarning {
    pub fn library(&self) -> &str {
        match self {
            TransformWarning::UnconvertibleVersionCallback { library, .. }
            | TransformWarning::MissingForcedVersion { library }
            | TransformWarning::VersionUndetermined { library } => library,
        }
    }
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformWarning::UnconvertibleVersionCallback { library, callback } => write!(
                f,
                "{}: A version callback ({}) was specified but the implementing logic \
                 could not be programmatically converted.",
                library, callback
            ),
            TransformWarning::MissingForcedVersion { library } => write!(
                f,
                "{}: A forced version callback was specified without a version to force.",
                library
            ),
            TransformWarning::VersionUndetermined { library } => {
                write!(f, "{}: Version detection details could not be determined.", library)
            }
        }
    }
}

/// Outcome of converting a single library.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub machine_name: String,
    pub definition: LibraryDefinition,
    pub warnings: Vec<TransformWarning>,
}

/// Derive the registry id (and base filename) from a library name.
///
/// Every character outside `[0-9a-zA-Z]` becomes `_`, then the result is
/// lowercased: `"jQuery UI 1.2"` → `"jquery_ui_1_2"`.
pub fn machine_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Convert one legacy definition.
pub fn transform(name: &str, mut raw: RawLibraryDefinition) -> Transformed {
    let machine_name = machine_name(name);
    let mut warnings = Vec::new();

    raw.shift_remove(CALLBACKS);
    // `type` is always written first by the definition itself.
    raw.shift_remove("type");

    let assets = take_files(&mut raw);
    if assets.css.is_some() {
        raw.shift_remove("css");
    }
    if assets.js.is_some() {
        raw.shift_remove("js");
    }

    // Variants only get their files converted and keep their position.
    // Version detection stays a top-level concern.
    if let Some(Value::Object(variants)) = raw.get_mut(VARIANTS) {
        convert_variants(variants);
    }

    let version_detector = convert_version(&machine_name, &mut raw, &mut warnings);
    if version_detector.is_some() {
        raw.shift_remove("version_detector");
    }

    Transformed {
        definition: LibraryDefinition {
            extra: raw,
            assets,
            version_detector,
            ..LibraryDefinition::default()
        },
        machine_name,
        warnings,
    }
}

/// Pull the legacy `files` section out of an element and convert it.
///
/// `files` is removed even when it carries nothing usable.
fn take_files(element: &mut Map<String, Value>) -> AssetFiles {
    let files = match element.shift_remove(FILES) {
        Some(Value::Object(files)) => files,
        _ => return AssetFiles::default(),
    };

    let css = files
        .get("css")
        .filter(|css| !is_empty_value(Some(css)))
        .map(|css| CssAssets { base: css.clone() });
    let js = files.get("js").filter(|js| !is_empty_value(Some(js))).cloned();

    AssetFiles { css, js }
}

fn convert_variants(variants: &mut Map<String, Value>) {
    for element in variants.values_mut() {
        if let Value::Object(element) = element {
            take_files(element).append_to(element);
        }
    }
}

fn convert_version(
    library: &str,
    raw: &mut Map<String, Value>,
    warnings: &mut Vec<TransformWarning>,
) -> Option<VersionDetector> {
    let callback = raw.shift_remove(VERSION_CALLBACK);
    let arguments = raw.shift_remove(VERSION_ARGUMENTS);

    let arguments = match arguments {
        Some(Value::Object(arguments)) => Some(arguments),
        _ => None,
    };

    if let Some(mut configuration) = arguments
        .clone()
        .filter(|args| !is_empty_value(args.get("pattern")))
    {
        // "cols" is called "columns" by the line pattern detector.
        if !is_empty_value(configuration.get("cols")) {
            if let Some(cols) = configuration.shift_remove("cols") {
                configuration.insert("columns".to_string(), cols);
            }
        }
        return Some(VersionDetector {
            id: DetectorId::LinePattern,
            configuration,
        });
    }

    let callback = callback.filter(|c| !is_empty_value(Some(c)));
    let arguments = arguments.filter(|a| !a.is_empty());
    match (callback, arguments) {
        (Some(callback), Some(arguments)) => {
            let callback_name = match &callback {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if callback_name == RegistryConstants::FORCE_VERSION_CALLBACK {
                match arguments.get("force") {
                    Some(version) if !version.is_null() => {
                        let mut configuration = Map::new();
                        configuration.insert("version".to_string(), version.clone());
                        Some(VersionDetector {
                            id: DetectorId::Static,
                            configuration,
                        })
                    }
                    _ => {
                        warnings.push(TransformWarning::MissingForcedVersion {
                            library: library.to_string(),
                        });
                        None
                    }
                }
            } else {
                warnings.push(TransformWarning::UnconvertibleVersionCallback {
                    library: library.to_string(),
                    callback: callback_name,
                });
                None
            }
        }
        _ => {
            warnings.push(TransformWarning::VersionUndetermined {
                library: library.to_string(),
            });
            None
        }
    }
}
