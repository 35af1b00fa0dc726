use serde::Serialize;
use serde_json::{Map, Value};

/// A raw legacy library definition, as exported from `hook_libraries_info`.
pub type RawLibraryDefinition = Map<String, Value>;

/// Raw definitions keyed by library name, in discovery order.
pub type RawLibraries = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LibraryType {
    Asset,
}

/// CSS assets grouped by category. Converted libraries always land in `base`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CssAssets {
    pub base: Value,
}

/// `css`/`js` sections shared by a library and its variants.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssetFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<CssAssets>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<Value>,
}

impl AssetFiles {
    pub fn is_empty(&self) -> bool {
        self.css.is_none() && self.js.is_none()
    }

    /// Write the sections into an untyped definition, replacing any stale ones.
    pub fn append_to(self, element: &mut Map<String, Value>) {
        if let Some(css) = self.css {
            element.shift_remove("css");
            let mut groups = Map::new();
            groups.insert("base".to_string(), css.base);
            element.insert("css".to_string(), Value::Object(groups));
        }
        if let Some(js) = self.js {
            element.shift_remove("js");
            element.insert("js".to_string(), js);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorId {
    LinePattern,
    Static,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionDetector {
    pub id: DetectorId,
    pub configuration: Map<String, Value>,
}

/// A normalized library definition, ready to be written to the registry.
///
/// Field order is serialization order; `type` must stay first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryDefinition {
    #[serde(rename = "type")]
    pub kind: LibraryType,
    /// Keys carried over from the legacy definition in source order,
    /// including already converted `variants`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(flatten)]
    pub assets: AssetFiles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_detector: Option<VersionDetector>,
}

impl Default for LibraryDefinition {
    fn default() -> Self {
        LibraryDefinition {
            kind: LibraryType::Asset,
            extra: Map::new(),
            assets: AssetFiles::default(),
            version_detector: None,
        }
    }
}

/// Loose emptiness test matching how legacy definitions mark absent data:
/// null, false, zero, `""`, `"0"` and empty collections all count as empty.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_definition_serializes_type_only() {
        let text = serde_json::to_string(&LibraryDefinition::default()).unwrap();
        assert_eq!(text, r#"{"type":"asset"}"#);
    }

    #[test]
    fn test_type_precedes_passthrough_keys() {
        let mut def = LibraryDefinition::default();
        def.extra.insert("name".into(), json!("Alpha"));
        def.extra.insert("abc".into(), json!(1));
        let text = serde_json::to_string(&def).unwrap();
        assert!(text.starts_with(r#"{"type":"asset","name":"Alpha""#));
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&json!(null))));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!("0"))));
        assert!(is_empty_value(Some(&json!(0))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(is_empty_value(Some(&json!({}))));
        assert!(!is_empty_value(Some(&json!("1.0"))));
        assert!(!is_empty_value(Some(&json!(["a.js"]))));
        assert!(!is_empty_value(Some(&json!(true))));
    }
}
