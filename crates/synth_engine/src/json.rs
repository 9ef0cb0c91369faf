//! JSON export surfaces.
//!
//! Two concerns live here: persistence of dictionary contents as an
//! ordered list of `[value_string, node]` pairs, and the stable response
//! envelope the CLI emits in `--json` mode.
//!
//! # Stability contract
//!
//! `schema_version`, `ok` and the presence of `result`/`error` are
//! stable; `error` text is human-readable and may change.

use serde::{Deserialize, Serialize};
use synth_ast::{Node, NodeRepr, Value};

use crate::dictionary::Dictionary;
use crate::error::EngineError;
use crate::mapping::Mapping;

/// Current JSON schema version.
pub const SCHEMA_VERSION: u8 = 1;

/// One exported dictionary entry.
pub type ExportPair = (String, NodeRepr);

impl Dictionary {
    /// Dictionary contents as `[value_string, node]` pairs, descending
    /// magnitude order.
    pub fn export_pairs(&self) -> Vec<ExportPair> {
        self.entries()
            .iter()
            .map(|e| (e.value.to_string(), e.node.to_repr()))
            .collect()
    }
}

impl Mapping {
    /// Rebuild a mapping from exported pairs. Entries are trusted to
    /// already include their negations, so no closure is re-applied; a
    /// pair whose numeral or node shape is malformed fails the import.
    pub fn from_pairs(pairs: &[ExportPair]) -> Result<Mapping, EngineError> {
        let mut mapping = Mapping::new();
        for (value_str, repr) in pairs {
            let value = Value::parse(value_str)
                .map_err(|e| EngineError::MalformedExport(e.to_string()))?;
            let node = Node::from_repr(repr)?;
            mapping.insert_entry(value, node);
        }
        Ok(mapping)
    }
}

/// Unified JSON response for CLI prove operations.
#[derive(Serialize, Deserialize, Debug)]
pub struct ProveJsonResponse {
    pub schema_version: u8,
    pub ok: bool,
    pub base: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProveJsonResponse {
    pub fn ok(base: &str, target: &str, result: String) -> Self {
        ProveJsonResponse {
            schema_version: SCHEMA_VERSION,
            ok: true,
            base: base.to_string(),
            target: target.to_string(),
            result: Some(result),
            error: None,
        }
    }

    pub fn err(base: &str, target: &str, error: &EngineError) -> Self {
        ProveJsonResponse {
            schema_version: SCHEMA_VERSION,
            ok: false,
            base: base.to_string(),
            target: target.to_string(),
            result: None,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_import_preserves_keys_and_renderings() {
        let dict = Dictionary::build_seeded("12", 3).unwrap();
        let pairs = dict.export_pairs();
        let rebuilt = Mapping::from_pairs(&pairs).unwrap();
        assert_eq!(rebuilt.len(), dict.len());
        for (key, repr) in &pairs {
            let entry = rebuilt.get(key).expect("missing key after import");
            let original = Node::from_repr(repr).unwrap();
            assert_eq!(entry.node.render(), original.render());
            assert_eq!(entry.value.to_string(), *key);
        }
    }

    #[test]
    fn export_pairs_are_magnitude_ordered() {
        let dict = Dictionary::build_seeded("12", 3).unwrap();
        let pairs = dict.export_pairs();
        let magnitudes: Vec<Value> = pairs
            .iter()
            .map(|(k, _)| Value::parse(k).unwrap().abs())
            .collect();
        for window in magnitudes.windows(2) {
            assert!(window[0] >= window[1]);
        }
    }

    #[test]
    fn malformed_pairs_are_rejected() {
        let pairs = vec![("not a number".to_string(), NodeRepr::Leaf("1".into()))];
        assert!(Mapping::from_pairs(&pairs).is_err());
    }

    #[test]
    fn response_envelope_round_trips() {
        let resp = ProveJsonResponse::ok("123", "360", "12*30".to_string());
        let json = serde_json::to_string(&resp).unwrap();
        let back: ProveJsonResponse = serde_json::from_str(&json).unwrap();
        assert!(back.ok);
        assert_eq!(back.result.as_deref(), Some("12*30"));
        assert!(!json.contains("error"));
    }
}
