use std::path::Path;

use df_lang::{Tags, Value};
use orion_error::StructError;

use crate::error::{CoreReason, CoreResult};

/// The tag document of one series: the raw JSON (forwarded verbatim to the
/// bookkeeper on registration) plus the scalar view rules are evaluated
/// against.
#[derive(Debug, Clone)]
pub struct TagSet {
    raw: serde_json::Value,
    values: Tags,
}

impl TagSet {
    /// Read and parse a sidecar tags file. Both unreadable files and
    /// malformed JSON surface as `TagParse` — the series is abandoned until
    /// an operator intervenes.
    pub fn read(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StructError::from(CoreReason::TagParse)
                .with_detail(format!("unable to read tags file {}: {e}", path.display()))
        })?;
        Self::parse(&text).map_err(|e| {
            StructError::from(CoreReason::TagParse)
                .with_detail(format!("invalid tags file {}: {e}", path.display()))
        })
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let raw: serde_json::Value = serde_json::from_str(text)?;
        let object = raw
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("tag document is not a JSON object"))?;

        let values = object
            .iter()
            .map(|(key, value)| (key.clone(), json_scalar(value)))
            .collect();

        Ok(Self { raw, values })
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn values(&self) -> &Tags {
        &self.values
    }
}

/// Scalar view of one JSON tag value. Nested values are rendered as their
/// JSON text so rules can still match on them as strings.
fn json_scalar(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
        serde_json::Value::String(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scalars() {
        let tags = TagSet::parse(
            r#"{"Modality": "CT", "SeriesNumber": 3, "BodyPart": null, "Contrast": true}"#,
        )
        .unwrap();
        assert_eq!(tags.values()["Modality"], Value::Str("CT".into()));
        assert_eq!(tags.values()["SeriesNumber"], Value::Number(3.0));
        assert_eq!(tags.values()["BodyPart"], Value::Null);
        assert_eq!(tags.values()["Contrast"], Value::Bool(true));
    }

    #[test]
    fn reject_non_object() {
        assert!(TagSet::parse("[1, 2, 3]").is_err());
        assert!(TagSet::parse("not json").is_err());
    }

    #[test]
    fn read_missing_file_is_tag_parse() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TagSet::read(&dir.path().join("nope.tags")).is_err());
    }
}
