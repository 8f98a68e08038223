//! One JSONL log line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single event, self-contained so lines can be appended independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// RFC 3339 UTC timestamp with milliseconds
    pub ts: String,

    /// trace, debug, info, warn or error
    pub level: String,

    /// Run identifier the event belongs to
    pub run: String,

    /// Module path of the event (e.g. "didwallet_core::orchestrator")
    pub target: String,

    pub msg: String,

    /// Structured event fields (wallet, handle, step, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,

    /// Enclosing spans, outermost first, joined with " > "
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl LogEntry {
    pub fn new(
        level: impl Into<String>,
        run: impl Into<String>,
        target: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: level.into(),
            run: run.into(),
            target: target.into(),
            msg: msg.into(),
            fields: None,
            span: None,
        }
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_span(mut self, span: impl Into<String>) -> Self {
        self.span = Some(span.into());
        self
    }

    /// A field's value, if it was recorded.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.as_ref().and_then(|f| f.get(name))
    }

    /// Serialize to one line, without the trailing newline.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_line_format() {
        let entry = LogEntry::new("info", "run-1", "didwallet_core::local", "Opened wallet")
            .with_fields(serde_json::json!({ "wallet": "personAWallet", "handle": "1" }));

        let json = entry.to_json_line().unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"run\":\"run-1\""));
        assert!(json.contains("\"wallet\":\"personAWallet\""));
        assert!(!json.contains("\"span\""));

        let parsed = LogEntry::from_json_line(&json).unwrap();
        assert_eq!(parsed, entry);
        assert_eq!(
            parsed.field("wallet").and_then(|v| v.as_str()),
            Some("personAWallet")
        );
    }

    #[test]
    fn test_optional_parts_may_be_absent() {
        let line = r#"{"ts":"2026-10-18T10:00:00.000Z","level":"warn","run":"r","target":"t","msg":"m"}"#;
        let entry = LogEntry::from_json_line(line).unwrap();
        assert_eq!(entry.fields, None);
        assert_eq!(entry.field("anything"), None);
    }
}
