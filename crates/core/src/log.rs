//! Log records — the input to every analysis request.
//!
//! Records are supplied by the caller, immutable, and kept in caller order.
//! The prompt builder renders them verbatim; nothing here reorders or
//! deduplicates.

use serde::{Deserialize, Serialize};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Critical,
}

impl LogLevel {
    /// Whether this level indicates an incident worth remediating.
    pub fn is_incident(&self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

/// A single log entry from a Kubernetes pod.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Caller-assigned identifier.
    pub id: String,

    /// Timestamp as supplied by the caller — rendered verbatim, not parsed.
    pub timestamp: String,

    /// Severity level.
    pub level: LogLevel,

    /// Source pod name.
    pub pod: String,

    /// The log line itself.
    pub message: String,
}

impl LogRecord {
    /// Render as one prompt line: `[timestamp] [LEVEL] [pod] message`.
    pub fn prompt_line(&self) -> String {
        format!(
            "[{}] [{}] [{}] {}",
            self.timestamp,
            self.level.as_str(),
            self.pod,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(level: LogLevel) -> LogRecord {
        LogRecord {
            id: "log-1".into(),
            timestamp: "2024-05-01T10:00:00Z".into(),
            level,
            pod: "payment-service-7d9cf".into(),
            message: "OOMKilled".into(),
        }
    }

    #[test]
    fn level_serializes_uppercase() {
        let json = serde_json::to_string(&LogLevel::Critical).unwrap();
        assert_eq!(json, r#""CRITICAL""#);
        let level: LogLevel = serde_json::from_str(r#""WARN""#).unwrap();
        assert_eq!(level, LogLevel::Warn);
    }

    #[test]
    fn incident_levels() {
        assert!(LogLevel::Error.is_incident());
        assert!(LogLevel::Critical.is_incident());
        assert!(!LogLevel::Info.is_incident());
        assert!(!LogLevel::Warn.is_incident());
    }

    #[test]
    fn prompt_line_format() {
        let line = record(LogLevel::Error).prompt_line();
        assert_eq!(
            line,
            "[2024-05-01T10:00:00Z] [ERROR] [payment-service-7d9cf] OOMKilled"
        );
    }

    #[test]
    fn record_deserializes_from_api_payload() {
        let json = r#"{
            "id": "a1",
            "timestamp": "2024-05-01T10:00:00Z",
            "level": "CRITICAL",
            "pod": "api-6f7b8",
            "message": "CrashLoopBackOff"
        }"#;
        let rec: LogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.level, LogLevel::Critical);
        assert_eq!(rec.pod, "api-6f7b8");
    }
}
