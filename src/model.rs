// src/model.rs
// =============================================================================
// The data that flows between the pipeline stages.
//
//   Collector  --LinkRecord-->  Validator  --ValidationResult-->  Report
//
// Both types are created once and never mutated afterwards.
// =============================================================================

use serde::Serialize;
use std::fmt;

/// A link found while crawling: where it points and which page it was on.
///
/// `parent` is empty when the page is unknown (a links file without a parent
/// column).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkRecord {
    pub url: String,
    pub parent: String,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            parent: parent.into(),
        }
    }
}

/// What the validator learned about the status of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// A real HTTP status code from the final response
    Http(u16),
    /// No response at all (timeout, DNS failure, connection refused, ...)
    NetworkFailure,
    /// The link was never requested
    NotChecked,
}

impl LinkStatus {
    /// Sentinel written to reports for network failures; no server sends 0.
    pub const NETWORK_FAILURE_CODE: u16 = 0;

    pub fn is_error_class(self) -> bool {
        match self {
            LinkStatus::Http(code) => (400..600).contains(&code),
            LinkStatus::NetworkFailure => true,
            LinkStatus::NotChecked => false,
        }
    }

    /// The value of the report's `status` column.
    pub fn report_value(self) -> String {
        match self {
            LinkStatus::Http(code) => code.to_string(),
            LinkStatus::NetworkFailure => Self::NETWORK_FAILURE_CODE.to_string(),
            LinkStatus::NotChecked => String::new(),
        }
    }
}

impl Serialize for LinkStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LinkStatus::Http(code) => serializer.serialize_u16(*code),
            LinkStatus::NetworkFailure => serializer.serialize_u16(Self::NETWORK_FAILURE_CODE),
            LinkStatus::NotChecked => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    Ok,
    Broken,
    Skipped,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Ok => "OK",
            LinkState::Broken => "BROKEN",
            LinkState::Skipped => "SKIPPED",
        };
        f.write_str(s)
    }
}

/// Diagnostics for anything that is not `OK`.
///
/// Field order is fixed so the JSON in the report is stable between runs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_pattern: Option<String>,
}

impl FailureDetails {
    pub fn to_json(&self) -> String {
        // A struct of strings and integers always serializes
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// The outcome of checking one `LinkRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub url: String,
    pub parent: String,
    pub status: LinkStatus,
    pub state: LinkState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_details: Option<FailureDetails>,
}

impl ValidationResult {
    /// A link that matched a skip pattern and was never requested.
    pub fn skipped(record: LinkRecord, pattern: &str) -> Self {
        Self {
            url: record.url,
            parent: record.parent,
            status: LinkStatus::NotChecked,
            state: LinkState::Skipped,
            failure_details: Some(FailureDetails {
                skip_pattern: Some(pattern.to_string()),
                ..FailureDetails::default()
            }),
        }
    }

    /// A link that produced an HTTP response. Error-class codes are broken.
    pub fn from_status(record: LinkRecord, code: u16, attempts: u32) -> Self {
        let status = LinkStatus::Http(code);
        if status.is_error_class() {
            Self {
                url: record.url,
                parent: record.parent,
                status,
                state: LinkState::Broken,
                failure_details: Some(FailureDetails {
                    error: Some(format!("HTTP {}", code)),
                    attempts: Some(attempts),
                    skip_pattern: None,
                }),
            }
        } else {
            Self {
                url: record.url,
                parent: record.parent,
                status,
                state: LinkState::Ok,
                failure_details: None,
            }
        }
    }

    /// A link that never produced a response.
    pub fn network_failure(record: LinkRecord, error: String, attempts: u32) -> Self {
        Self {
            url: record.url,
            parent: record.parent,
            status: LinkStatus::NetworkFailure,
            state: LinkState::Broken,
            failure_details: Some(FailureDetails {
                error: Some(error),
                attempts: Some(attempts),
                skip_pattern: None,
            }),
        }
    }

    pub fn is_broken(&self) -> bool {
        self.state == LinkState::Broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str) -> LinkRecord {
        LinkRecord::new(url, "https://site.test/")
    }

    #[test]
    fn test_client_and_server_errors_are_broken() {
        for code in [400, 404, 410, 429, 500, 503, 599] {
            let result = ValidationResult::from_status(record("https://a.test/"), code, 1);
            assert_eq!(result.state, LinkState::Broken, "code {}", code);
            assert!(result.failure_details.is_some());
        }
    }

    #[test]
    fn test_success_and_redirect_codes_are_ok() {
        for code in [200, 204, 301, 304, 399] {
            let result = ValidationResult::from_status(record("https://a.test/"), code, 1);
            assert_eq!(result.state, LinkState::Ok, "code {}", code);
            assert_eq!(result.failure_details, None);
        }
    }

    #[test]
    fn test_network_failure_uses_zero_sentinel() {
        let result =
            ValidationResult::network_failure(record("https://a.test/"), "timed out".into(), 3);
        assert_eq!(result.state, LinkState::Broken);
        assert_eq!(result.status.report_value(), "0");
    }

    #[test]
    fn test_skipped_has_no_status() {
        let result = ValidationResult::skipped(record("https://a.test/x.png"), r"\.png$");
        assert_eq!(result.status, LinkStatus::NotChecked);
        assert_eq!(result.status.report_value(), "");
        assert_eq!(
            result.failure_details.unwrap().to_json(),
            r#"{"skipPattern":"\\.png$"}"#
        );
    }

    #[test]
    fn test_failure_details_json_field_order() {
        let details = FailureDetails {
            error: Some("HTTP 404".into()),
            attempts: Some(1),
            skip_pattern: None,
        };
        assert_eq!(details.to_json(), r#"{"error":"HTTP 404","attempts":1}"#);
    }
}
