//! HTTP error normalization
//!
//! Turns a failed response into the sentence shown to the user. Common
//! statuses get fixed wording; everything else falls back to the server's
//! `detail` or a generic line.

use serde::Deserialize;
use serde_json::Value;

const MISSING_TABLES: &str = "Database tables not initialized. Please contact the backend administrator to run database migrations.";
const INTERNAL_ERROR: &str = "Internal server error. Please try again later or contact support.";
const UNAUTHORIZED: &str = "Authentication failed. Please check your credentials.";
const FORBIDDEN: &str = "You do not have permission to perform this action.";
const NOT_FOUND: &str = "The requested resource was not found.";
const INVALID_INPUT: &str = "Invalid input. Please check your data and try again.";

/// Error payload shapes the backend is known to send
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse a body, treating anything unparseable as `{detail: status_text}`
    pub fn parse(raw: &str, status_text: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| ErrorBody {
            detail: Some(Value::String(status_text.to_string())),
            error: None,
        })
    }

    /// `detail` as text. Validation errors arrive as a list of `{msg}` objects.
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Array(items) => {
                let msgs: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s.clone()),
                        other => other.get("msg").and_then(Value::as_str).map(str::to_string),
                    })
                    .collect();
                if msgs.is_empty() {
                    None
                } else {
                    Some(msgs.join("; "))
                }
            }
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        }
    }
}

/// Human-readable message for a failed response
pub fn normalize_error(status: u16, body: &ErrorBody) -> String {
    let fallback = || {
        body.detail_text()
            .unwrap_or_else(|| format!("HTTP error! status: {}", status))
    };

    match status {
        500 => match body.error.as_deref() {
            Some(err) if err.contains("no such table") => MISSING_TABLES.to_string(),
            Some(err) => format!("Server error: {}", err),
            None => INTERNAL_ERROR.to_string(),
        },
        401 => UNAUTHORIZED.to_string(),
        403 => FORBIDDEN.to_string(),
        404 => NOT_FOUND.to_string(),
        422 => body.detail_text().unwrap_or_else(|| INVALID_INPUT.to_string()),
        _ => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(raw: &str) -> ErrorBody {
        ErrorBody::parse(raw, "Bad Request")
    }

    #[test]
    fn test_tailored_statuses() {
        let b = body(r#"{"detail":"Incorrect email or password"}"#);
        assert_eq!(normalize_error(401, &b), UNAUTHORIZED);
        assert_eq!(normalize_error(403, &b), FORBIDDEN);
        assert_eq!(normalize_error(404, &b), NOT_FOUND);
    }

    #[test]
    fn test_server_errors() {
        assert_eq!(
            normalize_error(500, &body(r#"{"error":"no such table: projects"}"#)),
            MISSING_TABLES
        );
        assert_eq!(
            normalize_error(500, &body(r#"{"error":"disk full"}"#)),
            "Server error: disk full"
        );
        assert_eq!(normalize_error(500, &body("<html>")), INTERNAL_ERROR);
    }

    #[test]
    fn test_validation_detail_list() {
        let b = body(r#"{"detail":[{"loc":["body","amount"],"msg":"value is not a valid float"},{"msg":"field required"}]}"#);
        assert_eq!(
            normalize_error(422, &b),
            "value is not a valid float; field required"
        );
        assert_eq!(normalize_error(422, &body("{}")), INVALID_INPUT);
    }

    #[test]
    fn test_other_statuses_use_detail_or_generic() {
        assert_eq!(
            normalize_error(409, &body(r#"{"detail":"User with this email already exists"}"#)),
            "User with this email already exists"
        );
        assert_eq!(normalize_error(400, &body("not json")), "Bad Request");
        assert_eq!(normalize_error(502, &ErrorBody::default()), "HTTP error! status: 502");
    }
}
