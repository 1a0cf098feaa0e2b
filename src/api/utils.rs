//! API utility functions
//!
//! Request-body parsing and tool lookup shared by the tool handlers.

use crate::error::AppError;
use crate::tools::ToolName;
use axum::body::Bytes;
use serde_json::Value;

/// Look up an operation by wire name
///
/// # Errors
/// * `AppError::ToolNotFound` if no operation has that name
pub fn lookup_tool(name: &str) -> Result<ToolName, AppError> {
    name.parse::<ToolName>().map_err(AppError::ToolNotFound)
}

/// Parse the request body as tool arguments
///
/// An empty body means "no arguments" and yields `Value::Null`.
///
/// # Errors
/// * `AppError::InvalidRequest` if the body is not JSON
pub fn parse_arguments(body: &Bytes) -> Result<Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("Body is not valid JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(&Bytes::new()).unwrap(), Value::Null);
        assert_eq!(parse_arguments(&Bytes::from_static(b"  \n")).unwrap(), Value::Null);
        assert_eq!(
            parse_arguments(&Bytes::from_static(br#"{"entity":"Workers"}"#)).unwrap(),
            json!({"entity": "Workers"})
        );
        assert!(matches!(
            parse_arguments(&Bytes::from_static(b"{not json")),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_lookup_tool() {
        assert_eq!(lookup_tool("odataQuery").unwrap(), ToolName::OdataQuery);
        assert!(matches!(
            lookup_tool("deleteEverything"),
            Err(AppError::ToolNotFound(name)) if name == "deleteEverything"
        ));
    }
}
