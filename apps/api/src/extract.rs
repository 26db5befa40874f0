//! Request extractors whose rejections render as `AppError`.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts},
};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// `axum::Json` with a `{detail, code}` rejection.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` with a `{detail, code}` rejection.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Parses an optional JSON body. Only an empty body counts as absent; any
/// other body must deserialize, whatever its content type.
pub fn optional_json<T: DeserializeOwned>(body: &Bytes) -> Result<Option<T>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| AppError::InvalidInput(format!("invalid JSON body: {e}")))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Topic {
        topic: Option<String>,
    }

    #[test]
    fn test_empty_body_is_absent() {
        assert!(optional_json::<Topic>(&Bytes::new()).unwrap().is_none());
        assert!(optional_json::<Topic>(&Bytes::from_static(b"  \n")).unwrap().is_none());
    }

    #[test]
    fn test_body_is_parsed_or_rejected() {
        let parsed: Option<Topic> = optional_json(&Bytes::from_static(br#"{"topic":"rust"}"#)).unwrap();
        assert_eq!(parsed.unwrap().topic.as_deref(), Some("rust"));

        assert!(matches!(
            optional_json::<Topic>(&Bytes::from_static(br#"{"topic":5}"#)),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            optional_json::<Topic>(&Bytes::from_static(b"not json")),
            Err(AppError::InvalidInput(_))
        ));
    }
}
