//! # Errors (Feathers-style)
//!
//! Structured errors that the HTTP layer turns into responses.
//! A `DogError` travels inside `anyhow::Error` until it reaches the
//! transport, which decides how to serialize it.
//!
//! With feature `serde` you also get a `to_json()` helper producing
//! `{name, message, code, className}`.

use std::fmt;

use anyhow::Error as AnyError;

/// Error classes the proxy surfaces, with their HTTP status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,     // 404
    GeneralError, // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Feathers error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Feathers error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct DogError {
    pub kind: ErrorKind,
    pub message: String,
    pub source: Option<AnyError>,
}

impl DogError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause; it stays server-side.
    pub fn with_source(mut self, source: impl Into<AnyError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Copy suitable for clients: the inner `source` (backend details) is dropped.
    pub fn sanitize_for_client(&self) -> DogError {
        DogError {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }

    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

impl fmt::Display for DogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for DogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(feature = "serde")]
impl DogError {
    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_a_trip_through_anyhow() {
        let err = DogError::not_found("missing").into_anyhow();
        let dog = err.downcast_ref::<DogError>().unwrap();
        assert_eq!(dog.kind, ErrorKind::NotFound);
        assert_eq!(dog.code(), 404);
        assert_eq!(err.to_string(), "NotFound (404): missing");
    }

    #[test]
    fn sanitize_drops_the_cause() {
        let dog = DogError::general_error("Failed to read video chunk")
            .with_source(anyhow::anyhow!("connection reset by peer"));
        assert!(std::error::Error::source(&dog).is_some());

        let safe = dog.sanitize_for_client();
        assert!(safe.source.is_none());
        assert_eq!(safe.kind, ErrorKind::GeneralError);
        assert_eq!(safe.message, "Failed to read video chunk");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_body_has_feathers_shape() {
        let body = DogError::not_found("Video not found: a.mp4").to_json();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "NotFound",
                "message": "Video not found: a.mp4",
                "code": 404,
                "className": "not-found",
            })
        );
    }
}
