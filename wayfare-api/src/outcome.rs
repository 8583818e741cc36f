use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt::Display;
use tracing::warn;

/// Result of a read endpoint. Both variants go out as HTTP 200 so the UI
/// keeps rendering; `success` tells the client which one it got.
///
/// ```json
/// {"success": true, "data": [...]}
/// {"success": false, "error": "...", "data": []}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure { error: String, fallback: T },
}

impl<T> Outcome<T> {
    pub fn degraded(error: impl Display, fallback: T) -> Self {
        let error = error.to_string();
        warn!("Serving degraded response: {}", error);
        Outcome::Failure { error, fallback }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl<T: Default> Outcome<T> {
    pub fn empty_failure(error: impl Display) -> Self {
        Self::degraded(error, T::default())
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Outcome::Success(data) => {
                let mut s = serializer.serialize_struct("Outcome", 2)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
                s.end()
            }
            Outcome::Failure { error, fallback } => {
                let mut s = serializer.serialize_struct("Outcome", 3)?;
                s.serialize_field("success", &false)?;
                s.serialize_field("error", error)?;
                s.serialize_field("data", fallback)?;
                s.end()
            }
        }
    }
}

impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
