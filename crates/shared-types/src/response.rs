//! # Responses
//!
//! A `(status, body)` pair produced by the request handler and by the
//! gateway's own validation paths, plus its conversion to reply parts.

use bytes::Bytes;
pub use http::StatusCode;

/// Response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Opaque bytes, sent as-is.
    Bytes(Bytes),
    /// Plain text, sent as UTF-8.
    Text(String),
    /// Structured body, sent as its compact JSON text.
    Json(serde_json::Value),
}

impl Body {
    /// Wire form of the body.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Bytes(b) => b.clone(),
            Body::Text(s) => Bytes::copy_from_slice(s.as_bytes()),
            Body::Json(v) => Bytes::from(v.to_string()),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Body::Bytes(b)
    }
}

impl From<serde_json::Value> for Body {
    fn from(v: serde_json::Value) -> Self {
        Body::Json(v)
    }
}

/// Status plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Body,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `200 OK` with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// `400 Bad Request` with a reason.
    pub fn bad_request(reason: impl Into<Body>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, reason)
    }

    /// Reply parts: `(status_as_decimal, body)`. When `omit_ok` is set an `OK`
    /// response collapses to the single body part.
    pub fn into_parts(self, omit_ok: bool) -> Vec<Bytes> {
        let body = self.body.to_bytes();
        if omit_ok && self.status == StatusCode::OK {
            vec![body]
        } else {
            vec![status_part(self.status), body]
        }
    }
}

/// Status code rendered as the decimal text used on the wire.
pub fn status_part(status: StatusCode) -> Bytes {
    Bytes::from(status.as_u16().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_body_is_compact_text() {
        let body = Body::Json(serde_json::json!({"a": 1, "b": [true]}));
        assert_eq!(body.to_bytes(), Bytes::from_static(br#"{"a":1,"b":[true]}"#));
    }

    #[test]
    fn test_ok_collapses_when_requested() {
        let parts = Response::ok("hi").into_parts(true);
        assert_eq!(parts, vec![Bytes::from_static(b"hi")]);

        let parts = Response::ok("hi").into_parts(false);
        assert_eq!(parts, vec![Bytes::from_static(b"200"), Bytes::from_static(b"hi")]);
    }

    #[test]
    fn test_error_status_always_two_parts() {
        let parts = Response::bad_request("nope").into_parts(true);
        assert_eq!(parts, vec![Bytes::from_static(b"400"), Bytes::from_static(b"nope")]);
    }
}
