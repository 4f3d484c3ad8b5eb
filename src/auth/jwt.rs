//! JWT Claims Decoding
//!
//! Reads the header and payload of a compact `header.payload.signature`
//! token. The signature is never checked: the backend is the trust boundary
//! and this module only extracts claims for display and expiry decisions.
//! Do not treat a successful decode as authentication.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// base64url, padding optional
const SEGMENT_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Header and claims of a token, as JSON objects
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub header: Map<String, Value>,
    pub payload: Map<String, Value>,
}

impl DecodedToken {
    /// Declared signing algorithm (`alg`)
    pub fn algorithm(&self) -> Option<&str> {
        self.header.get("alg").and_then(Value::as_str)
    }

    /// `exp` claim in epoch seconds
    pub fn expires_at(&self) -> Option<i64> {
        match self.payload.get("exp")? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            _ => None,
        }
    }

    /// Deserialize the payload into a typed claims struct
    pub fn claims<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(Value::Object(self.payload.clone())).ok()
    }
}

/// Decode a compact token.
///
/// Returns `None` unless the input has exactly three dot-separated base64url
/// segments whose first two hold JSON objects.
pub fn decode(token: &str) -> Option<DecodedToken> {
    let mut segments = token.split('.');
    let (header, payload, signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    SEGMENT_ENGINE.decode(signature).ok()?;

    Some(DecodedToken {
        header: decode_segment(header)?,
        payload: decode_segment(payload)?,
    })
}

fn decode_segment(segment: &str) -> Option<Map<String, Value>> {
    let bytes = SEGMENT_ENGINE.decode(segment).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
