//! Opaque wire tokens for cursors.
//!
//! A token is URL-safe, unpadded base64 over a small JSON envelope:
//! `{"v":1,"fp":"<order fingerprint>","k":{<column>: <value>}}`. The
//! fingerprint binds the token to the ordering it was produced for.

use crate::pagination::{cursor::Cursor, error::MalformedCursorError, order::OrderSpec};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};

pub const TOKEN_VERSION: u8 = 1;

// Upper bound on untrusted token input.
pub const MAX_CURSOR_TOKEN_LEN: usize = 8 * 1024;

#[derive(Serialize, Deserialize)]
struct Envelope {
    v: u8,
    fp: String,
    k: Cursor,
}

pub struct CursorToken;

impl CursorToken {
    /// Encodes `cursor` as a token bound to `order`.
    pub fn encode(cursor: &Cursor, order: &OrderSpec) -> Result<String, MalformedCursorError> {
        Self::encode_envelope(&Envelope {
            v: TOKEN_VERSION,
            fp: fingerprint_hex(order),
            k: cursor.clone(),
        })
    }

    /// Decodes a token and checks it against `order`.
    pub fn decode(token: &str, order: &OrderSpec) -> Result<Cursor, MalformedCursorError> {
        let envelope = Self::decode_envelope(token)?;
        if envelope.fp != fingerprint_hex(order) {
            return Err(MalformedCursorError::OrderMismatch);
        }
        envelope.k.validate_for(order)?;
        Ok(envelope.k)
    }

    fn encode_envelope(envelope: &Envelope) -> Result<String, MalformedCursorError> {
        let json = serde_json::to_vec(envelope)
            .map_err(|e| MalformedCursorError::Payload(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode_envelope(token: &str) -> Result<Envelope, MalformedCursorError> {
        let token = token.trim();

        if token.is_empty() {
            return Err(MalformedCursorError::Empty);
        }

        if token.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(MalformedCursorError::TooLong {
                len: token.len(),
                max: MAX_CURSOR_TOKEN_LEN,
            });
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| MalformedCursorError::Encoding(e.to_string()))?;

        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| MalformedCursorError::Payload(e.to_string()))?;

        if envelope.v != TOKEN_VERSION {
            return Err(MalformedCursorError::UnsupportedVersion(envelope.v));
        }

        Ok(envelope)
    }
}

fn fingerprint_hex(order: &OrderSpec) -> String {
    format!("{:016x}", order.fingerprint())
}
