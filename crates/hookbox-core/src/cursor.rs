//! Opaque pagination cursor over the record sort key.
//!
//! A cursor pins a position in the `(created_at, id)` descending order, so
//! pages taken while new records arrive stay disjoint and exhaustive. The
//! token is positional, never an array offset.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    error::{CoreError, Result},
    models::RecordId,
};

/// Position in the `(created_at, id)` descending sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Timestamp component of the sort key.
    pub created_at: DateTime<Utc>,
    /// Id component, breaking ties between identical timestamps.
    pub id: RecordId,
}

impl Cursor {
    /// Encodes the cursor as an opaque URL-safe token.
    pub fn encode(&self) -> String {
        let nanos = self.created_at.timestamp_nanos_opt().unwrap_or(i64::MAX);
        URL_SAFE_NO_PAD.encode(format!("{nanos}.{}", self.id.0))
    }

    /// Decodes a token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidFilter` for anything that is not a valid
    /// token, including truncated or hand-edited values.
    pub fn decode(token: &str) -> Result<Self> {
        let raw = URL_SAFE_NO_PAD.decode(token).map_err(|_| malformed())?;
        let text = String::from_utf8(raw).map_err(|_| malformed())?;
        let (nanos, id) = text.split_once('.').ok_or_else(malformed)?;
        let nanos: i64 = nanos.parse().map_err(|_| malformed())?;
        let id: Uuid = id.parse().map_err(|_| malformed())?;
        Ok(Self { created_at: Utc.timestamp_nanos(nanos), id: RecordId(id) })
    }
}

fn malformed() -> CoreError {
    CoreError::InvalidFilter("malformed cursor token".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let cursor = Cursor { created_at: Utc::now(), id: RecordId::new() };
        let decoded = Cursor::decode(&cursor.encode()).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn rejects_garbage_tokens() {
        for token in ["", "!!!!", "bm90LWEtY3Vyc29y", "MTIzNDU", "YWJjLmRlZg"] {
            assert!(
                matches!(Cursor::decode(token), Err(CoreError::InvalidFilter(_))),
                "token {token:?} should not decode"
            );
        }
    }

    #[test]
    fn rejects_valid_base64_with_bad_uuid() {
        let token = URL_SAFE_NO_PAD.encode("1700000000000000000.not-a-uuid");
        assert!(Cursor::decode(&token).is_err());
    }
}
