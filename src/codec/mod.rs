//! Payload codec module
//!
//! Serializes a QR token to the transport string placed into a scannable
//! artifact, and decodes untrusted scanned strings back. The payload is
//! JSON with an explicit `schema` version tag, so decoding dispatches on
//! the tag instead of guessing from field presence. Three schemas are in
//! circulation:
//!
//! - `v1` - a bare amount/description pair (legacy open-ended codes)
//! - `v2` - an unsigned payment request with merchant metadata
//! - `v3` - the signed transaction + public key envelope, the only shape
//!   a settlement can run against
//!
//! Decoding is all-or-nothing: any failure yields a [`DecodeError`] and
//! never a partially populated token.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DecodeError, PaymentError, QrToken, ValidityConfig};

/// A decoded scannable payload, tagged by schema version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum QrPayload {
    /// Legacy open-ended code: the payee types the amount to pay
    #[serde(rename = "v1")]
    Plain {
        /// Suggested amount
        amount: Decimal,
        /// Optional note
        #[serde(default)]
        description: Option<String>,
    },

    /// Unsigned payment request with merchant metadata
    #[serde(rename = "v2")]
    Request {
        /// Request identifier (not a ledger transaction id)
        id: String,
        /// Display name of the requesting party
        name: String,
        /// Requested amount
        amount: Decimal,
        /// Optional note
        #[serde(default)]
        description: Option<String>,
        /// Issuance instant of the request
        timestamp: DateTime<Utc>,
    },

    /// Signed transaction envelope; the only settleable schema
    #[serde(rename = "v3")]
    Signed(QrToken),
}

impl QrPayload {
    /// The schema tag this payload was decoded from
    pub fn schema_tag(&self) -> &'static str {
        match self {
            Self::Plain { .. } => "v1",
            Self::Request { .. } => "v2",
            Self::Signed(_) => "v3",
        }
    }

    /// Extract the signed token, rejecting legacy schemas
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::UnsupportedSchema` for `v1`/`v2` payloads;
    /// they decode fine but cannot drive a settlement.
    pub fn into_token(self) -> Result<QrToken, PaymentError> {
        match self {
            Self::Signed(token) => Ok(token),
            other => Err(PaymentError::unsupported_schema(other.schema_tag())),
        }
    }
}

/// Encode a token into its transport string
///
/// Total and lossless: every valid token encodes, and
/// [`decode`]`(`[`encode`]`(t))` yields `QrPayload::Signed(t)` field for
/// field.
pub fn encode(token: &QrToken) -> String {
    serde_json::to_string(&QrPayload::Signed(token.clone()))
        .expect("token payloads contain no unserializable values")
}

/// Decode an untrusted scanned string
///
/// # Errors
///
/// * `DecodeError::MalformedPayload` - the string is not well-formed
///   JSON
/// * `DecodeError::SchemaMismatch` - well-formed JSON, but the schema
///   tag is missing/unknown, required fields are absent or wrong-typed,
///   or the validity window exceeds [`ValidityConfig::MAX_SECS`]
pub fn decode(raw: &str) -> Result<QrPayload, DecodeError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedPayload {
            message: e.to_string(),
        })?;

    let payload: QrPayload =
        serde_json::from_value(value).map_err(|e| DecodeError::SchemaMismatch {
            message: e.to_string(),
        })?;

    // The window is wire data outside the signature envelope; cap it
    // here so no downstream consumer has to treat it as trusted.
    if let QrPayload::Signed(token) = &payload {
        if token.validity_secs > ValidityConfig::MAX_SECS {
            return Err(DecodeError::SchemaMismatch {
                message: format!(
                    "validity window {} exceeds maximum {}",
                    token.validity_secs,
                    ValidityConfig::MAX_SECS
                ),
            });
        }
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sign_in_place, Keypair};
    use crate::types::{Transaction, ValidityConfig};
    use rstest::rstest;

    fn signed_token() -> QrToken {
        let keypair = Keypair::generate();
        let mut tx = Transaction::new(
            "wallet_alice",
            "wallet_bob",
            Decimal::new(50000, 2),
            Some("dinner".to_string()),
        )
        .unwrap();
        sign_in_place(&mut tx, &keypair).unwrap();
        QrToken::issue(tx, keypair.public_key_hex(), ValidityConfig::INSTANT_PAY).unwrap()
    }

    #[test]
    fn test_round_trip_law() {
        let token = signed_token();
        let payload = decode(&encode(&token)).unwrap();
        assert_eq!(payload, QrPayload::Signed(token));
    }

    #[test]
    fn test_encoded_payload_carries_schema_tag() {
        let raw = encode(&signed_token());
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schema"], "v3");
    }

    #[rstest]
    #[case::not_json("}{ definitely not json")]
    #[case::truncated("{\"schema\":\"v3\",\"transaction\"")]
    #[case::empty("")]
    fn test_malformed_payload(#[case] raw: &str) {
        assert!(matches!(
            decode(raw).unwrap_err(),
            DecodeError::MalformedPayload { .. }
        ));
    }

    #[rstest]
    #[case::missing_tag(r#"{"amount":"12.00"}"#)]
    #[case::unknown_tag(r#"{"schema":"v9","amount":"12.00"}"#)]
    #[case::missing_field(r#"{"schema":"v2","name":"Coffee Shop"}"#)]
    #[case::wrong_type(r#"{"schema":"v1","amount":{"x":1}}"#)]
    fn test_schema_mismatch(#[case] raw: &str) {
        assert!(matches!(
            decode(raw).unwrap_err(),
            DecodeError::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_validity_window() {
        // A legitimately signed transaction wrapped in an absurd window
        // is invalid wire data, not a far-future deadline.
        let mut value = serde_json::to_value(QrPayload::Signed(signed_token())).unwrap();
        value["validity_secs"] = serde_json::json!(100_000_000_000_000_000u64);

        let result = decode(&value.to_string());
        assert!(matches!(
            result.unwrap_err(),
            DecodeError::SchemaMismatch { .. }
        ));
    }

    #[test]
    fn test_decode_v1_plain() {
        let payload = decode(r#"{"schema":"v1","amount":"45.00"}"#).unwrap();
        assert_eq!(
            payload,
            QrPayload::Plain {
                amount: Decimal::new(4500, 2),
                description: None,
            }
        );
    }

    #[test]
    fn test_decode_v2_request() {
        let raw = r#"{
            "schema": "v2",
            "id": "req_81",
            "name": "Coffee Shop",
            "amount": "45.00",
            "description": "two flat whites",
            "timestamp": "2026-08-30T10:00:00Z"
        }"#;
        let payload = decode(raw).unwrap();
        match payload {
            QrPayload::Request { id, name, amount, .. } => {
                assert_eq!(id, "req_81");
                assert_eq!(name, "Coffee Shop");
                assert_eq!(amount, Decimal::new(4500, 2));
            }
            other => panic!("expected v2 request, got {other:?}"),
        }
    }

    #[test]
    fn test_into_token_rejects_legacy_schemas() {
        let plain = decode(r#"{"schema":"v1","amount":"1.00"}"#).unwrap();
        assert!(matches!(
            plain.into_token().unwrap_err(),
            PaymentError::UnsupportedSchema { .. }
        ));
    }

    #[test]
    fn test_into_token_returns_signed_token() {
        let token = signed_token();
        let payload = decode(&encode(&token)).unwrap();
        assert_eq!(payload.into_token().unwrap(), token);
    }
}
