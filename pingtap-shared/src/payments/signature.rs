//! Gateway signature checks
//!
//! Both the checkout callback and the webhook are authenticated with a
//! lowercase hex HMAC-SHA256. Comparison goes through `Mac::verify_slice`,
//! which is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature is not valid hex")]
    Encoding,

    #[error("Signature does not match")]
    Mismatch,

    #[error("Signing key rejected")]
    InvalidKey,
}

/// Hex HMAC-SHA256 of `message` under `secret`
pub fn sign(secret: &str, message: &[u8]) -> Result<String, SignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex signature over `message`
pub fn verify(secret: &str, message: &[u8], signature: &str) -> Result<(), SignatureError> {
    let expected = hex::decode(signature.trim()).map_err(|_| SignatureError::Encoding)?;

    let mut mac = new_mac(secret)?;
    mac.update(message);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Checkout callback signature: HMAC over `"{order_id}|{payment_id}"`
/// keyed with the API key secret
pub fn verify_payment_signature(
    key_secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), SignatureError> {
    let message = format!("{order_id}|{payment_id}");
    verify(key_secret, message.as_bytes(), signature)
}

/// Webhook signature: HMAC over the raw request body keyed with the
/// webhook secret
pub fn verify_webhook_signature(
    webhook_secret: &str,
    raw_body: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    verify(webhook_secret, raw_body, signature)
}

fn new_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            sign("Jefe", b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_payment_signature_round() {
        let signature = sign("key_secret", b"order_ABC|pay_XYZ").unwrap();
        assert!(verify_payment_signature("key_secret", "order_ABC", "pay_XYZ", &signature).is_ok());
    }

    #[test]
    fn test_payment_signature_swapped_ids_rejected() {
        let signature = sign("key_secret", b"order_ABC|pay_XYZ").unwrap();
        assert_eq!(
            verify_payment_signature("key_secret", "pay_XYZ", "order_ABC", &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_webhook_signature_tampered_body() {
        let body = br#"{"event":"payment.captured"}"#;
        let signature = sign("whsec", body).unwrap();
        assert!(verify_webhook_signature("whsec", body, &signature).is_ok());
        assert_eq!(
            verify_webhook_signature("whsec", br#"{"event":"payment.failed"}"#, &signature),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signature = sign("right", b"body").unwrap();
        assert_eq!(verify("wrong", b"body", &signature), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_garbage_signature() {
        assert_eq!(verify("secret", b"body", "not-hex"), Err(SignatureError::Encoding));
        assert_eq!(verify("secret", b"body", ""), Err(SignatureError::Mismatch));
    }
}
