//! Slack request signing, version `v0`.
//!
//! Slack signs `v0:{timestamp}:{raw body}` with HMAC-SHA256 keyed by the app's
//! signing secret and sends the hex digest as `X-Slack-Signature: v0=<hex>`.
//! The timestamp travels in `X-Slack-Request-Timestamp` and bounds replay.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

const SIGNATURE_VERSION: &str = "v0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("slack signing secret is not configured")]
    MissingSecret,
    #[error("missing `{0}` header")]
    MissingHeader(&'static str),
    #[error("request timestamp `{0}` is not a unix timestamp")]
    InvalidTimestamp(String),
    #[error("request timestamp is {skew_secs}s away from server time")]
    StaleTimestamp { skew_secs: u64 },
    #[error("signature header is not a `v0=` hex digest")]
    MalformedSignature,
    #[error("signature does not match request body")]
    Mismatch,
}

impl SignatureError {
    /// Setup failures are server-side problems rather than a bad request.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::MissingSecret)
    }
}

#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    secret: SecretString,
    tolerance_secs: u64,
}

impl SignatureVerifier {
    pub fn new(secret: SecretString, tolerance_secs: u64) -> Result<Self, SignatureError> {
        if secret.expose_secret().is_empty() {
            return Err(SignatureError::MissingSecret);
        }
        Ok(Self { secret, tolerance_secs })
    }

    pub fn verify(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
        now_unix: i64,
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let issued_at = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;
        let skew_secs = now_unix.saturating_sub(issued_at).unsigned_abs();
        if skew_secs > self.tolerance_secs {
            return Err(SignatureError::StaleTimestamp { skew_secs });
        }

        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;
        let digest = signature
            .trim()
            .strip_prefix("v0=")
            .and_then(decode_hex)
            .ok_or(SignatureError::MalformedSignature)?;

        self.mac(timestamp, body)?.verify_slice(&digest).map_err(|_| SignatureError::Mismatch)
    }

    /// Produces the header value Slack would send for `body` at `timestamp`.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> Result<String, SignatureError> {
        let digest = self.mac(timestamp, body)?.finalize().into_bytes();
        Ok(format!("{SIGNATURE_VERSION}={}", encode_hex(digest.as_slice())))
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| SignatureError::MissingSecret)?;
        mac.update(SIGNATURE_VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        Ok(mac)
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push_str(&format!("{byte:02x}"));
    }
    output
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    let bytes = value.as_bytes();
    if bytes.is_empty() || bytes.len() % 2 != 0 {
        return None;
    }

    bytes
        .chunks_exact(2)
        .map(|pair| Some((hex_nibble(pair[0])? << 4) | hex_nibble(pair[1])?))
        .collect()
}

fn hex_nibble(value: u8) -> Option<u8> {
    match value {
        b'0'..=b'9' => Some(value - b'0'),
        b'a'..=b'f' => Some(value - b'a' + 10),
        b'A'..=b'F' => Some(value - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{
        decode_hex, SignatureError, SignatureVerifier, DEFAULT_TOLERANCE_SECS, SIGNATURE_HEADER,
        TIMESTAMP_HEADER,
    };

    const NOW: i64 = 1_531_420_618;
    const BODY: &[u8] = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&command=%2Fscore&text=foo%2B%2B";

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(
            SecretString::from("8f742231b10e8888abcd99yyyzzz85a5".to_string()),
            DEFAULT_TOLERANCE_SECS,
        )
        .expect("verifier")
    }

    #[test]
    fn matches_slack_documented_example() {
        let verifier = verifier();
        let body = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&team_domain=testteamnow&channel_id=G8PSS9T3V&channel_name=foobar&user_id=U2CERLKJA&user_name=roadrunner&command=%2Fwebhook-collect&text=&response_url=https%3A%2F%2Fhooks.slack.com%2Fcommands%2FT1DC2JH3J%2F397700885554%2F96rGlfmibIGlgcZRskXaIFfN&trigger_id=398738663015.47445629121.803a0bc887a14d10d2c447fce8b6703c";
        let expected = "v0=a2114d57b48eac39b9ad189dd8316235a7b4a8d21a10bd27519666489c69b503";

        assert_eq!(verifier.sign("1531420618", body).expect("sign"), expected);
        assert_eq!(verifier.verify(Some("1531420618"), Some(expected), body, NOW), Ok(()));
    }

    #[test]
    fn accepts_uppercase_hex_digest() {
        let verifier = verifier();
        let signature = verifier.sign("1531420618", BODY).expect("sign").to_uppercase();
        let signature = signature.replacen("V0=", "v0=", 1);
        assert_eq!(verifier.verify(Some("1531420618"), Some(&signature), BODY, NOW), Ok(()));
    }

    #[test]
    fn rejects_tampered_body() {
        let verifier = verifier();
        let signature = verifier.sign("1531420618", BODY).expect("sign");
        let tampered = b"token=xyzz0WbapA4vBCDEFasx0q6G&team_id=T1DC2JH3J&command=%2Fscore&text=foo--";
        assert_eq!(
            verifier.verify(Some("1531420618"), Some(&signature), tampered, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let other = SignatureVerifier::new(SecretString::from("another-secret".to_string()), 300)
            .expect("verifier");
        let signature = other.sign("1531420618", BODY).expect("sign");
        assert_eq!(
            verifier().verify(Some("1531420618"), Some(&signature), BODY, NOW),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_missing_headers() {
        let verifier = verifier();
        let signature = verifier.sign("1531420618", BODY).expect("sign");
        assert_eq!(
            verifier.verify(None, Some(&signature), BODY, NOW),
            Err(SignatureError::MissingHeader(TIMESTAMP_HEADER))
        );
        assert_eq!(
            verifier.verify(Some("1531420618"), None, BODY, NOW),
            Err(SignatureError::MissingHeader(SIGNATURE_HEADER))
        );
    }

    #[test]
    fn rejects_malformed_signature_and_timestamp() {
        let verifier = verifier();
        assert_eq!(
            verifier.verify(Some("1531420618"), Some("a2114d57b48eac39"), BODY, NOW),
            Err(SignatureError::MalformedSignature)
        );
        assert_eq!(
            verifier.verify(Some("1531420618"), Some("v0=zz"), BODY, NOW),
            Err(SignatureError::MalformedSignature)
        );
        assert!(matches!(
            verifier.verify(Some("yesterday"), Some("v0=00"), BODY, NOW),
            Err(SignatureError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn rejects_replayed_timestamps_in_both_directions() {
        let verifier = verifier();
        let old = (NOW - 301).to_string();
        let signature = verifier.sign(&old, BODY).expect("sign");
        assert_eq!(
            verifier.verify(Some(&old), Some(&signature), BODY, NOW),
            Err(SignatureError::StaleTimestamp { skew_secs: 301 })
        );

        let future = (NOW + 600).to_string();
        let signature = verifier.sign(&future, BODY).expect("sign");
        assert_eq!(
            verifier.verify(Some(&future), Some(&signature), BODY, NOW),
            Err(SignatureError::StaleTimestamp { skew_secs: 600 })
        );

        let edge = (NOW - 300).to_string();
        let signature = verifier.sign(&edge, BODY).expect("sign");
        assert_eq!(verifier.verify(Some(&edge), Some(&signature), BODY, NOW), Ok(()));
    }

    #[test]
    fn empty_secret_is_a_setup_failure() {
        let error = SignatureVerifier::new(SecretString::from(String::new()), 300)
            .expect_err("empty secret must be rejected");
        assert_eq!(error, SignatureError::MissingSecret);
        assert!(error.is_setup_failure());
        assert!(!SignatureError::Mismatch.is_setup_failure());
    }

    #[test]
    fn hex_decoding_rejects_odd_lengths() {
        assert_eq!(decode_hex("0aFf"), Some(vec![0x0a, 0xff]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex(""), None);
    }
}
