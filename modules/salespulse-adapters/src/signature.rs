use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex HMAC-SHA256 signature. Accepts either hex case and an
/// optional `sha256=` prefix. The digest comparison is constant-time.
pub fn verify_hex_signature(secret: &str, body: &[u8], provided: &str) -> bool {
    let provided = provided.trim();
    let provided = match provided.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("sha256=") => &provided[7..],
        _ => provided,
    };

    let Ok(expected) = hex::decode(provided) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Verify the signature carried in `header`. A missing or non-UTF-8 header fails.
pub fn verify_header(headers: &HeaderMap, header: &str, secret: &str, body: &[u8]) -> bool {
    headers
        .get(header)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|sig| verify_hex_signature(secret, body, sig))
}

/// Constant-time comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    const BODY: &[u8] = br#"{"event":"sale_approved"}"#;

    #[test]
    fn accepts_own_signature() {
        let sig = sign("s3cret", BODY);
        assert!(verify_hex_signature("s3cret", BODY, &sig));
    }

    #[test]
    fn accepts_uppercase_and_prefixed_signatures() {
        let sig = sign("s3cret", BODY);
        assert!(verify_hex_signature("s3cret", BODY, &sig.to_uppercase()));
        assert!(verify_hex_signature("s3cret", BODY, &format!("sha256={sig}")));
        assert!(verify_hex_signature("s3cret", BODY, &format!("SHA256={sig}")));
    }

    #[test]
    fn rejects_wrong_secret_or_tampered_body() {
        let sig = sign("s3cret", BODY);
        assert!(!verify_hex_signature("other", BODY, &sig));
        assert!(!verify_hex_signature("s3cret", br#"{"event":"refund"}"#, &sig));
    }

    #[test]
    fn rejects_garbage() {
        assert!(!verify_hex_signature("s3cret", BODY, ""));
        assert!(!verify_hex_signature("s3cret", BODY, "not-hex"));
        assert!(!verify_hex_signature("s3cret", BODY, "abcd"));
    }

    #[test]
    fn header_must_be_present() {
        let mut headers = HeaderMap::new();
        assert!(!verify_header(&headers, "x-braip-signature", "s3cret", BODY));

        headers.insert(
            "x-braip-signature",
            HeaderValue::from_str(&sign("s3cret", BODY)).unwrap(),
        );
        assert!(verify_header(&headers, "X-Braip-Signature", "s3cret", BODY));
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
    }
}
