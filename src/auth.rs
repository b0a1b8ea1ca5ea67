//! Password hashing for the login endpoint
//!
//! The device never sees the plaintext password. It expects
//! `hex(sha256(username + base64(hex(sha256(password))) + param + token))`
//! where `param` and `token` are the CSRF pair in effect for the request.

use crate::models::{Csrf, LoginRequest};
use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derive the `Password` field of a login request
pub fn hash_password(username: &str, password: &str, csrf: &Csrf) -> String {
    let inner = BASE64_STANDARD.encode(sha256_hex(password.as_bytes()));

    let mut salted = String::with_capacity(
        username.len() + inner.len() + csrf.param.len() + csrf.token.len(),
    );
    salted.push_str(username);
    salted.push_str(&inner);
    salted.push_str(&csrf.param);
    salted.push_str(&csrf.token);

    sha256_hex(salted.as_bytes())
}

impl LoginRequest {
    pub fn new(username: &str, password: &str, csrf: &Csrf) -> Self {
        Self {
            username: username.to_string(),
            password: hash_password(username, password, csrf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csrf() -> Csrf {
        Csrf::new("p", "t")
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let a = hash_password("user", "pass", &csrf());
        let b = hash_password("user", "pass", &csrf());
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_every_input_changes_the_hash() {
        let base = hash_password("user", "pass", &csrf());
        assert_ne!(base, hash_password("admin", "pass", &csrf()));
        assert_ne!(base, hash_password("user", "pass2", &csrf()));
        assert_ne!(base, hash_password("user", "pass", &Csrf::new("q", "t")));
        assert_ne!(base, hash_password("user", "pass", &Csrf::new("p", "u")));
    }

    #[test]
    fn test_hash_matches_manual_chain() {
        let h1 = sha256_hex(b"pass");
        let b64 = BASE64_STANDARD.encode(h1.as_bytes());
        let expected = sha256_hex(format!("user{}pt", b64).as_bytes());
        assert_eq!(hash_password("user", "pass", &csrf()), expected);
    }

    #[test]
    fn test_login_request_carries_username() {
        let req = LoginRequest::new("user", "pass", &csrf());
        assert_eq!(req.username, "user");
        assert_eq!(req.password, hash_password("user", "pass", &csrf()));

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["UserName"], "user");
        assert_eq!(json["Password"], req.password.as_str());
    }
}
