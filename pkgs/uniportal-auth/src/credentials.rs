//! Password verifiers and one-time tokens
//!
//! Passwords are never stored. Each account keeps a random salt and the
//! HKDF-HMAC-SHA256 output keyed by the password, both hex encoded.

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{AuthError, Result};

const SALT_LEN: usize = 16;
const DIGEST_LEN: usize = 32;
const TOKEN_LEN: usize = 24;
const PASSWORD_INFO: &[u8] = b"uniportal-password";

/// Salted password verifier for storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordVerifier {
    pub salt: String,
    pub digest: String,
}

/// Derive a fresh verifier for `password` with a random salt
pub fn hash_password(password: &str) -> Result<PasswordVerifier> {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = derive_digest(password, &salt)?;

    Ok(PasswordVerifier {
        salt: hex::encode(salt),
        digest: hex::encode(digest),
    })
}

/// Check `password` against a stored verifier
pub fn verify_password(password: &str, verifier: &PasswordVerifier) -> Result<bool> {
    let salt = hex::decode(&verifier.salt)
        .map_err(|e| AuthError::Corrupted(format!("salt: {}", e)))?;
    let expected = hex::decode(&verifier.digest)
        .map_err(|e| AuthError::Corrupted(format!("digest: {}", e)))?;

    let actual = derive_digest(password, &salt)?;

    Ok(constant_time_eq(&actual, &expected))
}

/// Random URL-safe token for email verification and password reset
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn derive_digest(password: &str, salt: &[u8]) -> Result<[u8; DIGEST_LEN]> {
    let hk = Hkdf::<Sha256>::new(Some(salt), password.as_bytes());
    let mut out = [0u8; DIGEST_LEN];
    hk.expand(PASSWORD_INFO, &mut out)
        .map_err(|_| AuthError::KeyDerivation)?;
    Ok(out)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let verifier = hash_password("secure_password_123").expect("hash failed");

        assert_eq!(verifier.salt.len(), SALT_LEN * 2);
        assert_eq!(verifier.digest.len(), DIGEST_LEN * 2);
        assert!(verify_password("secure_password_123", &verifier).unwrap());
    }

    #[test]
    fn test_wrong_password() {
        let verifier = hash_password("secure_password_123").expect("hash failed");

        assert!(!verify_password("wrong_password", &verifier).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();

        assert_ne!(a.salt, b.salt);
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn test_corrupted_verifier() {
        let verifier = PasswordVerifier {
            salt: "not-hex".to_string(),
            digest: "00".to_string(),
        };

        assert!(matches!(
            verify_password("anything", &verifier),
            Err(AuthError::Corrupted(_))
        ));
    }

    #[test]
    fn test_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LEN * 2);
        assert_ne!(token, generate_token());
    }
}
