use breachtree::{sha1_from_hex, Sha1 as Digest20};
use sha1::{Digest, Sha1};

use crate::error::Error;

/// SHA-1 digest of a password's UTF-8 bytes.
pub fn password_digest(password: &str) -> Digest20 {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// Resolve the digest to look up from the mutually exclusive CLI inputs:
/// a hex digest given directly, or a password to hash first.
pub fn resolve_digest(hash: Option<&str>, password: Option<&str>) -> Result<Digest20, Error> {
    match (hash, password) {
        (Some(hash), None) => sha1_from_hex(hash.as_bytes()).ok_or(Error::InvalidHash),
        (None, Some(password)) => Ok(password_digest(password)),
        _ => Err(Error::InvalidArgs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // SHA1 of "password123"
    const PASSWORD123_HEX: &str = "CBFDAC6008F9CAB4083784CBD1874F76618D2A97";

    #[test]
    fn test_password_digest() {
        let digest = password_digest("password123");
        assert_eq!(digest[0], 0xCB);
        assert_eq!(digest[1], 0xFD);
        assert_eq!(digest[19], 0x97);
    }

    #[test]
    fn test_resolve_from_hash() {
        let digest = resolve_digest(Some(PASSWORD123_HEX), None).unwrap();
        assert_eq!(digest, password_digest("password123"));

        let lower = resolve_digest(Some(PASSWORD123_HEX.to_lowercase().as_str()), None).unwrap();
        assert_eq!(lower, digest);
    }

    #[test]
    fn test_resolve_from_password() {
        let digest = resolve_digest(None, Some("password123")).unwrap();
        assert_eq!(digest, password_digest("password123"));
    }

    #[test]
    fn test_invalid_hash_is_rejected() {
        assert!(matches!(
            resolve_digest(Some("CBFD"), None),
            Err(Error::InvalidHash)
        ));
        assert!(matches!(
            resolve_digest(Some("not-a-40-character-hex-sha1-digest-here"), None),
            Err(Error::InvalidHash)
        ));
    }

    #[test]
    fn test_exactly_one_input_is_required() {
        assert!(matches!(resolve_digest(None, None), Err(Error::InvalidArgs)));
        assert!(matches!(
            resolve_digest(Some(PASSWORD123_HEX), Some("password123")),
            Err(Error::InvalidArgs)
        ));
    }
}
