// ABOUTME: Constant-time secret comparison and the stateless setup session marker.
// ABOUTME: Markers are an HMAC of the setup secret under a per-process random key; nothing is stored.

use std::fmt;

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the HMAC output for the cookie value.
pub const SESSION_MARKER_LEN: usize = 32;

/// Compare a caller-supplied secret with the server-held one.
///
/// Both sides are hashed first so the comparison always runs over 32 bytes,
/// independent of input lengths and of where they first differ.
pub fn secrets_match(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    supplied.as_slice().ct_eq(expected.as_slice()).into()
}

/// Key used to derive session markers from the setup secret.
#[derive(Clone)]
pub struct SessionKey {
    key: [u8; 32],
}

impl SessionKey {
    /// Fresh random key. Markers issued under a previous key stop verifying.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Deterministic, non-reversible marker for `secret` under this key.
    pub fn marker(&self, secret: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(secret.as_bytes());
        let mut encoded = hex::encode(mac.finalize().into_bytes());
        encoded.truncate(SESSION_MARKER_LEN);
        encoded
    }

    /// Does `candidate` equal the marker for `secret`?
    pub fn verify(&self, secret: &str, candidate: &str) -> bool {
        let expected = self.marker(secret);
        expected.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}
