//! At-rest encryption for the scoreboard payload. The pinned data message
//! stores `iv:ciphertext` (both base64), AES-256-GCM under a key derived from
//! the configured secret. Decryption failures are reported as absence so the
//! caller can fall through to the legacy plaintext format.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Symmetric cipher sealing the scoreboard data message.
#[derive(Clone)]
pub struct ScoreboardCipher {
    cipher: Aes256Gcm,
}

impl ScoreboardCipher {
    /// Derive the cipher key from the configured secret.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Seal a payload as `iv:ciphertext`.
    pub fn seal(&self, plaintext: &[u8]) -> String {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .expect("AES-GCM encryption of an in-memory buffer cannot fail");
        format!("{}:{}", STANDARD.encode(nonce), STANDARD.encode(ciphertext))
    }

    /// Open an `iv:ciphertext` payload. `None` for anything malformed,
    /// truncated, or keyed differently.
    pub fn open(&self, payload: &str) -> Option<Vec<u8>> {
        let (iv, ciphertext) = payload.trim().split_once(':')?;
        let iv = STANDARD.decode(iv).ok()?;
        if iv.len() != NONCE_LEN {
            return None;
        }
        let ciphertext = STANDARD.decode(ciphertext).ok()?;
        let nonce = Nonce::from_slice(&iv);
        self.cipher.decrypt(nonce, ciphertext.as_ref()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_round_trip() {
        let cipher = ScoreboardCipher::new("a test secret");
        let sealed = cipher.seal(b"{\"scoresByYear\":{}}");
        assert_eq!(cipher.open(&sealed).as_deref(), Some(&b"{\"scoresByYear\":{}}"[..]));
    }

    #[test]
    fn payload_hides_plaintext_and_varies_per_seal() {
        let cipher = ScoreboardCipher::new("a test secret");
        let first = cipher.seal(b"secret scores");
        let second = cipher.seal(b"secret scores");
        assert!(!first.contains("secret"));
        // Fresh nonce every time.
        assert_ne!(first, second);
    }

    #[test]
    fn wrong_key_or_garbage_opens_to_none() {
        let cipher = ScoreboardCipher::new("key one");
        let other = ScoreboardCipher::new("key two");
        let sealed = cipher.seal(b"data");

        assert_eq!(other.open(&sealed), None);
        assert_eq!(cipher.open("no separator here"), None);
        assert_eq!(cipher.open("bm90IGJhc2U2NA==:%%%"), None);
        assert_eq!(cipher.open(":"), None);
        // Valid base64 but truncated nonce.
        assert_eq!(cipher.open("YWJj:YWJjZGVmZ2hpamtsbW5vcA=="), None);
    }
}
