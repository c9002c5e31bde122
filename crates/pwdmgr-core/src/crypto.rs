//! Per-record authenticated encryption.
//!
//! Uses XChaCha20-Poly1305 with a fresh random 24-byte nonce for every call.
//! The key is the SHA-256 digest of the passphrase.
//!
//! Token wire format (URL-safe base64, padded):
//!   [ version (1 byte) | nonce (24 bytes) | ciphertext + tag ]
//!
//! The version byte is also fed in as associated data, so a token cannot be
//! relabelled without failing authentication.

use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{Result, VaultError};

pub const TOKEN_VERSION: u8 = 1;
pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

/// Symmetric key derived from the user's passphrase. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; KEY_LEN]);

impl VaultKey {
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(VaultError::EmptyPassphrase);
        }
        let mut digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&digest);
        digest.as_mut_slice().zeroize();
        Ok(Self(key))
    }

    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new(Key::from_slice(&self.0))
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

/// Encrypt one plaintext into a token. Empty input yields `None`.
pub fn encrypt(key: &VaultKey, plaintext: &str) -> Result<Option<String>> {
    if plaintext.is_empty() {
        return Ok(None);
    }
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let aad = [TOKEN_VERSION];
    let ciphertext = key
        .cipher()
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext.as_bytes(),
                aad: &aad,
            },
        )
        .map_err(|_| VaultError::Encryption)?;

    let mut raw = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
    raw.push(TOKEN_VERSION);
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&ciphertext);
    Ok(Some(general_purpose::URL_SAFE.encode(raw)))
}

/// Decrypt a token produced by [`encrypt`].
///
/// Any damage to the token, including bad base64, a truncated body or an
/// unknown version byte, is reported as [`VaultError::Authentication`].
pub fn decrypt(key: &VaultKey, token: &str) -> Result<Zeroizing<String>> {
    let raw = general_purpose::URL_SAFE
        .decode(token.trim())
        .map_err(|_| VaultError::Authentication)?;
    if raw.len() < 1 + NONCE_LEN + TAG_LEN || raw[0] != TOKEN_VERSION {
        return Err(VaultError::Authentication);
    }
    let (nonce, ciphertext) = raw[1..].split_at(NONCE_LEN);
    let plaintext = key
        .cipher()
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: &raw[..1],
            },
        )
        .map_err(|_| VaultError::Authentication)?;

    String::from_utf8(plaintext)
        .map(Zeroizing::new)
        .map_err(|_| VaultError::Format("decrypted record is not valid UTF-8".into()))
}
