//! Symmetric encryption of the identity binding carried in access tokens.
//!
//! The key is derived from the encryption secret with SHA-256 and must be
//! distinct from the signing secret. Output is
//! `base64(nonce(12) || ciphertext || tag)`.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use tenantgate_core::UserId;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("secret is not valid base64")]
    Encoding,

    #[error("secret is too short to hold a nonce")]
    Truncated,

    #[error("secret failed authentication")]
    Decrypt,

    #[error("decrypted secret is not a user id")]
    Plaintext,

    #[error("encryption failed")]
    Encrypt,
}

/// AES-256-GCM cipher for the `secret` claim.
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    pub fn new(secret: &str) -> Self {
        let mut key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new(&key);
        key.as_mut_slice().fill(0);
        Self { cipher }
    }

    pub fn encrypt_str(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    pub fn decrypt_str(&self, encoded: &str) -> Result<String, CipherError> {
        let blob = STANDARD.decode(encoded).map_err(|_| CipherError::Encoding)?;
        if blob.len() <= NONCE_LEN {
            return Err(CipherError::Truncated);
        }
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Plaintext)
    }

    /// Encrypt the decimal string form of a user id.
    pub fn seal_user_id(&self, user_id: UserId) -> Result<String, CipherError> {
        self.encrypt_str(&user_id.to_string())
    }

    pub fn open_user_id(&self, encoded: &str) -> Result<UserId, CipherError> {
        self.decrypt_str(encoded)?
            .parse::<UserId>()
            .map_err(|_| CipherError::Plaintext)
    }
}

impl core::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecretCipher").finish_non_exhaustive()
    }
}
