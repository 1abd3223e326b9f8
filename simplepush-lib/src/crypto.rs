//! Legacy payload encryption.
//!
//! Titles and messages of an encrypted send are protected with AES-128-CBC
//! under a key derived from the user's password. The scheme matches what the
//! Simplepush apps decrypt, so none of its parameters may change.
//!
//! # Scheme
//!
//! - **Key**: first 16 bytes of `SHA1(utf8(password || salt))`
//! - **IV**: 16 random bytes, one per request, sent as uppercase hex
//! - **Padding**: PKCS#7 to the 16-byte block size
//! - **Encoding**: URL-safe base64 with `=` padding retained
//!
//! This protects message content from passive inspection only. It is not an
//! authenticated scheme and should not be reused for anything else.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::URL_SAFE as BASE64URL, Engine};
use rand::RngCore;
use sha1::{Digest, Sha1};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::LEGACY_SALT;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Size of the derived key in bytes (AES-128).
pub const KEY_SIZE: usize = 16;

/// Size of the initialization vector in bytes (one AES block).
pub const IV_SIZE: usize = 16;

/// Encryption error types.
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),
    #[error("invalid initialization vector: {0}")]
    InvalidIv(String),
    #[error("decryption failed: {0}")]
    DecryptFailed(String),
}

/// Result type for encryption operations.
pub type EncryptionResult<T> = Result<T, EncryptionError>;

/// A derived 128-bit payload key.
///
/// Cleared from memory on drop; `Debug` never prints the key bytes.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Derive the payload key from `password` and `salt`.
///
/// A missing or empty salt falls back to [`LEGACY_SALT`].
pub fn derive_key(password: &str, salt: Option<&str>) -> EncryptionKey {
    let salt = salt.filter(|s| !s.is_empty()).unwrap_or(LEGACY_SALT);

    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    let digest = hasher.finalize();

    // The first 32 hex digits of the digest are its first 16 bytes.
    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&digest[..KEY_SIZE]);
    EncryptionKey(key)
}

/// Generate a fresh random initialization vector.
///
/// Uses the thread-local CSPRNG, which is seeded from the OS.
pub fn generate_iv() -> [u8; IV_SIZE] {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

/// Uppercase hex form of `iv`, as sent in the `iv` payload field.
pub fn iv_to_hex(iv: &[u8; IV_SIZE]) -> String {
    hex::encode_upper(iv)
}

/// Parse the hex form produced by [`iv_to_hex`] (either case).
pub fn iv_from_hex(value: &str) -> EncryptionResult<[u8; IV_SIZE]> {
    let bytes = hex::decode(value).map_err(|e| EncryptionError::InvalidIv(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| {
            EncryptionError::InvalidIv(format!("expected {} bytes, got {}", IV_SIZE, bytes.len()))
        })
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// Returns URL-safe base64 of the ciphertext.
pub fn encrypt(key: &EncryptionKey, iv: &[u8; IV_SIZE], plaintext: &str) -> String {
    let cipher = Aes128CbcEnc::new(key.as_bytes().into(), iv.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    BASE64URL.encode(ciphertext)
}

/// Decrypt a field produced by [`encrypt`].
///
/// # Errors
///
/// Fails if the input is not valid base64, is not block aligned, has bad
/// padding (usually a wrong key or IV), or is not UTF-8 once decrypted.
pub fn decrypt(key: &EncryptionKey, iv: &[u8; IV_SIZE], ciphertext: &str) -> EncryptionResult<String> {
    let bytes = BASE64URL
        .decode(ciphertext)
        .map_err(|e| EncryptionError::InvalidCiphertext(e.to_string()))?;

    if bytes.is_empty() || bytes.len() % IV_SIZE != 0 {
        return Err(EncryptionError::InvalidCiphertext(format!(
            "length {} is not a positive multiple of {}",
            bytes.len(),
            IV_SIZE
        )));
    }

    let cipher = Aes128CbcDec::new(key.as_bytes().into(), iv.into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&bytes)
        .map_err(|e| EncryptionError::DecryptFailed(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| EncryptionError::DecryptFailed(e.to_string()))
}
