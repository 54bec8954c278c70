use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use crate::error::HorcruxError;

/// AES-256 key length in bytes.
pub const KEY_SIZE: usize = 32;
/// AES-GCM nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// Generate a fresh random 256-bit encryption key from the OS.
pub fn generate_key() -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    key
}

/// Encrypt data with AES-256-GCM under a fresh random nonce.
///
/// Returns the nonce and the ciphertext with the 16-byte authentication tag
/// appended. The nonce is never reused: every call draws a new one from the
/// OS, and every split generates a new key anyway.
pub fn encrypt(
    plaintext: &[u8],
    key: &[u8; KEY_SIZE],
) -> Result<([u8; NONCE_SIZE], Vec<u8>), HorcruxError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| HorcruxError::Cipher(format!("failed to create cipher: {e}")))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| HorcruxError::Cipher(format!("encryption failed: {e}")))?;

    Ok((nonce_bytes, ciphertext))
}

/// Decrypt AES-256-GCM ciphertext, verifying the authentication tag.
///
/// A tag mismatch maps to [`HorcruxError::AuthenticationFailure`]: with the
/// metadata already validated upstream, a bad tag means the key was
/// reconstructed from wrong or too few shares.
pub fn decrypt(
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
    key: &[u8; KEY_SIZE],
) -> Result<Vec<u8>, HorcruxError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| HorcruxError::Cipher(format!("failed to create cipher: {e}")))?;

    let nonce = Nonce::from_slice(nonce);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| HorcruxError::AuthenticationFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let data = b"test data for encryption";
        let key = generate_key();

        let (nonce, ciphertext) = encrypt(data, &key).unwrap();
        assert_eq!(ciphertext.len(), data.len() + 16); // GCM tag appended

        let decrypted = decrypt(&nonce, &ciphertext, &key).unwrap();
        assert_eq!(data, decrypted.as_slice());
    }

    #[test]
    fn test_wrong_key() {
        let data = b"test data for encryption";
        let key = generate_key();
        let wrong_key = generate_key();

        let (nonce, ciphertext) = encrypt(data, &key).unwrap();
        let result = decrypt(&nonce, &ciphertext, &wrong_key);

        assert!(matches!(result, Err(HorcruxError::AuthenticationFailure)));
    }

    #[test]
    fn test_tampered_ciphertext() {
        let data = b"tamper with me";
        let key = generate_key();

        let (nonce, mut ciphertext) = encrypt(data, &key).unwrap();
        ciphertext[0] ^= 0x01;

        let result = decrypt(&nonce, &ciphertext, &key);
        assert!(matches!(result, Err(HorcruxError::AuthenticationFailure)));
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let data = b"same plaintext";
        let key = generate_key();

        let (nonce1, ct1) = encrypt(data, &key).unwrap();
        let (nonce2, ct2) = encrypt(data, &key).unwrap();

        assert_ne!(nonce1, nonce2);
        assert_ne!(ct1, ct2);
    }
}
