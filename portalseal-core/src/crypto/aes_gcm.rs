use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};

use super::{CryptoError, Result};
use crate::constants::{GCM_NONCE_LEN, GCM_TAG_LEN, SESSION_KEY_LEN};

/// Encrypt with AES-256-GCM, returning `(ciphertext, tag)` with the 16-byte tag detached.
pub fn aes256_gcm_encrypt(
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    check_lengths(key, nonce)?;

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CryptoError::AesGcmEncrypt(e.to_string()))?;

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce), aad, &mut buffer)
        .map_err(|e| CryptoError::AesGcmEncrypt(e.to_string()))?;

    Ok((buffer, tag.to_vec()))
}

/// Decrypt AES-256-GCM ciphertext with a detached tag, verifying the tag and AAD.
pub fn aes256_gcm_decrypt(
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    check_lengths(key, nonce)?;
    if tag.len() != GCM_TAG_LEN {
        return Err(CryptoError::AesGcmDecrypt);
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AesGcmDecrypt)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(Nonce::from_slice(nonce), aad, &mut buffer, Tag::from_slice(tag))
        .map_err(|_| CryptoError::AesGcmDecrypt)?;

    Ok(buffer)
}

fn check_lengths(key: &[u8], nonce: &[u8]) -> Result<()> {
    if key.len() != SESSION_KEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: SESSION_KEY_LEN,
            got: key.len(),
        });
    }
    if nonce.len() != GCM_NONCE_LEN {
        return Err(CryptoError::InvalidNonceLength {
            expected: GCM_NONCE_LEN,
            got: nonce.len(),
        });
    }
    Ok(())
}
