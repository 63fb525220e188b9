pub mod hkdf;
pub mod aes_gcm;
pub mod ecdh;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("ECDH key generation failed: {0}")]
    EcdhKeyGen(String),
    #[error("Public key encoding failed: {0}")]
    PublicKeyEncoding(String),
    #[error("Invalid public key format")]
    InvalidPublicKey,
    #[error("AES-GCM encryption failed: {0}")]
    AesGcmEncrypt(String),
    #[error("AES-GCM decryption failed")]
    AesGcmDecrypt,
    #[error("HKDF derivation failed: {0}")]
    HkdfDerive(String),
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("Invalid nonce length: expected {expected}, got {got}")]
    InvalidNonceLength { expected: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, CryptoError>;
