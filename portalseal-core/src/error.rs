use thiserror::Error;

#[derive(Error, Debug)]
pub enum SealError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("Handshake error: {0}")]
    Handshake(#[from] crate::handshake::HandshakeError),

    #[error("Codec error: {0}")]
    Codec(#[from] crate::codec::CodecError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Platform error: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, SealError>;
