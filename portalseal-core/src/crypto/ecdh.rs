use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::{DecodePublicKey, EncodePublicKey};
use p256::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use super::{CryptoError, Result};
use crate::traits::random::SecureRandom;

/// Ephemeral ECDH P-256 key pair. The secret scalar is zeroized on drop.
pub struct P256KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl std::fmt::Debug for P256KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("P256KeyPair")
            .field("public", &self.public_key_sec1())
            .finish_non_exhaustive()
    }
}

impl P256KeyPair {
    /// Generate a new key pair using the provided SecureRandom source.
    pub fn generate(rng: &dyn SecureRandom) -> Result<Self> {
        let mut key_bytes = Zeroizing::new([0u8; 32]);
        rng.fill_bytes(key_bytes.as_mut())
            .map_err(|e| CryptoError::EcdhKeyGen(e.to_string()))?;

        // Zero or out-of-range scalars are rejected rather than reduced.
        let secret = SecretKey::from_bytes((&*key_bytes).into())
            .map_err(|e| CryptoError::EcdhKeyGen(format!("invalid secret key: {e}")))?;
        let public = secret.public_key();

        Ok(Self { secret, public })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// SubjectPublicKeyInfo DER encoding, the form carried on the wire.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        encode_public_key_der(&self.public)
    }

    /// Uncompressed SEC1 point (65 bytes, leading 0x04).
    pub fn public_key_sec1(&self) -> Vec<u8> {
        self.public.to_encoded_point(false).as_bytes().to_vec()
    }

    /// Raw ECDH shared secret (the affine x-coordinate, 32 bytes).
    pub fn shared_secret(&self, peer: &PublicKey) -> Zeroizing<Vec<u8>> {
        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        Zeroizing::new(shared.raw_secret_bytes().to_vec())
    }
}

pub fn encode_public_key_der(public: &PublicKey) -> Result<Vec<u8>> {
    public
        .to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| CryptoError::PublicKeyEncoding(e.to_string()))
}

/// Parse a peer public key from SPKI DER, falling back to a raw SEC1 point.
///
/// Points not on the curve and the identity are rejected.
pub fn parse_public_key(bytes: &[u8]) -> Result<PublicKey> {
    if let Ok(key) = PublicKey::from_public_key_der(bytes) {
        return Ok(key);
    }
    PublicKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)
}
