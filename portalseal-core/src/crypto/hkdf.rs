use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{CryptoError, Result};

static ZERO_SALT: [u8; 32] = [0u8; 32];

pub fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
    let salt = if salt.is_empty() { &ZERO_SALT[..] } else { salt };
    let (prk, _) = Hkdf::<Sha256>::extract(Some(salt), ikm);
    Zeroizing::new(prk.to_vec())
}

pub fn hkdf_expand(prk: &[u8], info: &[u8], length: usize) -> Result<Zeroizing<Vec<u8>>> {
    let hkdf = Hkdf::<Sha256>::from_prk(prk)
        .map_err(|e| CryptoError::HkdfDerive(format!("invalid PRK: {e}")))?;

    let mut okm = Zeroizing::new(vec![0u8; length]);
    hkdf.expand(info, &mut okm)
        .map_err(|e| CryptoError::HkdfDerive(format!("expand failed: {e}")))?;

    Ok(okm)
}

pub fn hkdf_extract_and_expand(
    salt: &[u8],
    ikm: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let prk = hkdf_extract(salt, ikm);
    hkdf_expand(&prk, info, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unhex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    // RFC 5869 test case 1.
    #[test]
    fn test_hkdf_rfc5869_case1() {
        let ikm = [0x0b; 22];
        let salt = unhex("000102030405060708090a0b0c");
        let info = unhex("f0f1f2f3f4f5f6f7f8f9");
        let okm = hkdf_extract_and_expand(&salt, &ikm, &info, 42).unwrap();
        assert_eq!(
            okm.as_slice(),
            unhex(
                "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
            )
            .as_slice()
        );
    }

    #[test]
    fn test_hkdf_extract() {
        let prk = hkdf_extract(&[0x0b; 32], &[0x42; 32]);
        assert_eq!(prk.len(), 32);
    }

    #[test]
    fn test_empty_salt_matches_zero_salt() {
        let ikm = [0x42; 32];
        assert_eq!(*hkdf_extract(&[], &ikm), *hkdf_extract(&[0u8; 32], &ikm));
    }

    #[test]
    fn test_hkdf_expand_too_long() {
        let prk = [0x42u8; 32];
        assert!(hkdf_expand(&prk, b"info", 255 * 32 + 1).is_err());
    }
}
