use serde::{Deserialize, Serialize};

use crate::constants::ALG_A256GCM;

/// Authenticated-encryption bundle emitted in place of a plaintext body.
///
/// `iv`, `ct` and `tag` are standard base64. `ts` is the producer's clock in
/// unix milliseconds; it is advisory and not part of the authenticated data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedBundle {
    pub kid: String,
    pub alg: String,
    pub iv: String,
    pub ct: String,
    pub tag: String,
    pub ts: u64,
}

impl EncryptedBundle {
    pub fn is_supported_alg(&self) -> bool {
        self.alg == ALG_A256GCM
    }
}
