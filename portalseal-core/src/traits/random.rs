use crate::error::SealError;

pub trait SecureRandom: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), SealError>;

    fn random_bytes(&self, len: usize) -> Result<Vec<u8>, SealError> {
        let mut buf = vec![0u8; len];
        self.fill_bytes(&mut buf)?;
        Ok(buf)
    }
}
