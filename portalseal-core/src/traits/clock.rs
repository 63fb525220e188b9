use crate::error::SealError;

pub trait Clock: Send + Sync {
    fn now_secs(&self) -> Result<u64, SealError>;
    fn now_millis(&self) -> Result<u64, SealError>;
}
