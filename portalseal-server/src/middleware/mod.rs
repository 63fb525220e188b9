pub mod encrypt;
pub mod rate_limit;
