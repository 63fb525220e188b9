pub mod service;

pub use service::negotiate;
