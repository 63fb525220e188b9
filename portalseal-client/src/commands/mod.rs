pub mod get;
pub mod negotiate;
