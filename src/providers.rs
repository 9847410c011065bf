pub mod auth;
pub mod base;
pub mod retry;
pub mod sequence;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod mock;
