pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod kms;
pub mod logging;
pub mod store;
pub mod vault;
