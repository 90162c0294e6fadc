//! Vault module: authorization-gated envelope encryption.
//!
//! This module provides:
//! - The typed caller `Identity` (`identity`)
//! - `VaultService`, which implements put/get/get-all/delete (`service`)

pub mod identity;
pub mod service;

pub use identity::Identity;
pub use service::{PutReceipt, RevealedSecret, VaultService};
