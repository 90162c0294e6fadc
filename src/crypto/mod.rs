//! Cryptographic primitives for EggCarton.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Zeroize-on-drop key types and HKDF wrapping-key derivation (`keys`)

pub mod encryption;
pub mod keys;

pub use encryption::{decrypt, encrypt, NONCE_LEN, TAG_LEN};
pub use keys::{DataKey, MasterKey, KEY_LEN};
