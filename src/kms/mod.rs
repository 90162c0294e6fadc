//! Key-wrapping client.
//!
//! The vault never sees the master key.  It asks a [`KeyWrapper`] for a
//! fresh data key (plaintext + wrapped form) on write, and hands the
//! wrapped form back to be unwrapped on read.  The managed service behind
//! the trait is treated as a trusted oracle.
//!
//! - `LocalKms` wraps data keys under a master keyfile on disk (`local`)

pub mod local;

pub use local::LocalKms;

use crate::crypto::DataKey;
use crate::errors::Result;

/// Key spec requested for every data key.
pub const DATA_KEY_SPEC: &str = "AES_256";

/// A freshly generated data key in both of its forms.
///
/// `plaintext` is used once to encrypt a secret and then dropped;
/// `wrapped` is what gets persisted.
pub struct GeneratedDataKey {
    pub plaintext: DataKey,
    pub wrapped: Vec<u8>,
}

/// Interface to a master-key service that wraps and unwraps data keys.
///
/// Implementations report every failure (unavailable service, denied
/// permission, invalid blob) as `CartonError::KeyService`.
pub trait KeyWrapper {
    /// Identifier of the master key data keys are wrapped under.
    fn key_id(&self) -> &str;

    /// Generate a new 256-bit data key and its wrapped form.
    fn generate_data_key(&self) -> Result<GeneratedDataKey>;

    /// Recover the plaintext data key from its wrapped form.
    fn unwrap_data_key(&self, wrapped: &[u8]) -> Result<DataKey>;
}

impl<T: KeyWrapper + ?Sized> KeyWrapper for &T {
    fn key_id(&self) -> &str {
        (**self).key_id()
    }

    fn generate_data_key(&self) -> Result<GeneratedDataKey> {
        (**self).generate_data_key()
    }

    fn unwrap_data_key(&self, wrapped: &[u8]) -> Result<DataKey> {
        (**self).unwrap_data_key(wrapped)
    }
}
