//! Authenticated caller identity.
//!
//! Produced by whatever authenticated the request (a verified token's
//! subject, a CLI flag) and passed into every vault call.  The vault
//! never derives or validates it beyond non-emptiness; it only compares.

use std::fmt;

use subtle::ConstantTimeEq;

use crate::errors::{CartonError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(subject: impl Into<String>) -> Result<Self> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(CartonError::Validation(
                "caller identity cannot be empty".into(),
            ));
        }
        Ok(Self(subject))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if this identity is `owner`.
    ///
    /// Constant-time over the bytes so the comparison does not reveal
    /// how much of another user's id matched.
    pub fn owns(&self, owner: &str) -> bool {
        self.0.as_bytes().ct_eq(owner.as_bytes()).into()
    }

    /// Fail with `Forbidden` unless this identity is `owner`.
    pub fn authorize(&self, owner: &str) -> Result<()> {
        if self.owns(owner) {
            Ok(())
        } else {
            Err(CartonError::Forbidden)
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
