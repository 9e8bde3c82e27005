//! API credential newtype.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// An opaque API secret.
///
/// `Debug` and `Display` never print the secret itself, only a short
/// non-reversible marker, so credentials can be logged by accident safely.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

const FINGERPRINT_BYTES: usize = 4;

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short digest prefix, enough to tell credentials apart in logs without
    /// revealing any character of the secret.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let hex: String =
            digest.iter().take(FINGERPRINT_BYTES).map(|b| format!("{:02x}", b)).collect();
        format!("key#{}", hex)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.fingerprint()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}
