//! Per-installation device identity.
//!
//! The device id seeds credential selection; the device secret keys the
//! anonymizer digests so tokens cannot be correlated across installations.
//! Both are generated on first use and persisted.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::{get_json, set_json, SecureStore};

const DEVICE_KEY: &str = "analysis.device_identity";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub device_secret: String,
}

impl DeviceIdentity {
    pub fn generate() -> Self {
        Self { device_id: Uuid::new_v4().to_string(), device_secret: random_hex(64) }
    }

    /// Loads the persisted identity or creates and stores a new one.
    ///
    /// If the store cannot be read or written, a process-lifetime identity is
    /// returned; credential selection and anonymization keep working but will
    /// not be stable across restarts.
    pub fn load_or_create(store: &dyn SecureStore) -> Self {
        match get_json::<DeviceIdentity>(store, DEVICE_KEY) {
            Ok(Some(identity)) => return identity,
            Ok(None) => {},
            Err(e) => {
                tracing::warn!("Device identity unreadable ({}), generating a new one", e);
            },
        }

        let identity = Self::generate();
        if let Err(e) = set_json(store, DEVICE_KEY, &identity) {
            tracing::warn!("Could not persist device identity: {}", e);
        } else {
            tracing::info!("Generated new device identity");
        }
        identity
    }
}

/// Generates a random hex string of the specified length.
fn random_hex(length: usize) -> String {
    const HEX_CHARS: &[u8] = b"0123456789abcdef";
    let mut rng = rand::thread_rng();
    (0..length).map(|_| HEX_CHARS[rng.gen_range(0..16)] as char).collect()
}
