//! Per-installation credential selection.
//!
//! One credential out of a fixed, ordered list is picked deterministically
//! from the device id (`hash(device_id) mod N`) and persisted. `reset` rotates
//! to the next credential in the list so a rejected key is not reused.

use nestling_types::{ConfigError, Credential};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::modules::store::{get_json, set_json, SecureStore};

const SELECTION_KEY: &str = "analysis.credential_selection";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct Selection {
    index: usize,
    rotation: u32,
    /// Guards against the credential list changing between builds
    digest: u64,
}

pub struct CredentialSelector {
    credentials: Vec<Credential>,
    device_id: String,
    store: Arc<dyn SecureStore>,
    selection: Mutex<Option<Selection>>,
}

impl CredentialSelector {
    pub fn new(
        credentials: Vec<Credential>,
        device_id: impl Into<String>,
        store: Arc<dyn SecureStore>,
    ) -> Result<Self, ConfigError> {
        if credentials.is_empty() {
            return Err(ConfigError::ValidationError {
                field: "credentials".to_string(),
                message: "at least one credential is required".to_string(),
            });
        }
        Ok(Self { credentials, device_id: device_id.into(), store, selection: Mutex::new(None) })
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// The credential for this installation. Idempotent across calls and,
    /// when the store works, across restarts.
    pub fn current(&self) -> Credential {
        let mut guard = self.selection.lock();
        if let Some(selection) = *guard {
            return self.credentials[selection.index].clone();
        }

        let selection = self.load_persisted().unwrap_or_else(|| {
            let selection = self.derive(0);
            self.persist(&selection);
            selection
        });
        *guard = Some(selection);
        self.credentials[selection.index].clone()
    }

    /// Drops the current selection and moves to the slot after the one in
    /// use, so the credential just rejected is never handed back.
    ///
    /// With a single credential the selection stays unchanged.
    pub fn reset(&self) -> Credential {
        let mut guard = self.selection.lock();
        let previous =
            (*guard).or_else(|| self.load_persisted()).unwrap_or_else(|| self.derive(0));

        if let Err(e) = self.store.delete(SELECTION_KEY) {
            tracing::warn!("Could not clear persisted credential selection: {}", e);
        }

        let selection = self.select(
            (previous.index + 1) % self.credentials.len(),
            previous.rotation.wrapping_add(1),
        );
        self.persist(&selection);
        *guard = Some(selection);

        let credential = self.credentials[selection.index].clone();
        tracing::info!(
            "Credential rotated to slot {}/{} ({})",
            selection.index + 1,
            self.credentials.len(),
            credential
        );
        credential
    }

    /// Initial slot for this device: `hash(device_id) mod N`.
    fn derive(&self, rotation: u32) -> Selection {
        let n = self.credentials.len();
        let base = (device_hash(&self.device_id) % n as u64) as usize;
        self.select((base + rotation as usize % n) % n, rotation)
    }

    fn select(&self, index: usize, rotation: u32) -> Selection {
        Selection { index, rotation, digest: credential_digest(&self.credentials[index]) }
    }

    fn load_persisted(&self) -> Option<Selection> {
        let persisted = match get_json::<Selection>(self.store.as_ref(), SELECTION_KEY) {
            Ok(value) => value?,
            Err(e) => {
                tracing::warn!("Credential selection unreadable, re-deriving: {}", e);
                return None;
            },
        };

        if self
            .credentials
            .get(persisted.index)
            .is_some_and(|c| credential_digest(c) == persisted.digest)
        {
            return Some(persisted);
        }

        // The list changed: follow the credential if it still exists.
        let moved = self.credentials.iter().position(|c| credential_digest(c) == persisted.digest);
        match moved {
            Some(index) => {
                let selection = Selection { index, ..persisted };
                self.persist(&selection);
                Some(selection)
            },
            None => {
                tracing::warn!("Persisted credential no longer provisioned, re-deriving");
                None
            },
        }
    }

    fn persist(&self, selection: &Selection) {
        if let Err(e) = set_json(self.store.as_ref(), SELECTION_KEY, selection) {
            tracing::warn!("Credential selection not persisted (degraded mode): {}", e);
        }
    }
}

fn device_hash(device_id: &str) -> u64 {
    let digest = Sha256::digest(device_id.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

fn credential_digest(credential: &Credential) -> u64 {
    device_hash(credential.expose())
}
