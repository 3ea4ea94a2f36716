// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! One-shot RSA key ring for credential registration.
//!
//! `issue` generates a key pair, parks the private key in memory under a
//! token, and hands the public key to the client. `take` removes and
//! returns the private key; a token is consumed exactly once, whether the
//! registration that presents it succeeds or fails.

use std::collections::HashMap;
use std::sync::Mutex;

use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::error::ApiError;
use crate::util::gen_uid;
use mci_types::conn::PublicKeyResponse;

/// RSA modulus size for credential envelopes.
const KEY_BITS: usize = 2048;

/// In-memory private key store, mutex-guarded. Keys have no TTL; they are
/// deleted on use.
#[derive(Default)]
pub struct Keyring {
    keys: Mutex<HashMap<String, RsaPrivateKey>>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key pair and return the PEM public key plus its token.
    ///
    /// Key generation is the one CPU-heavy step in the service; it runs on
    /// the blocking pool.
    pub async fn issue(&self) -> Result<PublicKeyResponse, ApiError> {
        let private_key = tokio::task::spawn_blocking(|| {
            let mut rng = rand::rngs::OsRng;
            RsaPrivateKey::new(&mut rng, KEY_BITS)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("key generation task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to generate RSA key: {e}")))?;

        let public_key = RsaPublicKey::from(&private_key)
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| ApiError::Internal(format!("failed to encode public key: {e}")))?;

        let token = gen_uid();
        self.keys
            .lock()
            .expect("keyring mutex poisoned")
            .insert(token.clone(), private_key);

        Ok(PublicKeyResponse {
            public_key_token_id: token,
            public_key,
        })
    }

    /// Remove and return the private key for a token.
    pub fn take(&self, token: &str) -> Option<RsaPrivateKey> {
        self.keys
            .lock()
            .expect("keyring mutex poisoned")
            .remove(token)
    }

    /// Whether a token is currently parked (used by tests).
    pub fn contains(&self, token: &str) -> bool {
        self.keys
            .lock()
            .expect("keyring mutex poisoned")
            .contains_key(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issue_take_is_one_shot() {
        let ring = Keyring::new();
        let issued = ring.issue().await.unwrap();
        assert!(issued.public_key.contains("BEGIN RSA PUBLIC KEY"));
        assert!(ring.contains(&issued.public_key_token_id));

        assert!(ring.take(&issued.public_key_token_id).is_some());
        assert!(!ring.contains(&issued.public_key_token_id));
        assert!(ring.take(&issued.public_key_token_id).is_none());
    }
}
