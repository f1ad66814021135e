//! Merchant signing keys.
//!
//! Keys arrive as hex, either the raw 32-byte ED25519 seed or the same seed
//! behind the standard PKCS#8 DER prefix that wallet tooling exports.

use ed25519_dalek::{Signer, SigningKey};
use std::fmt;
use std::str::FromStr;

const ED25519_DER_PREFIX: &str = "302e020100300506032b657004220420";

#[derive(Clone)]
pub struct MerchantKey {
    key: SigningKey,
}

impl MerchantKey {
    /// Hex-encoded detached signature over `message`.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.key.sign(message).to_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }
}

impl FromStr for MerchantKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches("0x").to_lowercase();
        let raw = trimmed.strip_prefix(ED25519_DER_PREFIX).unwrap_or(&trimmed);

        let bytes = hex::decode(raw)?;
        let seed: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow::anyhow!("expected a 32-byte ED25519 key, got {} bytes", bytes.len()))?;

        Ok(Self {
            key: SigningKey::from_bytes(&seed),
        })
    }
}

impl fmt::Debug for MerchantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerchantKey")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}
