//! Block producer identity and block signatures.
//!
//! A producer signs `(index, previous_hash, merkle_root, timestamp)` of every
//! block it builds. Two schemes exist:
//!
//! - [`SignatureScheme::Ed25519`]: the producer id is the hex public key and
//!   anyone can verify the signature from the block alone.
//! - [`SignatureScheme::Keyed`]: HMAC-SHA256 keyed by the producer id string.
//!   This only proves the signer knew the id, so it is for closed test setups.

use std::fmt;

use sdupi_types::{KeyPair, PublicKey, Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::{generate_keypair, keypair_from_seed};
use crate::sign::{keyed_mac, sign_message, verify_keyed_mac, verify_signature};

/// Which signature scheme a producer uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureScheme {
    #[default]
    Ed25519,
    Keyed,
}

/// Signature carried by a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockSignature {
    /// Genesis carries no signature.
    Unsigned,
    Keyed([u8; 32]),
    Ed25519(Signature),
}

impl BlockSignature {
    /// Check this signature over `message` for the given producer id.
    pub fn verify(&self, producer: &str, message: &[u8]) -> bool {
        match self {
            Self::Unsigned => false,
            Self::Keyed(tag) => verify_keyed_mac(producer.as_bytes(), message, tag),
            Self::Ed25519(sig) => match PublicKey::from_hex(producer) {
                Some(pk) => verify_signature(message, sig, &pk),
                None => false,
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("producer id must not be empty")]
    EmptyId,

    #[error("invalid producer seed: {0}")]
    InvalidSeed(String),
}

/// The identity a node signs its blocks with.
pub enum ProducerIdentity {
    Keyed { id: String },
    Ed25519 { id: String, keypair: KeyPair },
}

impl ProducerIdentity {
    pub fn keyed(id: impl Into<String>) -> Result<Self, ProducerError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ProducerError::EmptyId);
        }
        Ok(Self::Keyed { id })
    }

    pub fn ed25519(keypair: KeyPair) -> Self {
        Self::Ed25519 {
            id: keypair.public.to_hex(),
            keypair,
        }
    }

    /// Build the identity from configuration.
    ///
    /// For Ed25519, `seed_hex` (64 hex chars) fixes the key; without one a
    /// fresh random key is generated. For keyed signatures `producer_id` is
    /// the key.
    pub fn from_config(
        scheme: SignatureScheme,
        producer_id: &str,
        seed_hex: Option<&str>,
    ) -> Result<Self, ProducerError> {
        match scheme {
            SignatureScheme::Keyed => Self::keyed(producer_id),
            SignatureScheme::Ed25519 => {
                let keypair = match seed_hex {
                    Some(seed) => keypair_from_seed(&decode_seed(seed)?),
                    None => generate_keypair(),
                };
                Ok(Self::ed25519(keypair))
            }
        }
    }

    /// The producer id recorded in blocks.
    pub fn id(&self) -> &str {
        match self {
            Self::Keyed { id } | Self::Ed25519 { id, .. } => id,
        }
    }

    pub fn scheme(&self) -> SignatureScheme {
        match self {
            Self::Keyed { .. } => SignatureScheme::Keyed,
            Self::Ed25519 { .. } => SignatureScheme::Ed25519,
        }
    }

    pub fn sign(&self, message: &[u8]) -> BlockSignature {
        match self {
            Self::Keyed { id } => BlockSignature::Keyed(keyed_mac(id.as_bytes(), message)),
            Self::Ed25519 { keypair, .. } => {
                BlockSignature::Ed25519(sign_message(message, &keypair.private))
            }
        }
    }
}

impl fmt::Debug for ProducerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProducerIdentity")
            .field("scheme", &self.scheme())
            .field("id", &self.id())
            .finish()
    }
}

fn decode_seed(seed_hex: &str) -> Result<[u8; 32], ProducerError> {
    let bytes = hex::decode(seed_hex).map_err(|e| ProducerError::InvalidSeed(e.to_string()))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        ProducerError::InvalidSeed(format!("expected 32 bytes, got {}", b.len()))
    })
}
