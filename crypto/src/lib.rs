//! Cryptographic primitives for the SDUPI ledger node.
//!
//! - **SHA-256** for transaction hashes, block hashes and Merkle roots
//! - **Ed25519** for producer block signatures
//! - **HMAC-SHA256** keyed signatures for producers identified by a plain string

pub mod hash;
pub mod keys;
pub mod merkle;
pub mod producer;
pub mod sign;

pub use hash::{block_signing_bytes, hash_block_header, sha256, sha256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use merkle::merkle_root;
pub use producer::{BlockSignature, ProducerError, ProducerIdentity, SignatureScheme};
pub use sign::{keyed_mac, sign_message, verify_keyed_mac, verify_signature};
