//! # roast-core
//!
//! Threshold Schnorr signing over secp256k1, producing plain BIP-340
//! signatures: any T of N committee members can cooperate to sign, and the
//! result verifies under the group's x-only public key like any single-party
//! Schnorr signature.
//!
//! Two layers make that work:
//!
//! - [`frost`]: the two-round FROST signing core — nonce commitments,
//!   binding factors, signature shares, aggregation;
//! - [`roast`]: the ROAST orchestration loop around it, which tolerates up
//!   to N-T unresponsive or actively malicious members by verifying every
//!   share, quarantining misbehaviour, and retrying sessions until an
//!   aggregate passes verification.
//!
//! Key material (secret shares, the group key, per-member public shares) is
//! provisioned externally, normally by a DKG; [`dealer`] generates it
//! locally for tests and demos.
//!
//! ## Example
//!
//! ```rust,ignore
//! use roast_core::{dealer, roast, Bip340Ciphersuite};
//!
//! let (group, key_shares) = dealer::generate_group(5, 3)?;
//! let signature = roast::run_signing(
//!     Bip340Ciphersuite,
//!     &group,
//!     key_shares,
//!     b"message",
//!     &Default::default(),
//! )
//! .await?;
//! ```

pub mod ciphersuite;
pub mod curve;
pub mod dealer;
pub mod error;
pub mod frost;
pub mod roast;
pub mod types;

pub use ciphersuite::{Bip340Ciphersuite, Ciphersuite};
pub use error::{CommitmentError, CommitmentListError, Error, Result, VerifyError};
pub use types::{GroupInfo, KeyShare, SessionId, Signature, SignerIndex};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
