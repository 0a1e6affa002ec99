//! Trusted-dealer key generation
//!
//! Samples a group secret, normalizes it so the group public key has an even
//! Y coordinate as BIP-340 requires, and deals Shamir shares over a random
//! polynomial of degree T-1. Production deployments provision key material
//! through a DKG instead; the dealer exists for tests and local runs.

use std::collections::BTreeMap;

use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};
use rand::rngs::OsRng;
use tracing::debug;

use crate::{
    curve::{has_even_y, serialize_point},
    error::{Error, Result},
    types::{GroupInfo, KeyShare, SignerIndex},
};

/// Generates key material for a fresh `threshold`-of-`group_size` group.
pub fn generate_group(group_size: usize, threshold: usize) -> Result<(GroupInfo, Vec<KeyShare>)> {
    if threshold == 0 {
        return Err(Error::InvalidConfiguration(
            "threshold must be at least 1".into(),
        ));
    }
    if threshold > group_size {
        return Err(Error::InvalidConfiguration(format!(
            "threshold [{threshold}] cannot exceed group size [{group_size}]"
        )));
    }

    let mut rng = OsRng;

    let mut secret = Scalar::random(&mut rng);
    let mut public_key = ProjectivePoint::GENERATOR * secret;

    // BIP-340 public keys are x-only with implicit even Y; negating the
    // secret flips the parity without changing X.
    if !has_even_y(&public_key) {
        secret = -secret;
        public_key = ProjectivePoint::GENERATOR * secret;
    }

    // polynomial of degree T-1 with the group secret as constant term
    let mut coefficients = Vec::with_capacity(threshold);
    coefficients.push(secret);
    for _ in 1..threshold {
        coefficients.push(Scalar::random(&mut rng));
    }

    let public_key_bytes = serialize_point(&public_key).to_vec();

    let mut public_shares = BTreeMap::new();
    let mut key_shares = Vec::with_capacity(group_size);
    for member in 1..=group_size {
        let signer_index = member as SignerIndex;
        let secret_share = evaluate_polynomial(&coefficients, signer_index);
        let public_share = ProjectivePoint::GENERATOR * secret_share;

        public_shares.insert(signer_index, serialize_point(&public_share).to_vec());
        key_shares.push(KeyShare {
            signer_index,
            group_size,
            threshold,
            secret_share,
            public_key: public_key_bytes.clone(),
        });
    }

    for coefficient in &mut coefficients {
        *coefficient = Scalar::ZERO;
    }

    debug!(group_size, threshold, "dealt key shares");

    let group = GroupInfo {
        group_size,
        threshold,
        public_key: public_key_bytes,
        public_shares,
    };

    Ok((group, key_shares))
}

/// Evaluates the sharing polynomial at `x` by Horner's rule.
fn evaluate_polynomial(coefficients: &[Scalar], x: SignerIndex) -> Scalar {
    let x = Scalar::from(x);
    coefficients
        .iter()
        .rev()
        .fold(Scalar::ZERO, |acc, coefficient| acc * x + coefficient)
}
