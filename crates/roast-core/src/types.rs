//! Core types shared across the protocol

use std::collections::BTreeMap;

use k256::{elliptic_curve::Field, ProjectivePoint, Scalar};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{
    curve::{deserialize_point, x_only},
    error::{Error, Result},
};

/// One-based identifier of a signing group member. Zero is reserved.
pub type SignerIndex = u64;

/// Identifier of one in-flight ROAST signing session: the tagged hash of the
/// session's commitment list.
pub type SessionId = [u8; 32];

/// Aggregated Schnorr signature `(R, z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// The group commitment R
    pub r: ProjectivePoint,
    /// The aggregated response scalar z
    pub z: Scalar,
}

impl Signature {
    /// Serializes to the 64-byte BIP-340 wire form: `bytes(R.x) || bytes(z)`.
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&x_only(&self.r));
        bytes[32..].copy_from_slice(&self.z.to_bytes());
        bytes
    }
}

/// Public description of a signing group, as provisioned by key generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Total number of members N
    pub group_size: usize,

    /// Signing threshold T
    pub threshold: usize,

    /// Group public key PK, uncompressed SEC1 bytes; even Y by construction
    pub public_key: Vec<u8>,

    /// Per-member public key shares PK_i = sk_i * G
    pub public_shares: BTreeMap<SignerIndex, Vec<u8>>,
}

impl GroupInfo {
    /// Decodes the group public key.
    pub fn public_key_point(&self) -> Result<ProjectivePoint> {
        deserialize_point(&self.public_key).ok_or(Error::MalformedPoint("group public key"))
    }

    /// Decodes every member's public key share.
    pub fn public_share_points(&self) -> Result<BTreeMap<SignerIndex, ProjectivePoint>> {
        self.public_shares
            .iter()
            .map(|(index, bytes)| {
                let point = deserialize_point(bytes)
                    .ok_or(Error::MalformedPoint("member public key share"))?;
                Ok((*index, point))
            })
            .collect()
    }
}

/// Key material held by one member after key generation.
#[derive(Clone, Serialize, Deserialize)]
pub struct KeyShare {
    /// This member's index, in `[1, N]`
    pub signer_index: SignerIndex,

    /// Total number of members N
    pub group_size: usize,

    /// Signing threshold T
    pub threshold: usize,

    /// This member's secret share sk_i
    #[serde(with = "scalar_serde")]
    pub secret_share: Scalar,

    /// Group public key PK, uncompressed SEC1 bytes
    pub public_key: Vec<u8>,
}

impl KeyShare {
    /// Decodes the group public key.
    pub fn public_key_point(&self) -> Result<ProjectivePoint> {
        deserialize_point(&self.public_key).ok_or(Error::MalformedPoint("group public key"))
    }
}

impl Drop for KeyShare {
    fn drop(&mut self) {
        self.secret_share = Scalar::ZERO;
        self.public_key.zeroize();
    }
}

/// Serde adapter for [`k256::Scalar`], serialized as 32 big-endian bytes and
/// reduced modulo the group order on the way in.
pub(crate) mod scalar_serde {
    use k256::{
        elliptic_curve::{bigint::U256, ops::Reduce},
        Scalar,
    };
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(scalar: &Scalar, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(scalar.to_bytes().as_slice())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Scalar, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bytes: Vec<u8> = Vec::deserialize(deserializer)?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("invalid scalar length"))?;
        Ok(<Scalar as Reduce<U256>>::reduce_bytes(&array.into()))
    }
}

#[cfg(test)]
mod tests {
    use k256::Scalar;

    use super::*;

    #[test]
    fn key_share_survives_json_storage() {
        let share = KeyShare {
            signer_index: 3,
            group_size: 5,
            threshold: 3,
            secret_share: Scalar::from(123456789u64),
            public_key: vec![0x04; 65],
        };

        let json = serde_json::to_string(&share).expect("serializes");
        let restored: KeyShare = serde_json::from_str(&json).expect("deserializes");

        assert_eq!(restored.signer_index, 3);
        assert_eq!(restored.group_size, 5);
        assert_eq!(restored.threshold, 3);
        assert_eq!(restored.secret_share, share.secret_share);
        assert_eq!(restored.public_key, share.public_key);
    }

    #[test]
    fn signature_bytes_layout() {
        let signature = Signature {
            r: ProjectivePoint::GENERATOR,
            z: Scalar::from(2u64),
        };

        let bytes = signature.to_bytes();
        assert_eq!(
            hex::encode(&bytes[..32]),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        );
        assert_eq!(bytes[63], 2);
        assert!(bytes[32..63].iter().all(|b| *b == 0));
    }
}
