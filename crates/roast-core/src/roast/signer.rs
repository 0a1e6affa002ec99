//! The ROAST signer
//!
//! Wraps a FROST [`Signer`] with the ledger of outstanding nonces. Each nonce
//! is retained under a tag derived from its commitment and the requesting
//! coordinator, so one signer can serve several coordinators and several
//! concurrent sessions without ever crossing nonces. A nonce leaves the
//! ledger at most once.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    ciphersuite::Ciphersuite,
    error::Result,
    frost::{Nonce, NonceCommitment, Signer},
    roast::{
        hash::{commit_list_hash, response_tag},
        messages::{CommitRequest, ShareResponse, SignRequest},
    },
    types::SignerIndex,
};

/// A signing-group member participating in ROAST requests.
pub struct RoastSigner<C: Ciphersuite> {
    signer: Signer<C>,
    /// Outstanding nonces, keyed by response tag
    responses: HashMap<[u8; 32], Nonce>,
}

impl<C: Ciphersuite> RoastSigner<C> {
    pub fn new(signer: Signer<C>) -> Self {
        Self {
            signer,
            responses: HashMap::new(),
        }
    }

    pub fn signer_index(&self) -> SignerIndex {
        self.signer.signer_index()
    }

    /// Nonces retained and not yet spent.
    pub fn outstanding_nonces(&self) -> usize {
        self.responses.len()
    }

    /// Answers a commit request with a fresh round-one commitment, retaining
    /// the nonce behind it for the sign request that may follow.
    pub fn handle_commit_request(&mut self, request: &CommitRequest) -> Result<NonceCommitment> {
        let (nonce, commitment) = self.signer.round1()?;
        let tag = response_tag(&commitment, request.coordinator);
        self.responses.insert(tag, nonce);

        debug!(
            signer_index = self.signer_index(),
            coordinator = request.coordinator,
            "committed"
        );
        Ok(commitment)
    }

    /// Answers a sign request with a signature share and a fresh commitment
    /// for the next session.
    ///
    /// Returns `Ok(None)` when this signer is not named in the request, or
    /// when the named commitment has no retained nonce; a nonce that was
    /// already spent never signs twice. The retained nonce is consumed and
    /// wiped even if share production fails.
    pub fn handle_sign_request(&mut self, request: &SignRequest) -> Result<Option<ShareResponse>> {
        let signer_index = self.signer_index();

        let Some(own_commitment) = request
            .commitments
            .iter()
            .find(|c| c.signer_index == signer_index)
        else {
            debug!(signer_index, "not a participant of the requested session");
            return Ok(None);
        };

        let tag = response_tag(own_commitment, request.coordinator);
        let Some(nonce) = self.responses.remove(&tag) else {
            debug!(
                signer_index,
                "no retained nonce for the named commitment; unknown or already spent"
            );
            return Ok(None);
        };

        let session_id = commit_list_hash(&request.commitments);

        let (fresh_nonce, fresh_commitment) = self.signer.round1()?;
        self.responses
            .insert(response_tag(&fresh_commitment, request.coordinator), fresh_nonce);

        let share = self.signer.round2(
            &request.message,
            nonce,
            &request.commitments.clone().into(),
        )?;

        debug!(signer_index, "produced signature share");
        Ok(Some(ShareResponse {
            signer_index,
            session_id,
            share,
            fresh_commitment,
        }))
    }
}
