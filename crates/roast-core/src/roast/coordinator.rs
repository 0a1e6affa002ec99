//! The ROAST coordinator
//!
//! Keeps a pool of fresh commitments, opens a signing session whenever a
//! threshold of them accumulates, verifies incoming shares individually, and
//! quarantines any signer caught misbehaving. Sessions are independent:
//! losing one to a malicious share or an odd-Y aggregate costs nothing but
//! the retry, and the piggy-backed fresh commitments keep the pool filling
//! until some session verifies.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use k256::{ProjectivePoint, Scalar};
use tracing::{debug, info, warn};

use crate::{
    ciphersuite::Ciphersuite,
    curve::deserialize_point,
    error::{Error, Result},
    frost::{
        validate_commitments, CommitmentList, Coordinator, NonceCommitment, SessionVerifier,
        ValidatedCommitments,
    },
    roast::{
        hash::{commit_list_hash, short_id},
        messages::{CommitRequest, ShareResponse, SignRequest},
    },
    types::{GroupInfo, SessionId, Signature, SignerIndex},
};

/// One in-flight aggregation attempt.
struct SigningSession {
    /// The session's commitment set, in wire form, for aggregation
    list: CommitmentList,
    /// The same set with points decoded
    validated: ValidatedCommitments,
    /// Cached binding factors and challenge
    verifier: SessionVerifier,
    /// Verified shares received so far
    shares: BTreeMap<SignerIndex, Scalar>,
}

/// Coordinator state for a single signing request.
pub struct RoastCoordinator<C: Ciphersuite> {
    suite: C,
    frost: Coordinator<C>,
    coordinator_index: u64,
    message: Vec<u8>,
    group_size: usize,
    threshold: usize,
    public_shares: BTreeMap<SignerIndex, ProjectivePoint>,
    quarantined: BTreeSet<SignerIndex>,
    /// Fresh commitments not yet assigned to a session, ascending by signer
    /// index, at most one per signer
    pending: Vec<NonceCommitment>,
    sessions: HashMap<SessionId, SigningSession>,
}

impl<C: Ciphersuite + Clone> RoastCoordinator<C> {
    pub fn new(
        suite: C,
        group: &GroupInfo,
        coordinator_index: u64,
        message: Vec<u8>,
    ) -> Result<Self> {
        if group.threshold == 0 || group.threshold > group.group_size {
            return Err(Error::InvalidConfiguration(format!(
                "threshold [{}] out of range for group size [{}]",
                group.threshold, group.group_size,
            )));
        }

        let public_key = group.public_key_point()?;
        let public_shares = group.public_share_points()?;

        Ok(Self {
            suite: suite.clone(),
            frost: Coordinator::new(suite, public_key, group.threshold, group.group_size),
            coordinator_index,
            message,
            group_size: group.group_size,
            threshold: group.threshold,
            public_shares,
            quarantined: BTreeSet::new(),
            pending: Vec::new(),
            sessions: HashMap::new(),
        })
    }

    /// The request broadcast to every signer when the signing request opens.
    pub fn commit_request(&self) -> CommitRequest {
        CommitRequest {
            coordinator: self.coordinator_index,
            message: self.message.clone(),
        }
    }

    /// Signers that are neither quarantined nor out of range.
    pub fn live_signers(&self) -> usize {
        self.group_size - self.quarantined.len()
    }

    /// Accepts a fresh commitment into the pending pool.
    ///
    /// Returns a [`SignRequest`] when this commitment completes a threshold
    /// set: the pending pool is snapshotted into a new session and cleared.
    pub fn receive_commit(&mut self, commitment: NonceCommitment) -> Result<Option<SignRequest>> {
        let signer_index = commitment.signer_index;

        if signer_index == 0 || signer_index > self.group_size as u64 {
            warn!(signer_index, "commit from out-of-range signer index");
            return Ok(None);
        }
        if self.quarantined.contains(&signer_index) {
            debug!(signer_index, "ignoring commit from quarantined signer");
            return Ok(None);
        }

        // a commitment that does not even decode can never produce a valid
        // share; quarantine the sender instead of poisoning a session
        if deserialize_point(&commitment.hiding).is_none()
            || deserialize_point(&commitment.binding).is_none()
        {
            warn!(signer_index, "commit with invalid points");
            self.quarantine(signer_index)?;
            return Ok(None);
        }

        match self
            .pending
            .binary_search_by_key(&signer_index, |c| c.signer_index)
        {
            // one outstanding commitment per signer
            Ok(_) => return Ok(None),
            Err(position) => self.pending.insert(position, commitment),
        }
        debug!(signer_index, pending = self.pending.len(), "commit accepted");

        if self.pending.len() < self.threshold {
            return Ok(None);
        }

        let commitments = std::mem::take(&mut self.pending);
        let session_id = commit_list_hash(&commitments);
        let list: CommitmentList = commitments.clone().into();
        let validated = validate_commitments(&list, None)?;
        let verifier = self.frost.session_verifier(&self.message, &validated);

        info!(
            session = %short_id(&session_id),
            participants = ?validated.participants(),
            "opened signing session"
        );

        self.sessions.insert(
            session_id,
            SigningSession {
                list,
                validated,
                verifier,
                shares: BTreeMap::new(),
            },
        );

        Ok(Some(SignRequest {
            coordinator: self.coordinator_index,
            message: self.message.clone(),
            commitments,
        }))
    }

    /// Processes the share part of a signer's response.
    ///
    /// Shares for unknown sessions, or from signers outside the session, are
    /// dropped silently. A share that fails verification quarantines its
    /// sender. When a session reaches the threshold, the shares are
    /// aggregated and checked against BIP-340: success ends the request with
    /// a signature, failure discards the session and the request continues.
    ///
    /// The fresh commitment riding on the response is NOT consumed here;
    /// feed it to [`Self::receive_commit`] afterwards.
    pub fn receive_share(&mut self, response: &ShareResponse) -> Result<Option<Signature>> {
        let signer_index = response.signer_index;
        let session_id = response.session_id;

        if self.quarantined.contains(&signer_index) {
            debug!(signer_index, "ignoring share from quarantined signer");
            return Ok(None);
        }

        let verdict = match self.sessions.get(&session_id) {
            None => {
                debug!(
                    signer_index,
                    session = %short_id(&session_id),
                    "share for unknown session"
                );
                return Ok(None);
            }
            Some(session) => {
                if !session.validated.contains(signer_index) {
                    debug!(
                        signer_index,
                        session = %short_id(&session_id),
                        "share from signer outside the session"
                    );
                    return Ok(None);
                }
                let public_share = self
                    .public_shares
                    .get(&signer_index)
                    .expect("every in-range signer has a public share");
                session.verifier.verify_share(
                    &session.validated,
                    signer_index,
                    public_share,
                    &response.share,
                )
            }
        };

        if let Err(error) = verdict {
            warn!(signer_index, %error, "share failed verification");
            self.quarantine(signer_index)?;
            return Ok(None);
        }

        let (signature, verify_result) = {
            let session = self
                .sessions
                .get_mut(&session_id)
                .expect("session looked up above");
            session.shares.insert(signer_index, response.share);
            debug!(
                signer_index,
                session = %short_id(&session_id),
                shares = session.shares.len(),
                "share recorded"
            );

            if session.shares.len() < self.threshold {
                return Ok(None);
            }

            let shares: Vec<Scalar> = session.shares.values().copied().collect();
            let signature = self.frost.aggregate(&self.message, &session.list, &shares)?;
            let verify_result =
                self.suite
                    .verify_signature(&signature, self.frost.public_key(), &self.message);
            (signature, verify_result)
        };

        match verify_result {
            Ok(()) => {
                info!(session = %short_id(&session_id), "signing request complete");
                Ok(Some(signature))
            }
            Err(error) => {
                // all shares checked out individually, so this is either the
                // expected odd-Y parity miss or subtle coordinated malice;
                // drop the session and let the pool open another
                info!(
                    session = %short_id(&session_id),
                    error = %Error::AggregateVerifyFailed(error),
                    "discarding session"
                );
                self.sessions.remove(&session_id);
                Ok(None)
            }
        }
    }

    fn quarantine(&mut self, signer_index: SignerIndex) -> Result<()> {
        if self.quarantined.insert(signer_index) {
            warn!(signer_index, "signer quarantined");
        }
        self.pending.retain(|c| c.signer_index != signer_index);

        let available = self.live_signers();
        if available < self.threshold {
            return Err(Error::InsufficientSigners {
                available,
                threshold: self.threshold,
            });
        }
        Ok(())
    }
}
