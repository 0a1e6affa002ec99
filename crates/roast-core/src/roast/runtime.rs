//! Task orchestration for one signing request
//!
//! Every signer runs as its own task with bounded mailboxes for commit and
//! sign requests; the coordinator is a single task multiplexing the commit
//! and share streams. No state is shared between tasks, all communication is
//! message passing, and a stop broadcast ends every signer once the request
//! finishes either way.

use std::collections::{BTreeMap, HashMap};

use k256::elliptic_curve::Field;
use k256::Scalar;
use rand::rngs::OsRng;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, instrument, warn};

use crate::{
    ciphersuite::Ciphersuite,
    error::{Error, Result},
    frost::{NonceCommitment, Signer},
    roast::{
        coordinator::RoastCoordinator,
        messages::{CommitRequest, ShareResponse, SignRequest},
        signer::RoastSigner,
    },
    types::{GroupInfo, KeyShare, Signature, SignerIndex},
};

const COORDINATOR_INDEX: u64 = 1;

/// How a signer task behaves during a run. Anything but [`Behaviour::Honest`]
/// models a Byzantine member for robustness testing and demos.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Behaviour {
    /// Follows the protocol
    #[default]
    Honest,
    /// Never answers commit requests
    WithholdsCommit,
    /// Commits, but never answers sign requests
    WithholdsShare,
    /// Answers sign requests with a random scalar instead of its share
    CorruptsShare,
}

struct SignerHandle {
    commit_requests: mpsc::Sender<CommitRequest>,
    sign_requests: mpsc::Sender<SignRequest>,
}

/// Drives one complete signing request over the given group and returns the
/// verified signature.
///
/// Signers absent from `behaviours` are honest. The request fails only with
/// [`Error::InsufficientSigners`], once quarantine has eaten into the pool so
/// far that no threshold of live signers remains.
#[instrument(skip_all, fields(group_size = group.group_size, threshold = group.threshold))]
pub async fn run_signing<C>(
    suite: C,
    group: &GroupInfo,
    key_shares: Vec<KeyShare>,
    message: &[u8],
    behaviours: &BTreeMap<SignerIndex, Behaviour>,
) -> Result<Signature>
where
    C: Ciphersuite + Clone + Send + 'static,
{
    let mut coordinator =
        RoastCoordinator::new(suite.clone(), group, COORDINATOR_INDEX, message.to_vec())?;

    let (commit_tx, mut commit_rx) = mpsc::channel(2 * group.group_size.max(1));
    let (share_tx, mut share_rx) = mpsc::channel(2 * group.group_size.max(1));
    let (stop_tx, _) = broadcast::channel(1);

    let mut handles = HashMap::new();
    let mut tasks = Vec::with_capacity(key_shares.len());

    for key_share in key_shares {
        let signer_index = key_share.signer_index;
        let signer = RoastSigner::new(Signer::from_key_share(suite.clone(), &key_share)?);
        let behaviour = behaviours.get(&signer_index).copied().unwrap_or_default();

        let (commit_req_tx, commit_req_rx) = mpsc::channel(32);
        let (sign_req_tx, sign_req_rx) = mpsc::channel(32);

        tasks.push(tokio::spawn(run_signer(
            signer,
            behaviour,
            commit_req_rx,
            sign_req_rx,
            stop_tx.subscribe(),
            commit_tx.clone(),
            share_tx.clone(),
        )));
        handles.insert(
            signer_index,
            SignerHandle {
                commit_requests: commit_req_tx,
                sign_requests: sign_req_tx,
            },
        );
    }

    // the coordinator only receives on these streams
    drop(commit_tx);
    drop(share_tx);

    let commit_request = coordinator.commit_request();
    for (signer_index, handle) in &handles {
        if handle.commit_requests.send(commit_request.clone()).await.is_err() {
            warn!(signer_index = *signer_index, "signer unreachable for commit request");
        }
    }

    let outcome = loop {
        tokio::select! {
            Some(commitment) = commit_rx.recv() => {
                match coordinator.receive_commit(commitment) {
                    Ok(Some(sign_request)) => send_sign_requests(&handles, sign_request).await,
                    Ok(None) => {}
                    Err(error) => break Err(error),
                }
            }
            Some(response) = share_rx.recv() => {
                let fresh_commitment = response.fresh_commitment.clone();
                match coordinator.receive_share(&response) {
                    Ok(Some(signature)) => break Ok(signature),
                    Ok(None) => match coordinator.receive_commit(fresh_commitment) {
                        Ok(Some(sign_request)) => {
                            send_sign_requests(&handles, sign_request).await
                        }
                        Ok(None) => {}
                        Err(error) => break Err(error),
                    },
                    Err(error) => break Err(error),
                }
            }
            else => {
                break Err(Error::InsufficientSigners {
                    available: 0,
                    threshold: group.threshold,
                });
            }
        }
    };

    match &outcome {
        Ok(_) => info!("signing request produced a verified signature"),
        Err(error) => warn!(%error, "signing request failed"),
    }

    let _ = stop_tx.send(());
    drop(handles);
    for task in tasks {
        let _ = task.await;
    }

    outcome
}

async fn send_sign_requests(handles: &HashMap<SignerIndex, SignerHandle>, request: SignRequest) {
    for commitment in &request.commitments {
        let Some(handle) = handles.get(&commitment.signer_index) else {
            continue;
        };
        if handle.sign_requests.send(request.clone()).await.is_err() {
            warn!(
                signer_index = commitment.signer_index,
                "signer unreachable for sign request"
            );
        }
    }
}

async fn run_signer<C: Ciphersuite>(
    mut signer: RoastSigner<C>,
    behaviour: Behaviour,
    mut commit_requests: mpsc::Receiver<CommitRequest>,
    mut sign_requests: mpsc::Receiver<SignRequest>,
    mut stop: broadcast::Receiver<()>,
    commits: mpsc::Sender<NonceCommitment>,
    shares: mpsc::Sender<ShareResponse>,
) {
    let signer_index = signer.signer_index();

    loop {
        tokio::select! {
            Some(request) = commit_requests.recv() => {
                if behaviour == Behaviour::WithholdsCommit {
                    debug!(signer_index, "withholding commitment");
                    continue;
                }
                match signer.handle_commit_request(&request) {
                    Ok(commitment) => {
                        if commits.send(commitment).await.is_err() {
                            break;
                        }
                    }
                    Err(error) => warn!(signer_index, %error, "commit failed"),
                }
            }
            Some(request) = sign_requests.recv() => {
                if behaviour == Behaviour::WithholdsShare {
                    debug!(signer_index, "withholding signature share");
                    continue;
                }
                match signer.handle_sign_request(&request) {
                    Ok(Some(mut response)) => {
                        if behaviour == Behaviour::CorruptsShare {
                            response.share = Scalar::random(&mut OsRng);
                        }
                        if shares.send(response).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(error) => warn!(signer_index, %error, "signing failed"),
                }
            }
            _ = stop.recv() => {
                debug!(signer_index, "stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use crate::{
        ciphersuite::{Bip340Ciphersuite, Ciphersuite},
        dealer::generate_group,
    };

    use super::*;

    const MESSAGE: &[u8] = b"ROAST survives Byzantine signers";
    const TEST_DEADLINE: Duration = Duration::from_secs(120);

    async fn run(
        group_size: usize,
        threshold: usize,
        behaviours: BTreeMap<SignerIndex, Behaviour>,
    ) -> Result<Signature> {
        let (group, key_shares) = generate_group(group_size, threshold).expect("dealer");
        let outcome = timeout(
            TEST_DEADLINE,
            run_signing(Bip340Ciphersuite, &group, key_shares, MESSAGE, &behaviours),
        )
        .await
        .expect("signing request should terminate");

        if let Ok(signature) = &outcome {
            let public_key = group.public_key_point().expect("decodes");
            Bip340Ciphersuite
                .verify_signature(signature, &public_key, MESSAGE)
                .expect("emitted signature verifies");
        }
        outcome
    }

    /// 100 members, threshold 51, everyone honest. The coordinator may burn
    /// sessions on odd-Y aggregates; the pool retries until one verifies.
    #[tokio::test(flavor = "multi_thread")]
    async fn happy_path_full_group() {
        run(100, 51, BTreeMap::new()).await.expect("signature");
    }

    /// The lowest-indexed minority returns random scalars as shares; they are
    /// quarantined one by one and the honest majority finishes.
    #[tokio::test(flavor = "multi_thread")]
    async fn coordinated_invalid_shares() {
        let behaviours = (1..=4).map(|i| (i, Behaviour::CorruptsShare)).collect();
        run(9, 5, behaviours).await.expect("signature");
    }

    /// The same minority never answers sign requests. Their commitments sink
    /// at most one session each; honest members keep recommitting.
    #[tokio::test(flavor = "multi_thread")]
    async fn coordinated_share_silence() {
        let behaviours = (1..=4).map(|i| (i, Behaviour::WithholdsShare)).collect();
        run(9, 5, behaviours).await.expect("signature");
    }

    /// The minority never commits at all; the honest majority alone reaches
    /// the threshold.
    #[tokio::test(flavor = "multi_thread")]
    async fn coordinated_commit_silence() {
        let behaviours = (1..=4).map(|i| (i, Behaviour::WithholdsCommit)).collect();
        run(9, 5, behaviours).await.expect("signature");
    }

    /// A mixed adversary: one silent committer, one silent signer, two
    /// corrupt signers, honest majority of exactly the threshold.
    #[tokio::test(flavor = "multi_thread")]
    async fn mixed_byzantine_minority() {
        let behaviours = BTreeMap::from([
            (1, Behaviour::WithholdsCommit),
            (2, Behaviour::WithholdsShare),
            (3, Behaviour::CorruptsShare),
            (4, Behaviour::CorruptsShare),
        ]);
        run(9, 5, behaviours).await.expect("signature");
    }

    /// With more corrupt members than the group can spare, quarantine drains
    /// the pool below the threshold and the request fails.
    #[tokio::test(flavor = "multi_thread")]
    async fn too_many_corrupt_members_fail_the_request() {
        let behaviours = (1..=2).map(|i| (i, Behaviour::CorruptsShare)).collect();
        let outcome = run(5, 4, behaviours).await;

        assert!(matches!(
            outcome,
            Err(Error::InsufficientSigners {
                available: 3,
                threshold: 4,
            }),
        ));
    }
}
