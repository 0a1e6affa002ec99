//! ROAST: robust asynchronous threshold signing on top of FROST
//!
//! FROST alone is not robust: one malicious or absent participant makes a
//! session fail. ROAST runs many candidate sessions, verifies every share as
//! it arrives, quarantines provable misbehaviour, and keeps opening sessions
//! from fresh commitments until one aggregate passes BIP-340 verification.
//! With at most N-T Byzantine members, some session eventually consists of
//! honest signers only and the request terminates with a valid signature.

mod coordinator;
mod hash;
mod messages;
mod runtime;
mod signer;

pub use coordinator::RoastCoordinator;
pub use hash::{commit_hash, commit_list_hash, response_tag};
pub use messages::{CommitRequest, ShareResponse, SignRequest};
pub use runtime::{run_signing, Behaviour};
pub use signer::RoastSigner;
