//! Ed25519 proposal signature verification.

use quorum_core::SignatureVerifier;
use quorum_types::{BlockProposal, PublicKey};
use tracing::trace;

/// Verifies proposals signed with the proposer's Ed25519 key.
///
/// The proposer address must be the hex encoding of its public key, and the
/// signature must cover `BlockProposal::signing_message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify_proposal(&self, proposal: &BlockProposal) -> bool {
        let Some(public_key) = PublicKey::from_validator_id(&proposal.proposer) else {
            trace!(proposer = %proposal.proposer, "Proposer address is not an Ed25519 key");
            return false;
        };
        public_key.verify(&proposal.signing_message(), &proposal.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_test_helpers::{keypairs, proposal, signed_proposal};
    use quorum_types::Hash;

    #[test]
    fn test_accepts_valid_signature() {
        let key = &keypairs(1)[0];
        assert!(Ed25519Verifier.verify_proposal(&signed_proposal(key, 1, b"txs")));
    }

    #[test]
    fn test_rejects_tampered_proposal() {
        let key = &keypairs(1)[0];
        let mut proposal = signed_proposal(key, 1, b"txs");
        proposal.block_hash = Hash::from_bytes(b"other");
        assert!(!Ed25519Verifier.verify_proposal(&proposal));
    }

    #[test]
    fn test_rejects_other_signer() {
        let keys = keypairs(2);
        let mut proposal = signed_proposal(&keys[0], 1, b"txs");
        proposal.signature = keys[1].sign(&proposal.signing_message());
        assert!(!Ed25519Verifier.verify_proposal(&proposal));
    }

    #[test]
    fn test_rejects_non_key_address() {
        assert!(!Ed25519Verifier.verify_proposal(&proposal(1, "alice", b"txs")));
    }
}
