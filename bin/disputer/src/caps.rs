//! Stand-ins for the signature library and key registry, which the tool
//! doesn't have access to.

use opru_primitives::{Buf32, Buf64, Buf128, hash::sha256_concat};
use opru_state_types::{
    BlsPubkey, BlsSignature, MessagePoint, PubkeyIndex, PubkeyRegistry, SignatureVerifier,
    SignedTx,
};

/// Accepts every signature.
///
/// Only sound for batches whose aggregate signature was already checked
/// when they were submitted.
#[derive(Debug)]
pub(crate) struct PreverifiedSignatures;

impl SignatureVerifier for PreverifiedSignatures {
    fn hash_to_point(&self, domain: &Buf32, msg: &[u8]) -> MessagePoint {
        let digest = sha256_concat([domain.as_bytes().as_slice(), msg]);
        let mut point = [0; 64];
        point[..32].copy_from_slice(digest.as_bytes());
        MessagePoint::new(Buf64::new(point))
    }

    fn verify_single(&self, _sig: &BlsSignature, _pubkey: &BlsPubkey, _msg: &MessagePoint) -> bool {
        true
    }
}

/// Registry that knows a (placeholder) key for every index.
#[derive(Debug)]
pub(crate) struct AnyPubkey;

impl PubkeyRegistry for AnyPubkey {
    fn pubkey(&self, _index: PubkeyIndex) -> Option<BlsPubkey> {
        Some(BlsPubkey::new(Buf128::zero()))
    }
}

/// Gives each signed tx lacking a signature a placeholder one.  Returns how
/// many were filled in.
pub(crate) fn fill_signatures(txs: &mut [SignedTx]) -> usize {
    let mut filled = 0;
    for signed in txs.iter_mut() {
        if signed.tx.ty().is_signed() && signed.signature.is_none() {
            signed.signature = Some(BlsSignature::new(Buf64::zero()));
            filled += 1;
        }
    }
    filled
}
