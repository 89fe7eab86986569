//! Interfaces to collaborators outside the verification core.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use opru_primitives::{Buf32, Buf64, Buf128};
use serde::{Deserialize, Serialize};

use crate::{PubkeyIndex, TokenType};

/// BLS public key, an uncompressed G2 point.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlsPubkey(Buf128);

/// BLS signature, a G1 point.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlsSignature(Buf64);

/// A message hashed onto the G1 curve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagePoint(Buf64);

macro_rules! impl_point_wrapper {
    ($target:ident => $inner:ty) => {
        impl $target {
            pub const fn new(v: $inner) -> Self {
                Self(v)
            }

            pub fn inner(&self) -> &$inner {
                &self.0
            }
        }

        impl From<$inner> for $target {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

impl_point_wrapper!(BlsPubkey => Buf128);
impl_point_wrapper!(BlsSignature => Buf64);
impl_point_wrapper!(MessagePoint => Buf64);

/// Aggregate-signature library capability.  The core only builds message
/// bytes and domain tags, it never signs.
pub trait SignatureVerifier {
    /// Hashes message bytes onto the curve under a domain separation tag.
    fn hash_to_point(&self, domain: &Buf32, msg: &[u8]) -> MessagePoint;

    /// Verifies a single signature over an already hashed message.
    fn verify_single(&self, sig: &BlsSignature, pubkey: &BlsPubkey, msg: &MessagePoint) -> bool;
}

/// Lookup of registered public keys by index.
pub trait PubkeyRegistry {
    fn pubkey(&self, index: PubkeyIndex) -> Option<BlsPubkey>;
}

/// Lookup of registered token types.
pub trait TokenRegistry {
    fn token_exists(&self, token_type: TokenType) -> bool;
}

impl PubkeyRegistry for [BlsPubkey] {
    fn pubkey(&self, index: PubkeyIndex) -> Option<BlsPubkey> {
        self.get(index as usize).copied()
    }
}

impl PubkeyRegistry for Vec<BlsPubkey> {
    fn pubkey(&self, index: PubkeyIndex) -> Option<BlsPubkey> {
        self.as_slice().pubkey(index)
    }
}

impl PubkeyRegistry for HashMap<PubkeyIndex, BlsPubkey> {
    fn pubkey(&self, index: PubkeyIndex) -> Option<BlsPubkey> {
        self.get(&index).copied()
    }
}

impl PubkeyRegistry for BTreeMap<PubkeyIndex, BlsPubkey> {
    fn pubkey(&self, index: PubkeyIndex) -> Option<BlsPubkey> {
        self.get(&index).copied()
    }
}

impl TokenRegistry for HashSet<TokenType> {
    fn token_exists(&self, token_type: TokenType) -> bool {
        self.contains(&token_type)
    }
}

impl TokenRegistry for BTreeSet<TokenType> {
    fn token_exists(&self, token_type: TokenType) -> bool {
        self.contains(&token_type)
    }
}

impl<R: PubkeyRegistry + ?Sized> PubkeyRegistry for &R {
    fn pubkey(&self, index: PubkeyIndex) -> Option<BlsPubkey> {
        (**self).pubkey(index)
    }
}

impl<R: TokenRegistry + ?Sized> TokenRegistry for &R {
    fn token_exists(&self, token_type: TokenType) -> bool {
        (**self).token_exists(token_type)
    }
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for &V {
    fn hash_to_point(&self, domain: &Buf32, msg: &[u8]) -> MessagePoint {
        (**self).hash_to_point(domain, msg)
    }

    fn verify_single(&self, sig: &BlsSignature, pubkey: &BlsPubkey, msg: &MessagePoint) -> bool {
        (**self).verify_single(sig, pubkey, msg)
    }
}
