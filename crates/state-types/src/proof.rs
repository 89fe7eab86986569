use opru_merkle::{Hash, MerkleHasher, MerkleProof};
use serde::{Deserialize, Serialize};

use crate::{StateHasher, StateIndex, account::AccountState, errors::StateResult};

/// A claimed account leaf together with its path in the account tree.
///
/// `state` being `None` claims the slot is empty.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StateMerkleProof {
    state: Option<AccountState>,
    proof: MerkleProof,
}

impl StateMerkleProof {
    pub fn new(state: Option<AccountState>, proof: MerkleProof) -> Self {
        Self { state, proof }
    }

    pub fn state(&self) -> Option<&AccountState> {
        self.state.as_ref()
    }

    pub fn proof(&self) -> &MerkleProof {
        &self.proof
    }

    /// Leaf index the proof is for, if it fits a state index.
    pub fn index(&self) -> Option<StateIndex> {
        StateIndex::try_from(self.proof.index()).ok()
    }

    /// Leaf hash of the claimed state, the zero hash for an empty slot.
    pub fn leaf_hash(&self) -> StateResult<Hash> {
        leaf_hash_of(self.state.as_ref())
    }

    /// Checks the claimed state is in the tree under `root`.
    pub fn verify(&self, depth: usize, root: &Hash) -> bool {
        self.leaf_hash()
            .is_ok_and(|leaf| self.proof.verify::<StateHasher>(depth, root, &leaf))
    }

    /// Root of the tree after replacing the proven leaf with `state`.
    pub fn compute_root_with(&self, depth: usize, state: Option<&AccountState>) -> StateResult<Hash> {
        let leaf = leaf_hash_of(state)?;
        Ok(self.proof.compute_root::<StateHasher>(depth, &leaf)?)
    }
}

fn leaf_hash_of(state: Option<&AccountState>) -> StateResult<Hash> {
    match state {
        Some(st) => st.leaf_hash(),
        None => Ok(StateHasher::zero_hash()),
    }
}
