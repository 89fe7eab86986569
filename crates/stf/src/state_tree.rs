use std::collections::BTreeMap;

use opru_merkle::{Hash, SparseMerkleTree};
use opru_state_types::{AccountState, StateHasher, StateIndex, StateMerkleProof, StateResult};

/// Account tree together with the leaf records its hashes commit to.
#[derive(Clone, Debug)]
pub struct AccountTree {
    tree: SparseMerkleTree<StateHasher>,
    accounts: BTreeMap<StateIndex, AccountState>,
}

impl AccountTree {
    pub fn new(depth: usize) -> StateResult<Self> {
        Ok(Self {
            tree: SparseMerkleTree::new(depth)?,
            accounts: BTreeMap::new(),
        })
    }

    /// Builds a tree from a set of leaves.
    pub fn from_accounts(
        depth: usize,
        accounts: impl IntoIterator<Item = (StateIndex, AccountState)>,
    ) -> StateResult<Self> {
        let mut tree = Self::new(depth)?;
        for (index, state) in accounts {
            tree.insert(index, state)?;
        }
        Ok(tree)
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn root(&self) -> Hash {
        self.tree.root()
    }

    /// Whether an index addresses a leaf of this tree.
    pub fn contains_index(&self, index: StateIndex) -> bool {
        index_in_tree(index, self.depth())
    }

    pub fn get(&self, index: StateIndex) -> Option<&AccountState> {
        self.accounts.get(&index)
    }

    pub fn accounts(&self) -> impl Iterator<Item = (StateIndex, &AccountState)> {
        self.accounts.iter().map(|(i, s)| (*i, s))
    }

    /// Writes a leaf.  Fails if the index is outside the tree or the state
    /// can't be serialized.
    pub fn insert(&mut self, index: StateIndex, state: AccountState) -> StateResult<()> {
        let leaf = state.leaf_hash()?;
        self.tree.set_leaf(index as u64, leaf)?;
        self.accounts.insert(index, state);
        Ok(())
    }

    /// Proves the current leaf at an index, empty or not.
    pub fn prove(&self, index: StateIndex) -> StateResult<StateMerkleProof> {
        let proof = self.tree.prove(index as u64)?;
        Ok(StateMerkleProof::new(self.get(index).copied(), proof))
    }
}

/// Whether a state index addresses a leaf of a tree of some depth.
pub fn index_in_tree(index: StateIndex, depth: usize) -> bool {
    depth >= 32 || (index as u64) >> depth == 0
}
