use opru_decimal::{Amount, DecimalCodec};
use opru_merkle::{Hash, MerkleHasher};
use serde::{Deserialize, Serialize};

use crate::{PubkeyIndex, SpokeId, StateHasher, TokenType, errors::StateResult};

/// Serialized length of a [`WithdrawalLeaf`].
pub const WITHDRAWAL_LEAF_LEN: usize = 4 + 4 + DecimalCodec::WIDE.width_bytes() + 4;

/// Funds leaving the rollup through a mass migration, committed to in the
/// batch's withdrawal root.
///
/// Layout: `pubkey_index u32 | token_type u32 | balance (wide decimal) |
/// spoke_id u32`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WithdrawalLeaf {
    pub pubkey_index: PubkeyIndex,
    pub token_type: TokenType,
    pub balance: Amount,
    pub spoke_id: SpokeId,
}

impl WithdrawalLeaf {
    pub fn serialize(&self) -> StateResult<Vec<u8>> {
        let codec = DecimalCodec::WIDE;
        let balance = codec.encode_exact(self.balance.get())?;

        let mut buf = Vec::with_capacity(WITHDRAWAL_LEAF_LEN);
        buf.extend_from_slice(&self.pubkey_index.to_be_bytes());
        buf.extend_from_slice(&self.token_type.to_be_bytes());
        codec.write_bytes(balance, &mut buf);
        buf.extend_from_slice(&self.spoke_id.to_be_bytes());
        Ok(buf)
    }

    pub fn leaf_hash(&self) -> StateResult<Hash> {
        Ok(StateHasher::hash_leaf(&self.serialize()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let leaf = WithdrawalLeaf {
            pubkey_index: 2,
            token_type: 1,
            balance: Amount::new(1200),
            spoke_id: 9,
        };
        let buf = leaf.serialize().unwrap();
        assert_eq!(buf.len(), WITHDRAWAL_LEAF_LEN);
        assert_eq!(&buf[14..], &9u32.to_be_bytes());
        assert_eq!(leaf.leaf_hash().unwrap(), StateHasher::hash_leaf(&buf));
    }
}
