use opru_decimal::{Amount, CompactDecimal, DecimalCodec};
use opru_merkle::{Hash, MerkleHasher, Sha256Hasher};
use serde::{Deserialize, Serialize};

use crate::{
    PubkeyIndex, TokenType,
    errors::{StateError, StateResult},
    period::YearMonth,
};

/// Hasher used for account and withdrawal trees.
pub type StateHasher = Sha256Hasher;

/// Serialized length of an [`AccountState`].
pub const ACCOUNT_STATE_LEN: usize = 4 + 4 + BALANCE_LEN + 4 + BALANCE_LEN + 4;

const BALANCE_LEN: usize = DecimalCodec::WIDE.width_bytes();

/// Account leaf record.
///
/// Layout, all integers big-endian:
///
/// ```text
/// pubkey_index u32 | token_type u32 | balance (wide decimal) | nonce u32 |
/// burn (wide decimal) | last_burn u32
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pubkey_index: PubkeyIndex,
    token_type: TokenType,
    balance: Amount,
    nonce: u32,
    burn: Amount,
    last_burn: YearMonth,
}

impl AccountState {
    pub fn new(
        pubkey_index: PubkeyIndex,
        token_type: TokenType,
        balance: Amount,
        nonce: u32,
        burn: Amount,
        last_burn: YearMonth,
    ) -> Self {
        Self {
            pubkey_index,
            token_type,
            balance,
            nonce,
            burn,
            last_burn,
        }
    }

    /// Creates a fresh account with no burn schedule.
    pub fn new_fresh(pubkey_index: PubkeyIndex, token_type: TokenType, balance: Amount) -> Self {
        Self::new(
            pubkey_index,
            token_type,
            balance,
            0,
            Amount::ZERO,
            YearMonth::NEVER,
        )
    }

    pub fn pubkey_index(&self) -> PubkeyIndex {
        self.pubkey_index
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }

    pub fn burn(&self) -> Amount {
        self.burn
    }

    pub fn last_burn(&self) -> YearMonth {
        self.last_burn
    }

    /// Returns a copy with a different per-period burn amount.
    pub fn with_burn(self, burn: Amount) -> Self {
        Self { burn, ..self }
    }

    pub fn set_last_burn(&mut self, period: YearMonth) {
        self.last_burn = period;
    }

    /// Bumps the nonce, returning `None` on overflow.
    pub fn incr_nonce(&mut self) -> Option<u32> {
        self.nonce = self.nonce.checked_add(1)?;
        Some(self.nonce)
    }

    /// Subtracts from this account's balance, if funds are available.
    pub fn take_balance(&mut self, amt: Amount) -> StateResult<()> {
        self.balance = self
            .balance
            .checked_sub(amt)
            .ok_or(StateError::InsufficientBalance {
                have: self.balance,
                need: amt,
            })?;
        Ok(())
    }

    /// Adds value of some token to this account's balance.  Leaves the
    /// account untouched on failure.
    pub fn add_balance(&mut self, token_type: TokenType, amt: Amount) -> StateResult<()> {
        if token_type != self.token_type {
            return Err(StateError::TokenMismatch(token_type, self.token_type));
        }

        self.balance = self
            .balance
            .checked_add(amt)
            .ok_or(StateError::BalanceOverflow)?;
        Ok(())
    }

    /// Serializes into the fixed leaf layout.
    ///
    /// Fails if the balance or burn amount isn't exactly representable in
    /// the wide decimal codec.
    pub fn serialize(&self) -> StateResult<Vec<u8>> {
        let codec = DecimalCodec::WIDE;
        let balance = codec.encode_exact(self.balance.get())?;
        let burn = codec.encode_exact(self.burn.get())?;

        let mut buf = Vec::with_capacity(ACCOUNT_STATE_LEN);
        buf.extend_from_slice(&self.pubkey_index.to_be_bytes());
        buf.extend_from_slice(&self.token_type.to_be_bytes());
        codec.write_bytes(balance, &mut buf);
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        codec.write_bytes(burn, &mut buf);
        buf.extend_from_slice(&self.last_burn.raw().to_be_bytes());
        Ok(buf)
    }

    /// Parses the fixed leaf layout.
    pub fn deserialize(buf: &[u8]) -> StateResult<Self> {
        if buf.len() != ACCOUNT_STATE_LEN {
            return Err(StateError::BadLength(ACCOUNT_STATE_LEN, buf.len()));
        }

        let codec = DecimalCodec::WIDE;
        let mut rd = Reader::new(buf);
        let pubkey_index = rd.u32();
        let token_type = rd.u32();
        let balance = codec.decode(codec.from_bytes(rd.take(BALANCE_LEN))?);
        let nonce = rd.u32();
        let burn = codec.decode(codec.from_bytes(rd.take(BALANCE_LEN))?);
        let last_burn = YearMonth::from_raw(rd.u32());

        Ok(Self {
            pubkey_index,
            token_type,
            balance: Amount::new(balance),
            nonce,
            burn: Amount::new(burn),
            last_burn,
        })
    }

    /// Computes the tree leaf for this account, `H(serialize(state))`.
    pub fn leaf_hash(&self) -> StateResult<Hash> {
        Ok(StateHasher::hash_leaf(&self.serialize()?))
    }
}

/// Cursor over a buffer whose length has already been checked.
pub(crate) struct Reader<'b> {
    buf: &'b [u8],
}

impl<'b> Reader<'b> {
    pub(crate) fn new(buf: &'b [u8]) -> Self {
        Self { buf }
    }

    pub(crate) fn take(&mut self, n: usize) -> &'b [u8] {
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        head
    }

    pub(crate) fn u32(&mut self) -> u32 {
        let mut arr = [0u8; 4];
        arr.copy_from_slice(self.take(4));
        u32::from_be_bytes(arr)
    }

    pub(crate) fn compact(&mut self) -> CompactDecimal {
        let mut arr = [0u8; 2];
        arr.copy_from_slice(self.take(2));
        CompactDecimal::from_be_bytes(arr)
    }
}
