//! Transaction variants and their compressed wire form.
//!
//! Every compressed tx starts with its type byte, followed by fixed-width
//! big-endian fields.  Amounts and fees are 2-byte compact decimals.  The
//! compressed bytes are what gets hashed into the batch tx root and what the
//! signing message is built from, so the layout must never change.

use int_enum::IntEnum;
use opru_decimal::{CompactDecimal, DecimalCodec, EncodingResult};
use opru_merkle::{Hash, MerkleHasher};
use serde::{Deserialize, Serialize};

use crate::{
    PubkeyIndex, SpokeId, StateHasher, StateIndex,
    account::Reader,
    capabilities::BlsSignature,
    errors::{StateError, StateResult},
};

const AMOUNT_LEN: usize = DecimalCodec::COMPACT.width_bytes();

/// Discriminant written as the first byte of a compressed tx.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, IntEnum)]
pub enum TxType {
    Transfer = 1,
    Create2Transfer = 2,
    MassMigration = 3,
    BurnExecution = 4,
}

impl TxType {
    /// Length of the compressed form including the type byte.
    pub const fn compressed_len(&self) -> usize {
        1 + match self {
            TxType::Transfer => 4 + 4 + AMOUNT_LEN * 2,
            TxType::Create2Transfer => 4 + 4 + 4 + AMOUNT_LEN * 2,
            TxType::MassMigration => 4 + AMOUNT_LEN * 2 + 4,
            TxType::BurnExecution => 4,
        }
    }

    /// Whether txs of this type need a signature from the sender.
    pub const fn is_signed(&self) -> bool {
        !matches!(self, TxType::BurnExecution)
    }
}

/// Moves funds between two existing accounts of the same token.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from_index: StateIndex,
    pub to_index: StateIndex,
    pub amount: CompactDecimal,
    pub fee: CompactDecimal,
}

impl Transfer {
    /// Builds a transfer, encoding amount and fee with the compact codec.
    pub fn new(from_index: StateIndex, to_index: StateIndex, amount: u128, fee: u128) -> EncodingResult<Self> {
        Ok(Self {
            from_index,
            to_index,
            amount: CompactDecimal::encode(amount)?,
            fee: CompactDecimal::encode(fee)?,
        })
    }
}

/// Withdraws funds out of the tree towards a spoke.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MassMigration {
    pub from_index: StateIndex,
    pub amount: CompactDecimal,
    pub fee: CompactDecimal,
    pub spoke_id: SpokeId,
}

impl MassMigration {
    pub fn new(from_index: StateIndex, amount: u128, fee: u128, spoke_id: SpokeId) -> EncodingResult<Self> {
        Ok(Self {
            from_index,
            amount: CompactDecimal::encode(amount)?,
            fee: CompactDecimal::encode(fee)?,
            spoke_id,
        })
    }
}

/// Transfer into an empty slot, creating the receiving account.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Create2Transfer {
    pub from_index: StateIndex,
    pub to_index: StateIndex,
    pub to_pubkey_index: PubkeyIndex,
    pub amount: CompactDecimal,
    pub fee: CompactDecimal,
}

impl Create2Transfer {
    pub fn new(
        from_index: StateIndex,
        to_index: StateIndex,
        to_pubkey_index: PubkeyIndex,
        amount: u128,
        fee: u128,
    ) -> EncodingResult<Self> {
        Ok(Self {
            from_index,
            to_index,
            to_pubkey_index,
            amount: CompactDecimal::encode(amount)?,
            fee: CompactDecimal::encode(fee)?,
        })
    }
}

/// Periodic forced debit of an account's configured burn amount.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BurnExecution {
    pub from_index: StateIndex,
}

/// A rollup transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tx {
    Transfer(Transfer),
    MassMigration(MassMigration),
    Create2Transfer(Create2Transfer),
    BurnExecution(BurnExecution),
}

impl Tx {
    pub fn ty(&self) -> TxType {
        match self {
            Tx::Transfer(_) => TxType::Transfer,
            Tx::MassMigration(_) => TxType::MassMigration,
            Tx::Create2Transfer(_) => TxType::Create2Transfer,
            Tx::BurnExecution(_) => TxType::BurnExecution,
        }
    }

    /// Index of the account that pays for (and signs) the tx.
    pub fn from_index(&self) -> StateIndex {
        match self {
            Tx::Transfer(t) => t.from_index,
            Tx::MassMigration(t) => t.from_index,
            Tx::Create2Transfer(t) => t.from_index,
            Tx::BurnExecution(t) => t.from_index,
        }
    }

    /// Index of the receiving leaf, for variants that have one.
    pub fn to_index(&self) -> Option<StateIndex> {
        match self {
            Tx::Transfer(t) => Some(t.to_index),
            Tx::Create2Transfer(t) => Some(t.to_index),
            Tx::MassMigration(_) | Tx::BurnExecution(_) => None,
        }
    }

    /// Amount and fee of the variants that move funds.
    pub fn amount_and_fee(&self) -> Option<(CompactDecimal, CompactDecimal)> {
        match self {
            Tx::Transfer(t) => Some((t.amount, t.fee)),
            Tx::MassMigration(t) => Some((t.amount, t.fee)),
            Tx::Create2Transfer(t) => Some((t.amount, t.fee)),
            Tx::BurnExecution(_) => None,
        }
    }

    /// Appends the compressed form to a buffer.
    pub fn write_compressed(&self, out: &mut Vec<u8>) {
        out.push(u8::from(self.ty()));
        match self {
            Tx::Transfer(t) => {
                out.extend_from_slice(&t.from_index.to_be_bytes());
                out.extend_from_slice(&t.to_index.to_be_bytes());
                out.extend_from_slice(&t.amount.to_be_bytes());
                out.extend_from_slice(&t.fee.to_be_bytes());
            }
            Tx::MassMigration(t) => {
                out.extend_from_slice(&t.from_index.to_be_bytes());
                out.extend_from_slice(&t.amount.to_be_bytes());
                out.extend_from_slice(&t.fee.to_be_bytes());
                out.extend_from_slice(&t.spoke_id.to_be_bytes());
            }
            Tx::Create2Transfer(t) => {
                out.extend_from_slice(&t.from_index.to_be_bytes());
                out.extend_from_slice(&t.to_index.to_be_bytes());
                out.extend_from_slice(&t.to_pubkey_index.to_be_bytes());
                out.extend_from_slice(&t.amount.to_be_bytes());
                out.extend_from_slice(&t.fee.to_be_bytes());
            }
            Tx::BurnExecution(t) => {
                out.extend_from_slice(&t.from_index.to_be_bytes());
            }
        }
    }

    pub fn to_compressed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ty().compressed_len());
        self.write_compressed(&mut out);
        out
    }

    /// Decodes one compressed tx from the front of a buffer, returning it and
    /// the number of bytes consumed.
    pub fn decode_compressed(buf: &[u8]) -> StateResult<(Tx, usize)> {
        let Some(&tag) = buf.first() else {
            return Err(StateError::TruncatedTx(0));
        };
        let ty = TxType::try_from(tag).map_err(StateError::UnknownTxType)?;
        let len = ty.compressed_len();
        if buf.len() < len {
            return Err(StateError::TruncatedTx(buf.len()));
        }

        let mut rd = Reader::new(&buf[1..len]);
        let tx = match ty {
            TxType::Transfer => Tx::Transfer(Transfer {
                from_index: rd.u32(),
                to_index: rd.u32(),
                amount: rd.compact(),
                fee: rd.compact(),
            }),
            TxType::MassMigration => Tx::MassMigration(MassMigration {
                from_index: rd.u32(),
                amount: rd.compact(),
                fee: rd.compact(),
                spoke_id: rd.u32(),
            }),
            TxType::Create2Transfer => Tx::Create2Transfer(Create2Transfer {
                from_index: rd.u32(),
                to_index: rd.u32(),
                to_pubkey_index: rd.u32(),
                amount: rd.compact(),
                fee: rd.compact(),
            }),
            TxType::BurnExecution => Tx::BurnExecution(BurnExecution {
                from_index: rd.u32(),
            }),
        };

        Ok((tx, len))
    }

    /// Bytes a sender signs: the compressed tx followed by the sender's
    /// current nonce.
    pub fn signing_message(&self, nonce: u32) -> Vec<u8> {
        let mut msg = self.to_compressed();
        msg.extend_from_slice(&nonce.to_be_bytes());
        msg
    }

    /// Leaf of this tx in a batch's tx tree.
    pub fn leaf_hash(&self) -> Hash {
        StateHasher::hash_leaf(&self.to_compressed())
    }
}

impl From<Transfer> for Tx {
    fn from(value: Transfer) -> Self {
        Tx::Transfer(value)
    }
}

impl From<MassMigration> for Tx {
    fn from(value: MassMigration) -> Self {
        Tx::MassMigration(value)
    }
}

impl From<Create2Transfer> for Tx {
    fn from(value: Create2Transfer) -> Self {
        Tx::Create2Transfer(value)
    }
}

impl From<BurnExecution> for Tx {
    fn from(value: BurnExecution) -> Self {
        Tx::BurnExecution(value)
    }
}

/// A tx as submitted in a batch, with the sender's signature if it has one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SignedTx {
    pub tx: Tx,
    #[serde(default)]
    pub signature: Option<BlsSignature>,
}

impl SignedTx {
    pub fn new(tx: impl Into<Tx>, signature: BlsSignature) -> Self {
        Self {
            tx: tx.into(),
            signature: Some(signature),
        }
    }

    pub fn new_unsigned(tx: impl Into<Tx>) -> Self {
        Self {
            tx: tx.into(),
            signature: None,
        }
    }
}

/// Concatenates the compressed forms of a list of txs.
pub fn encode_compressed_batch<'t>(txs: impl IntoIterator<Item = &'t Tx>) -> Vec<u8> {
    let mut out = Vec::new();
    for tx in txs {
        tx.write_compressed(&mut out);
    }
    out
}

/// Splits a concatenation of compressed txs back into txs.
pub fn decode_compressed_batch(mut buf: &[u8]) -> StateResult<Vec<Tx>> {
    let mut txs = Vec::new();
    let mut offset = 0;
    while !buf.is_empty() {
        let (tx, used) = Tx::decode_compressed(buf).map_err(|e| match e {
            StateError::TruncatedTx(_) => StateError::TruncatedTx(offset),
            e => e,
        })?;
        txs.push(tx);
        buf = &buf[used..];
        offset += used;
    }
    Ok(txs)
}
