// src/transaction/mod.rs
//! Child chain transactions
//!
//! Child chain transactions spend up to two UTXOs and create two outputs.
//! They travel as Borsh bytes; the transaction hash is the keccak-256 of those
//! bytes exactly as received.

mod position;

pub use position::{
    UtxoPosition, BLOCK_OFFSET, CHILD_BLOCK_INTERVAL, MAX_BLOCK_NUMBER, MAX_TX_INDEX,
    OUTPUTS_PER_TX, TX_OFFSET,
};

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use solana_program::keccak;
use std::fmt;

use crate::error_handling::{RootChainError, RootChainResult};

/// Inputs per transaction
pub const INPUTS_PER_TX: usize = 2;

/// 20-byte account address, as recovered from secp256k1 signatures
#[derive(
    BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address
    pub const ZERO: Address = Address([0u8; 20]);

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(text: &str) -> Result<Self, hex::FromHexError> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Address(bytes))
    }

    /// Hex representation with a `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = <String as Deserialize>::deserialize(deserializer)?;
        Address::from_hex(&text).map_err(de::Error::custom)
    }
}

/// Reference to a spent UTXO
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxInput {
    /// Position of the spent output, or the null position
    pub position: UtxoPosition,
}

/// Newly created UTXO
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutput {
    /// Owner of the output
    pub owner: Address,

    /// Amount carried by the output
    pub amount: u64,
}

/// Child chain transaction
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    /// Spent outputs, always two, unused slots hold the null position
    pub inputs: Vec<TxInput>,

    /// Created outputs, always two
    pub outputs: Vec<TxOutput>,

    /// Fee paid to the operator
    pub fee: u64,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(inputs: [UtxoPosition; INPUTS_PER_TX], outputs: [TxOutput; 2], fee: u64) -> Self {
        Self {
            inputs: inputs.iter().map(|position| TxInput { position: *position }).collect(),
            outputs: outputs.to_vec(),
            fee,
        }
    }

    /// Decode and check the shape of a transaction
    pub fn decode(bytes: &[u8]) -> RootChainResult<Self> {
        let transaction = Self::try_from_slice(bytes)
            .map_err(|e| RootChainError::InvalidTransaction(format!("undecodable transaction: {}", e)))?;

        if transaction.inputs.len() != INPUTS_PER_TX {
            return Err(RootChainError::InvalidTransaction(format!(
                "expected {} inputs, got {}",
                INPUTS_PER_TX,
                transaction.inputs.len()
            )));
        }

        if transaction.outputs.len() != OUTPUTS_PER_TX as usize {
            return Err(RootChainError::InvalidTransaction(format!(
                "expected {} outputs, got {}",
                OUTPUTS_PER_TX,
                transaction.outputs.len()
            )));
        }

        for input in &transaction.inputs {
            if !input.position.is_null() {
                input.position.validate()?;
            }
        }

        Ok(transaction)
    }

    /// Borsh encoding of the transaction
    pub fn encode(&self) -> RootChainResult<Vec<u8>> {
        self.try_to_vec()
            .map_err(|e| RootChainError::InvalidTransaction(format!("unencodable transaction: {}", e)))
    }

    /// Keccak-256 of encoded transaction bytes
    pub fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
        keccak::hash(bytes).to_bytes()
    }

    /// Position of input `index`
    pub fn input(&self, index: usize) -> Option<UtxoPosition> {
        self.inputs.get(index).map(|input| input.position)
    }

    /// Output at `index`
    pub fn output(&self, index: u8) -> Option<&TxOutput> {
        self.outputs.get(index as usize)
    }

    /// Whether the transaction spends `position` directly
    pub fn spends(&self, position: &UtxoPosition) -> bool {
        !position.is_null() && self.inputs.iter().any(|input| input.position == *position)
    }
}
