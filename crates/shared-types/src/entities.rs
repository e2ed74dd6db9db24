//! # Core Domain Entities
//!
//! Chain-level entities shared by the transaction pool, its validators and
//! the node runtime.
//!
//! ## Clusters
//!
//! - **Chain**: `Transaction`, `MutableTransaction`, `Payload`, `Sig`
//! - **Sharding**: `ShardId`
//! - **Networking**: `NodeId`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::TransactionError;

// =============================================================================
// CLUSTER A: THE CHAIN
// =============================================================================

/// A 32-byte content hash (SHA-256).
pub type Hash = [u8; 32];

/// A 32-byte public key.
pub type PublicKey = [u8; 32];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// Current transaction format version.
pub const TX_VERSION: u8 = 0;

/// Renders the first four bytes of a hash as hex, for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}

/// Transaction kind. Must agree with the payload variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    /// Contract invocation.
    Invoke,
    /// Contract deployment.
    Deploy,
    /// Native value transfer.
    Transfer,
}

/// Transaction payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Code executed against existing contract state.
    InvokeCode {
        /// Invocation bytecode.
        code: Vec<u8>,
    },
    /// A new contract.
    DeployCode {
        /// Contract bytecode.
        code: Vec<u8>,
        /// Human readable contract name.
        name: String,
    },
    /// Move `amount` base units from the payer to `to`.
    Transfer {
        /// Recipient.
        to: Address,
        /// Amount in base units.
        amount: u64,
    },
}

impl Payload {
    /// The transaction type this payload belongs to.
    pub fn tx_type(&self) -> TxType {
        match self {
            Payload::InvokeCode { .. } => TxType::Invoke,
            Payload::DeployCode { .. } => TxType::Deploy,
            Payload::Transfer { .. } => TxType::Transfer,
        }
    }

    /// Size of the variable-length content in bytes.
    pub fn byte_len(&self) -> usize {
        match self {
            Payload::InvokeCode { code } => code.len(),
            Payload::DeployCode { code, name } => code.len() + name.len(),
            Payload::Transfer { .. } => std::mem::size_of::<Address>() + 8,
        }
    }

    /// Value moved out of the payer's account by this payload.
    pub fn transfer_amount(&self) -> u64 {
        match self {
            Payload::Transfer { amount, .. } => *amount,
            _ => 0,
        }
    }
}

/// An m-of-n signature over the transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sig {
    /// Public keys participating in the signature.
    pub pub_keys: Vec<PublicKey>,
    /// Required number of signatures.
    pub m: u16,
    /// Raw signature bytes, one per signing key.
    pub sig_data: Vec<Vec<u8>>,
}

/// Shard identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct ShardId(pub u64);

impl ShardId {
    /// The root shard.
    pub const ROOT: ShardId = ShardId(0);

    /// Returns true for the root shard.
    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard-{}", self.0)
    }
}

/// The fields covered by the transaction hash.
#[derive(Serialize)]
struct UnsignedBody<'a> {
    version: u8,
    tx_type: TxType,
    nonce: u32,
    gas_price: u64,
    gas_limit: u64,
    payer: &'a Address,
    shard_id: ShardId,
    payload: &'a Payload,
}

/// Builder form of a transaction. Freely editable until `into_immutable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableTransaction {
    pub version: u8,
    pub tx_type: TxType,
    pub nonce: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub payer: Address,
    pub shard_id: ShardId,
    pub payload: Payload,
    pub sigs: Vec<Sig>,
}

impl MutableTransaction {
    /// Creates an unsigned transaction for `payload`, with the type derived from it.
    pub fn new(payload: Payload) -> Self {
        Self {
            version: TX_VERSION,
            tx_type: payload.tx_type(),
            nonce: 0,
            gas_price: 0,
            gas_limit: 0,
            payer: [0u8; 20],
            shard_id: ShardId::ROOT,
            payload,
            sigs: Vec::new(),
        }
    }

    /// Freezes the transaction and computes its content hash.
    ///
    /// Signatures are not part of the hash, so re-signing never changes identity.
    pub fn into_immutable(self) -> Result<Transaction, TransactionError> {
        let body = UnsignedBody {
            version: self.version,
            tx_type: self.tx_type,
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            payer: &self.payer,
            shard_id: self.shard_id,
            payload: &self.payload,
        };
        let encoded =
            bincode::serialize(&body).map_err(|e| TransactionError::Encoding(e.to_string()))?;
        let hash: Hash = Sha256::digest(&encoded).into();

        Ok(Transaction { inner: self, hash })
    }
}

/// An immutable transaction. Identity, equality and hashing follow the content hash.
#[derive(Debug, Clone)]
pub struct Transaction {
    inner: MutableTransaction,
    hash: Hash,
}

impl Transaction {
    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn version(&self) -> u8 {
        self.inner.version
    }

    pub fn tx_type(&self) -> TxType {
        self.inner.tx_type
    }

    pub fn nonce(&self) -> u32 {
        self.inner.nonce
    }

    pub fn gas_price(&self) -> u64 {
        self.inner.gas_price
    }

    pub fn gas_limit(&self) -> u64 {
        self.inner.gas_limit
    }

    pub fn payer(&self) -> &Address {
        &self.inner.payer
    }

    pub fn shard_id(&self) -> ShardId {
        self.inner.shard_id
    }

    pub fn payload(&self) -> &Payload {
        &self.inner.payload
    }

    pub fn sigs(&self) -> &[Sig] {
        &self.inner.sigs
    }

    /// Maximum fee the payer can be charged (`gas_price * gas_limit`), saturating.
    pub fn max_fee(&self) -> u64 {
        self.inner.gas_price.saturating_mul(self.inner.gas_limit)
    }

    /// Fee plus any transferred value, saturating.
    pub fn total_cost(&self) -> u64 {
        self.max_fee()
            .saturating_add(self.inner.payload.transfer_amount())
    }

    /// Returns an editable copy. The copy must be re-frozen to obtain a new hash.
    pub fn to_mutable(&self) -> MutableTransaction {
        self.inner.clone()
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Transaction {}

impl std::hash::Hash for Transaction {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

// =============================================================================
// CLUSTER B: NETWORKING
// =============================================================================

/// Unique identifier for a node in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NodeId(pub [u8; 32]);

/// A peer identifier (alias for `NodeId` in peer contexts).
pub type PeerId = NodeId;
