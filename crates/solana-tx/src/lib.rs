//! Solana transaction construction, compact serialization and Ed25519 signing.
//!
//! Builds legacy-format messages from instructions, serializes them in the
//! compact binary wire format, signs them with `ed25519-dalek` and assembles
//! the final bytes under the cluster's packet ceiling. No RPC client: the
//! output is ready to be Base58/Base64-encoded and handed to one.
//!
//! ```text
//! Instruction(s) ──compile──> Message ──serialize──> bytes to sign
//!                                 │                       │
//!                                 │                  Signer / Keypair
//!                                 ▼                       ▼
//!                       TransactionAssembler <────── Signature(s)
//!                                 │
//!                                 ▼
//!                          WireTransaction
//! ```

pub mod cluster;
pub mod compact;
pub mod error;
pub mod instruction;
pub mod keypair;
pub mod message;
pub mod pubkey;
pub mod signature;
pub mod signer;
pub mod system;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use cluster::{ClusterConfig, PACKET_DATA_SIZE, SYSTEM_PROGRAM_ID};
pub use error::{TxError, TxResult};
pub use instruction::{AccountMeta, CompiledInstruction, Instruction};
pub use keypair::Keypair;
pub use message::{Message, MessageHeader};
pub use pubkey::{address_to_bytes, bytes_to_address, Hash, Pubkey};
pub use signature::Signature;
pub use signer::Signer;
pub use system::{SystemProgram, TransferIntent, LAMPORTS_PER_SOL};
pub use transaction::{
    assemble, sign_raw_transaction, Transaction, TransactionAssembler, WireTransaction,
};
