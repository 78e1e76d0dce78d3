//! System Program instructions and the native transfer intent.
//!
//! System Program instruction data is a little-endian u32 discriminant
//! followed by the variant's fields, also little-endian. A transfer is
//! therefore 12 bytes: `02 00 00 00` and the u64 lamport amount.

use log::debug;

use crate::cluster::{ClusterConfig, SYSTEM_PROGRAM_ID};
use crate::error::{TxError, TxResult};
use crate::instruction::{AccountMeta, Instruction};
use crate::message::Message;
use crate::pubkey::{Hash, Pubkey};
use crate::signer::Signer;
use crate::transaction::{Transaction, TransactionAssembler, WireTransaction};

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64) as u64
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// System Program instruction discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SystemInstruction {
    CreateAccount = 0,
    Assign = 1,
    Transfer = 2,
    CreateAccountWithSeed = 3,
    AdvanceNonceAccount = 4,
    WithdrawNonceAccount = 5,
    InitializeNonceAccount = 6,
    AuthorizeNonceAccount = 7,
    Allocate = 8,
    AllocateWithSeed = 9,
    AssignWithSeed = 10,
    TransferWithSeed = 11,
}

impl SystemInstruction {
    fn data(self, capacity: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(4 + capacity);
        data.extend_from_slice(&(self as u32).to_le_bytes());
        data
    }
}

/// Instruction builders bound to one cluster's System Program id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemProgram {
    program_id: Pubkey,
}

impl SystemProgram {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            program_id: config.system_program_id,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Move `lamports` from `from` (signer) to `to`.
    pub fn transfer(&self, from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
        let mut data = SystemInstruction::Transfer.data(8);
        data.extend_from_slice(&lamports.to_le_bytes());

        Instruction::new(
            self.program_id,
            vec![AccountMeta::new(*from, true), AccountMeta::new(*to, false)],
            data,
        )
    }

    /// Fund a new account with `lamports`, allocate `space` bytes and assign
    /// it to `owner`. Both accounts sign.
    pub fn create_account(
        &self,
        from: &Pubkey,
        new_account: &Pubkey,
        lamports: u64,
        space: u64,
        owner: &Pubkey,
    ) -> Instruction {
        let mut data = SystemInstruction::CreateAccount.data(8 + 8 + 32);
        data.extend_from_slice(&lamports.to_le_bytes());
        data.extend_from_slice(&space.to_le_bytes());
        data.extend_from_slice(owner.as_ref());

        Instruction::new(
            self.program_id,
            vec![
                AccountMeta::new(*from, true),
                AccountMeta::new(*new_account, true),
            ],
            data,
        )
    }

    /// Hand ownership of `account` to `owner`.
    pub fn assign(&self, account: &Pubkey, owner: &Pubkey) -> Instruction {
        let mut data = SystemInstruction::Assign.data(32);
        data.extend_from_slice(owner.as_ref());

        Instruction::new(self.program_id, vec![AccountMeta::new(*account, true)], data)
    }

    /// Allocate `space` bytes of data for `account`.
    pub fn allocate(&self, account: &Pubkey, space: u64) -> Instruction {
        let mut data = SystemInstruction::Allocate.data(8);
        data.extend_from_slice(&space.to_le_bytes());

        Instruction::new(self.program_id, vec![AccountMeta::new(*account, true)], data)
    }
}

impl Default for SystemProgram {
    fn default() -> Self {
        Self {
            program_id: SYSTEM_PROGRAM_ID,
        }
    }
}

/// A System Program transfer against the default program id.
pub fn transfer(from: &Pubkey, to: &Pubkey, lamports: u64) -> Instruction {
    SystemProgram::default().transfer(from, to, lamports)
}

// ---------------------------------------------------------------------------
// Transfer intent
// ---------------------------------------------------------------------------

/// "Send `lamports` from `from` to `to`", bound to a recent blockhash.
/// `from` pays the fee and is the only signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferIntent {
    pub from: Pubkey,
    pub to: Pubkey,
    pub lamports: u64,
    pub recent_blockhash: Hash,
}

impl TransferIntent {
    pub fn new(from: Pubkey, to: Pubkey, lamports: u64, recent_blockhash: Hash) -> Self {
        Self {
            from,
            to,
            lamports,
            recent_blockhash,
        }
    }

    /// Compile the unsigned message.
    pub fn build_message(&self, config: &ClusterConfig) -> TxResult<Message> {
        if self.lamports == 0 {
            return Err(TxError::InvalidInstruction("lamports must be > 0".into()));
        }

        let ix = SystemProgram::new(config).transfer(&self.from, &self.to, self.lamports);
        Message::compile(&self.from, &[ix], &self.recent_blockhash)
    }

    /// Compile, sign with `signer` and assemble the wire bytes.
    pub fn sign(&self, config: &ClusterConfig, signer: &dyn Signer) -> TxResult<WireTransaction> {
        let mut tx = Transaction::new_unsigned(self.build_message(config)?);
        tx.sign(&[signer])?;
        let wire = tx.assemble(&TransactionAssembler::new(config))?;

        debug!(
            "signed transfer of {} lamports on {}: {} bytes",
            self.lamports,
            config.name,
            wire.len()
        );
        Ok(wire)
    }
}
