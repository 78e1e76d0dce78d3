//! Instructions, before and after compilation against an account table.

use crate::compact;
use crate::error::TxResult;
use crate::pubkey::Pubkey;

/// A single account reference in an instruction, tagged with its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    /// A writable account.
    pub fn new(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// A read-only account.
    pub fn new_readonly(pubkey: Pubkey, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// An instruction that references accounts by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

impl Instruction {
    pub fn new(program_id: Pubkey, accounts: Vec<AccountMeta>, data: Vec<u8>) -> Self {
        Self {
            program_id,
            accounts,
            data,
        }
    }
}

/// An instruction whose account references are indices into the message's
/// account table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index of the program to invoke.
    pub program_id_index: u8,
    /// Indices of the accounts the instruction reads or writes, in order.
    pub account_indices: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

impl CompiledInstruction {
    pub fn new(program_id_index: u8, account_indices: Vec<u8>, data: Vec<u8>) -> Self {
        Self {
            program_id_index,
            account_indices,
            data,
        }
    }

    /// Serialize as `program_id_index | compact(indices) | compact(data)`.
    ///
    /// Only the byte layout is checked here; whether the program accepts
    /// this data is the caller's concern.
    pub fn encode(&self) -> TxResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len()?);
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) -> TxResult<()> {
        buf.push(self.program_id_index);
        compact::write_bytes(buf, &self.account_indices)?;
        compact::write_bytes(buf, &self.data)
    }

    pub(crate) fn encoded_len(&self) -> TxResult<usize> {
        Ok(1 + compact::encoded_len(self.account_indices.len())?
            + self.account_indices.len()
            + compact::encoded_len(self.data.len())?
            + self.data.len())
    }

    /// Every table index this instruction touches, program first.
    pub(crate) fn indices(&self) -> impl Iterator<Item = u8> + '_ {
        std::iter::once(self.program_id_index).chain(self.account_indices.iter().copied())
    }
}

/// Encode one instruction from its raw parts.
pub fn encode_instruction(
    program_id_index: u8,
    account_indices: &[u8],
    data: &[u8],
) -> TxResult<Vec<u8>> {
    CompiledInstruction::new(program_id_index, account_indices.to_vec(), data.to_vec()).encode()
}
