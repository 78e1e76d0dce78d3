//! Unsigned transaction messages.
//!
//! ```text
//! Message:
//!   num_required_sigs     u8
//!   num_readonly_signed   u8
//!   num_readonly_unsigned u8
//!   num_accounts          compact length
//!   account_keys          32 bytes * num_accounts
//!   recent_blockhash      32 bytes
//!   num_instructions      compact length
//!   instructions[]        see `CompiledInstruction::encode`
//! ```
//!
//! The account table is ordered writable signers, read-only signers,
//! writable non-signers, read-only non-signers. The header counts are what
//! let the runtime recover each account's role from its position.

use std::collections::HashSet;

use log::debug;

use crate::compact::{self, Reader};
use crate::error::{TxError, TxResult};
use crate::instruction::{CompiledInstruction, Instruction};
use crate::pubkey::{Hash, Pubkey, HASH_BYTES, PUBKEY_BYTES};

/// An instruction's account indices are single bytes.
pub const MAX_ACCOUNTS: usize = u8::MAX as usize + 1;

/// Role counts that prefix every message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageHeader {
    /// The first this-many account keys must sign.
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed_accounts: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned_accounts: u8,
}

impl MessageHeader {
    pub fn to_bytes(self) -> [u8; 3] {
        [
            self.num_required_signatures,
            self.num_readonly_signed_accounts,
            self.num_readonly_unsigned_accounts,
        ]
    }
}

/// An unsigned message. Its serialized form is what every signer signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    header: MessageHeader,
    account_keys: Vec<Pubkey>,
    recent_blockhash: Hash,
    instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Assemble a message from already-compiled parts, checking every
    /// structural invariant.
    pub fn new(
        header: MessageHeader,
        account_keys: Vec<Pubkey>,
        recent_blockhash: Hash,
        instructions: Vec<CompiledInstruction>,
    ) -> TxResult<Self> {
        let message = Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
        };
        message.sanitize()?;
        Ok(message)
    }

    /// Compile role-tagged instructions into a message paid for by
    /// `fee_payer`.
    ///
    /// Accounts are deduplicated by key. When the same key appears in
    /// several roles its flags are merged, so a key that signs anywhere
    /// signs everywhere. Program ids are added as read-only non-signers.
    /// An empty instruction list is allowed and compiles to a message that
    /// does nothing.
    pub fn compile(
        fee_payer: &Pubkey,
        instructions: &[Instruction],
        recent_blockhash: &Hash,
    ) -> TxResult<Self> {
        struct AccountEntry {
            pubkey: Pubkey,
            is_signer: bool,
            is_writable: bool,
        }

        let mut entries: Vec<AccountEntry> = Vec::new();
        let mut upsert = |pubkey: Pubkey, signer: bool, writable: bool| {
            if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
                entry.is_signer |= signer;
                entry.is_writable |= writable;
            } else {
                entries.push(AccountEntry {
                    pubkey,
                    is_signer: signer,
                    is_writable: writable,
                });
            }
        };

        // Fee payer is always signer + writable, and goes first.
        upsert(*fee_payer, true, true);
        for ix in instructions {
            for meta in &ix.accounts {
                upsert(meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(ix.program_id, false, false);
        }

        // Stable sort: insertion order survives within each role, and the
        // fee payer is the first writable signer.
        entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
            (true, true) => 0u8,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        });

        if entries.len() > MAX_ACCOUNTS {
            return Err(TxError::InvalidMessage(format!(
                "{} accounts exceed the {MAX_ACCOUNTS} addressable by an instruction",
                entries.len()
            )));
        }

        let num_signers = entries.iter().filter(|e| e.is_signer).count();
        let num_readonly_signed = entries
            .iter()
            .filter(|e| e.is_signer && !e.is_writable)
            .count();
        let num_readonly_unsigned = entries
            .iter()
            .filter(|e| !e.is_signer && !e.is_writable)
            .count();
        let header = MessageHeader {
            num_required_signatures: role_count(num_signers)?,
            num_readonly_signed_accounts: role_count(num_readonly_signed)?,
            num_readonly_unsigned_accounts: role_count(num_readonly_unsigned)?,
        };

        let account_keys: Vec<Pubkey> = entries.iter().map(|e| e.pubkey).collect();

        // Replace keys with their deduplicated table positions.
        let index_of = |key: &Pubkey| -> TxResult<u8> {
            account_keys
                .iter()
                .position(|k| k == key)
                .map(|i| i as u8)
                .ok_or_else(|| TxError::InvalidMessage(format!("account {key} not in table")))
        };
        let compiled = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    account_indices: ix
                        .accounts
                        .iter()
                        .map(|meta| index_of(&meta.pubkey))
                        .collect::<TxResult<Vec<u8>>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<TxResult<Vec<_>>>()?;

        debug!(
            "compiled message: {} accounts, {} signers, {} instructions",
            account_keys.len(),
            header.num_required_signatures,
            compiled.len()
        );

        Self::new(header, account_keys, *recent_blockhash, compiled)
    }

    /// Check the header against the account table and every instruction
    /// index against the table length.
    pub fn sanitize(&self) -> TxResult<()> {
        let num_keys = self.account_keys.len();
        let required = self.header.num_required_signatures as usize;
        let readonly_signed = self.header.num_readonly_signed_accounts as usize;
        let readonly_unsigned = self.header.num_readonly_unsigned_accounts as usize;

        if num_keys > MAX_ACCOUNTS {
            return Err(TxError::InvalidMessage(format!(
                "{num_keys} accounts exceed the {MAX_ACCOUNTS} addressable by an instruction"
            )));
        }
        if required == 0 {
            return Err(TxError::InvalidMessage(
                "at least one signer (the fee payer) is required".into(),
            ));
        }
        if required > num_keys {
            return Err(TxError::InvalidMessage(format!(
                "{required} required signatures but only {num_keys} accounts"
            )));
        }
        if readonly_signed >= required {
            return Err(TxError::InvalidMessage(
                "fee payer must be a writable signer".into(),
            ));
        }
        if readonly_unsigned > num_keys - required {
            return Err(TxError::InvalidMessage(format!(
                "{readonly_unsigned} read-only unsigned accounts but only {} non-signers",
                num_keys - required
            )));
        }

        let mut seen = HashSet::with_capacity(num_keys);
        if let Some(dup) = self.account_keys.iter().find(|k| !seen.insert(*k)) {
            return Err(TxError::InvalidMessage(format!(
                "account {dup} appears more than once in the table"
            )));
        }

        for (i, ix) in self.instructions.iter().enumerate() {
            if let Some(index) = ix.indices().find(|&idx| idx as usize >= num_keys) {
                return Err(TxError::AccountIndexOutOfRange {
                    instruction: i,
                    index,
                    num_accounts: num_keys,
                });
            }
            // Programs are invoked, never paid from or signed by.
            let program = ix.program_id_index as usize;
            if self.is_signer(program) || self.is_writable(program) {
                return Err(TxError::InvalidMessage(format!(
                    "instruction {i} invokes account {program}, which is a signer or writable"
                )));
            }
        }

        Ok(())
    }

    /// Role counts prefixing the account table.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The deduplicated account table, in role order.
    pub fn account_keys(&self) -> &[Pubkey] {
        &self.account_keys
    }

    /// The blockhash this message is bound to.
    pub fn recent_blockhash(&self) -> &Hash {
        &self.recent_blockhash
    }

    /// Instructions with their accounts resolved to table indices.
    pub fn instructions(&self) -> &[CompiledInstruction] {
        &self.instructions
    }

    /// How many signatures the transaction must carry.
    pub fn num_required_signatures(&self) -> usize {
        self.header.num_required_signatures as usize
    }

    /// The fee payer is always the first account.
    pub fn fee_payer(&self) -> &Pubkey {
        &self.account_keys[0]
    }

    /// The keys that must sign, in signature order.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.num_required_signatures()]
    }

    /// Whether the account at `index` must sign.
    pub fn is_signer(&self, index: usize) -> bool {
        index < self.num_required_signatures()
    }

    /// Whether the account at `index` may be written, derived from its
    /// position and the header counts. Out-of-range indices are not.
    pub fn is_writable(&self, index: usize) -> bool {
        let required = self.num_required_signatures();
        if index >= self.account_keys.len() {
            return false;
        }
        if index < required {
            index < required - self.header.num_readonly_signed_accounts as usize
        } else {
            let unsigned = index - required;
            let writable_unsigned = self.account_keys.len()
                - required
                - self.header.num_readonly_unsigned_accounts as usize;
            unsigned < writable_unsigned
        }
    }

    /// Serialize to the bytes that get signed.
    pub fn serialize(&self) -> TxResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.serialized_len()?);

        buf.extend_from_slice(&self.header.to_bytes());

        compact::write_length(&mut buf, self.account_keys.len())?;
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_ref());
        }

        buf.extend_from_slice(self.recent_blockhash.as_ref());

        compact::write_length(&mut buf, self.instructions.len())?;
        for ix in &self.instructions {
            ix.write_to(&mut buf)?;
        }

        Ok(buf)
    }

    /// Length of [`Message::serialize`]'s output, without building it.
    pub fn serialized_len(&self) -> TxResult<usize> {
        let mut len = 3
            + compact::encoded_len(self.account_keys.len())?
            + self.account_keys.len() * PUBKEY_BYTES
            + HASH_BYTES
            + compact::encoded_len(self.instructions.len())?;
        for ix in &self.instructions {
            len += ix.encoded_len()?;
        }
        Ok(len)
    }

    /// Parse a serialized message. The whole input must be consumed.
    pub fn deserialize(bytes: &[u8]) -> TxResult<Self> {
        let mut reader = Reader::new(bytes);
        let message = Self::read_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(TxError::MalformedInput(format!(
                "{} trailing bytes after message",
                reader.remaining()
            )));
        }
        Ok(message)
    }

    pub(crate) fn read_from(reader: &mut Reader<'_>) -> TxResult<Self> {
        let header = MessageHeader {
            num_required_signatures: reader.read_u8("header")?,
            num_readonly_signed_accounts: reader.read_u8("header")?,
            num_readonly_unsigned_accounts: reader.read_u8("header")?,
        };

        let num_keys = reader.read_length()?;
        let mut account_keys = Vec::with_capacity(num_keys.min(MAX_ACCOUNTS));
        for _ in 0..num_keys {
            account_keys.push(Pubkey::from(reader.read_array::<PUBKEY_BYTES>("account key")?));
        }

        let recent_blockhash = Hash::from(reader.read_array::<HASH_BYTES>("recent blockhash")?);

        let num_instructions = reader.read_length()?;
        let mut instructions = Vec::with_capacity(num_instructions.min(64));
        for _ in 0..num_instructions {
            let program_id_index = reader.read_u8("program id index")?;
            let num_indices = reader.read_length()?;
            let account_indices = reader.read_slice(num_indices, "account indices")?.to_vec();
            let data_len = reader.read_length()?;
            let data = reader.read_slice(data_len, "instruction data")?.to_vec();
            instructions.push(CompiledInstruction {
                program_id_index,
                account_indices,
                data,
            });
        }

        Self::new(header, account_keys, recent_blockhash, instructions)
    }
}

fn role_count(n: usize) -> TxResult<u8> {
    u8::try_from(n).map_err(|_| TxError::InvalidMessage(format!("{n} accounts in one role")))
}
