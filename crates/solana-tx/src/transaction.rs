//! Signed transactions and their wire format.
//!
//! ```text
//! Transaction:
//!   num_signatures          compact length
//!   signatures              64 bytes * num_signatures
//!   message                 see `Message::serialize`
//! ```
//!
//! Signatures sit in the same order as the signer prefix of the message's
//! account table. The assembled bytes are what the RPC layer Base58- or
//! Base64-encodes for `sendTransaction` / `simulateTransaction`.

use std::fmt;

use base64::Engine as _;
use log::debug;

use crate::cluster::{ClusterConfig, PACKET_DATA_SIZE};
use crate::compact::{self, Reader};
use crate::error::{TxError, TxResult};
use crate::message::Message;
use crate::signature::{Signature, SIGNATURE_BYTES};
use crate::signer::{self, Signer};

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Joins a message and its signatures into wire bytes, enforcing the
/// cluster's packet ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionAssembler {
    max_packet_size: usize,
}

impl TransactionAssembler {
    /// An assembler using `config`'s packet ceiling.
    pub fn new(config: &ClusterConfig) -> Self {
        Self::with_max_packet_size(config.max_packet_size)
    }

    /// An assembler with an explicit packet ceiling, in bytes.
    pub fn with_max_packet_size(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    /// Largest wire size `assemble` accepts, inclusive.
    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Validate and concatenate `signatures` with the serialized `message`.
    ///
    /// Checks run in this order:
    ///   1. one signature per required signer, else `MissingSignature`;
    ///   2. every signature is 64 bytes, else `InvalidSignature`;
    ///   3. the total fits the packet ceiling, else `TransactionTooLarge`;
    ///   4. no signature is the all-zero placeholder, else `MissingSignature`.
    pub fn assemble<S: AsRef<[u8]>>(
        &self,
        message: &Message,
        signatures: &[S],
    ) -> TxResult<WireTransaction> {
        let expected = message.num_required_signatures();
        let provided = signatures.len();
        if provided != expected {
            return Err(TxError::MissingSignature {
                expected,
                provided,
                missing: (provided..expected).collect(),
            });
        }

        let bad_lengths: Vec<(usize, usize)> = signatures
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.as_ref().len()))
            .filter(|&(_, len)| len != SIGNATURE_BYTES)
            .collect();
        if !bad_lengths.is_empty() {
            return Err(TxError::InvalidSignature {
                indices: bad_lengths.iter().map(|&(i, _)| i).collect(),
                reason: format!(
                    "expected {SIGNATURE_BYTES} bytes, got {:?}",
                    bad_lengths.iter().map(|&(_, len)| len).collect::<Vec<_>>()
                ),
            });
        }

        let message_bytes = message.serialize()?;
        let size =
            compact::encoded_len(provided)? + SIGNATURE_BYTES * provided + message_bytes.len();
        if size > self.max_packet_size {
            return Err(TxError::TransactionTooLarge {
                size,
                max: self.max_packet_size,
                overflow: size - self.max_packet_size,
            });
        }

        let unsigned: Vec<usize> = signatures
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().iter().all(|&b| b == 0))
            .map(|(i, _)| i)
            .collect();
        if !unsigned.is_empty() {
            return Err(TxError::MissingSignature {
                expected,
                provided: expected - unsigned.len(),
                missing: unsigned,
            });
        }

        let mut wire = Vec::with_capacity(size);
        compact::write_length(&mut wire, provided)?;
        for sig in signatures {
            wire.extend_from_slice(sig.as_ref());
        }
        wire.extend_from_slice(&message_bytes);

        debug!(
            "assembled transaction: {} signatures, {} of {} bytes",
            provided, size, self.max_packet_size
        );

        Ok(WireTransaction(wire))
    }
}

impl Default for TransactionAssembler {
    fn default() -> Self {
        Self::with_max_packet_size(PACKET_DATA_SIZE)
    }
}

/// Assemble with the default 1232-byte ceiling.
pub fn assemble<S: AsRef<[u8]>>(message: &Message, signatures: &[S]) -> TxResult<WireTransaction> {
    TransactionAssembler::default().assemble(message, signatures)
}

// ---------------------------------------------------------------------------
// Wire bytes
// ---------------------------------------------------------------------------

/// A fully signed transaction in wire format. Never mutated once built.
#[derive(Clone, PartialEq, Eq)]
pub struct WireTransaction(Vec<u8>);

impl WireTransaction {
    /// The raw wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Take the raw wire bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Wire size in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for an assembled transaction.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Base58 text, the default `sendTransaction` encoding.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Standard-alphabet Base64 text, for `{"encoding":"base64"}`.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.0)
    }

    /// The fee payer's signature, which doubles as the transaction id.
    pub fn signature(&self) -> Option<Signature> {
        let (count, offset) = compact::decode_length(&self.0).ok()?;
        if count == 0 {
            return None;
        }
        let bytes = self.0.get(offset..offset + SIGNATURE_BYTES)?;
        Signature::try_from(bytes).ok()
    }
}

impl AsRef<[u8]> for WireTransaction {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WireTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireTransaction")
            .field("len", &self.0.len())
            .field("signature", &self.signature())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A message plus one signature slot per required signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    signatures: Vec<Signature>,
    message: Message,
}

impl Transaction {
    /// Wrap a message with every signature slot empty.
    pub fn new_unsigned(message: Message) -> Self {
        Self {
            signatures: vec![Signature::default(); message.num_required_signatures()],
            message,
        }
    }

    /// The message being signed.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// One slot per required signer, in signer order. Unsigned slots hold
    /// the all-zero placeholder.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The bytes every signer signs.
    pub fn message_data(&self) -> TxResult<Vec<u8>> {
        self.message.serialize()
    }

    /// Sign with each of `signers`, placing every signature in its signer's
    /// slot. Slots for signers not supplied stay empty.
    ///
    /// On error the transaction is left exactly as it was.
    pub fn sign(&mut self, signers: &[&dyn Signer]) -> TxResult<()> {
        let indices = signers
            .iter()
            .map(|signer| {
                let pubkey = signer.pubkey();
                self.message
                    .signer_keys()
                    .iter()
                    .position(|k| *k == pubkey)
                    .ok_or_else(|| TxError::SignerNotFound(pubkey.to_string()))
            })
            .collect::<TxResult<Vec<usize>>>()?;

        let message_bytes = self.message.serialize()?;
        let mut signatures = self.signatures.clone();
        for (signer, index) in signers.iter().zip(indices) {
            signatures[index] = signer.try_sign_message(&message_bytes)?;
        }

        self.signatures = signatures;
        Ok(())
    }

    /// Whether every slot holds a signature.
    pub fn is_signed(&self) -> bool {
        self.signatures.iter().all(|s| !s.is_placeholder())
    }

    /// Verify every signature against its signer key.
    pub fn verify(&self) -> TxResult<()> {
        let message_bytes = self.message.serialize()?;
        let failed: Vec<usize> = self
            .message
            .signer_keys()
            .iter()
            .zip(&self.signatures)
            .enumerate()
            .filter(|(_, (key, sig))| !signer::verify(key, &message_bytes, sig))
            .map(|(i, _)| i)
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(TxError::InvalidSignature {
                indices: failed,
                reason: "signature does not verify against signer key".into(),
            })
        }
    }

    /// Produce the final wire bytes. Consumes the transaction: re-signing
    /// means building a new one.
    pub fn assemble(self, assembler: &TransactionAssembler) -> TxResult<WireTransaction> {
        assembler.assemble(&self.message, &self.signatures)
    }

    /// Parse wire bytes back into a transaction.
    pub fn from_wire(bytes: &[u8]) -> TxResult<Self> {
        parse_wire(bytes).map(|(tx, _)| tx)
    }
}

/// Parse wire bytes, returning the transaction and the offset at which the
/// message starts.
fn parse_wire(bytes: &[u8]) -> TxResult<(Transaction, usize)> {
    let mut reader = Reader::new(bytes);

    let count = reader.read_length()?;
    let mut signatures = Vec::with_capacity(count.min(u8::MAX as usize));
    for _ in 0..count {
        signatures.push(Signature::from(
            reader.read_array::<SIGNATURE_BYTES>("signature")?,
        ));
    }

    let message_offset = reader.position();
    let message = Message::read_from(&mut reader)?;
    if reader.remaining() != 0 {
        return Err(TxError::MalformedInput(format!(
            "{} trailing bytes after transaction",
            reader.remaining()
        )));
    }
    if count != message.num_required_signatures() {
        return Err(TxError::MalformedInput(format!(
            "{count} signature slots but message requires {}",
            message.num_required_signatures()
        )));
    }

    Ok((
        Transaction {
            signatures,
            message,
        },
        message_offset,
    ))
}

/// Fill `signer`'s slot in a pre-built wire transaction.
///
/// The message bytes are signed exactly as received and left untouched;
/// only the 64 bytes of the matching signature slot change. Other slots
/// keep whatever they held.
pub fn sign_raw_transaction(signer: &dyn Signer, raw_tx: &[u8]) -> TxResult<WireTransaction> {
    let (tx, message_offset) = parse_wire(raw_tx)?;
    let pubkey = signer.pubkey();

    let index = tx
        .message
        .signer_keys()
        .iter()
        .position(|k| *k == pubkey)
        .ok_or_else(|| TxError::SignerNotFound(pubkey.to_string()))?;

    let signature = signer.try_sign_message(&raw_tx[message_offset..])?;

    let sigs_start = compact::encoded_len(tx.signatures.len())?;
    let slot = sigs_start + index * SIGNATURE_BYTES;
    let mut signed = raw_tx.to_vec();
    signed[slot..slot + SIGNATURE_BYTES].copy_from_slice(signature.as_ref());

    debug!("filled signer slot {index} of {}", tx.signatures.len());

    Ok(WireTransaction(signed))
}
