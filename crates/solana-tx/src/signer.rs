//! Ed25519 signing over serialized message bytes.
//!
//! Signing is deterministic: the same seed and message always produce the
//! same signature, which the tests rely on.

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use log::trace;
use zeroize::Zeroize;

use crate::error::{TxError, TxResult};
use crate::pubkey::Pubkey;
use crate::signature::Signature;

/// Byte length of an Ed25519 seed.
pub const SEED_BYTES: usize = 32;

/// Anything that can produce signatures for a given public key.
pub trait Signer {
    fn pubkey(&self) -> Pubkey;

    fn try_sign_message(&self, message: &[u8]) -> TxResult<Signature>;
}

/// Sign `message` with the Ed25519 key derived from a raw 32-byte `seed`.
///
/// Fails with [`TxError::InvalidKeyMaterial`] if the seed has any other
/// length.
pub fn sign(message: &[u8], seed: &[u8]) -> TxResult<Signature> {
    let signing_key = signing_key_from_seed(seed)?;
    trace!("signing {} message bytes", message.len());
    Ok(signing_key.sign(message).into())
}

/// Derive the public key belonging to a raw 32-byte `seed`.
pub fn pubkey_from_seed(seed: &[u8]) -> TxResult<Pubkey> {
    let signing_key = signing_key_from_seed(seed)?;
    Ok(Pubkey::from(signing_key.verifying_key().to_bytes()))
}

/// Check `signature` over `message` against `pubkey`.
///
/// Uses strict verification, so small-order keys and malleable signatures
/// are rejected. Keys that are not valid curve points never verify.
pub fn verify(pubkey: &Pubkey, message: &[u8], signature: &Signature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(pubkey.as_array()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(&signature.to_bytes());
    verifying_key.verify_strict(message, &sig).is_ok()
}

pub(crate) fn signing_key_from_seed(seed: &[u8]) -> TxResult<SigningKey> {
    let mut bytes: [u8; SEED_BYTES] = seed.try_into().map_err(|_| {
        TxError::InvalidKeyMaterial(format!(
            "expected {SEED_BYTES}-byte seed, got {} bytes",
            seed.len()
        ))
    })?;
    // SigningKey zeroizes itself on drop; wipe our stack copy too.
    let signing_key = SigningKey::from_bytes(&bytes);
    bytes.zeroize();
    Ok(signing_key)
}
