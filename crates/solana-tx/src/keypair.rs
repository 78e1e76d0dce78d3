//! Ed25519 keypairs.
//!
//! The 64-byte secret key layout is `seed || pubkey`, Base58-encoded when
//! shown as text. Persisting keypairs to disk is left to the caller.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::error::{TxError, TxResult};
use crate::pubkey::Pubkey;
use crate::signature::Signature;
use crate::signer::{signing_key_from_seed, Signer, SEED_BYTES};

/// Byte length of a full secret key (`seed || pubkey`).
pub const KEYPAIR_BYTES: usize = 64;

/// An Ed25519 signing key and its public key.
///
/// Not `Clone`: copies of secret material should be explicit.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS random number generator.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from a raw 32-byte seed.
    pub fn from_seed(seed: &[u8]) -> TxResult<Self> {
        Ok(Self {
            signing_key: signing_key_from_seed(seed)?,
        })
    }

    /// Build a keypair from a 64-byte `seed || pubkey` secret key.
    ///
    /// The embedded public key must match the one derived from the seed.
    pub fn from_bytes(bytes: &[u8]) -> TxResult<Self> {
        if bytes.len() != KEYPAIR_BYTES {
            return Err(TxError::InvalidKeyMaterial(format!(
                "expected {KEYPAIR_BYTES}-byte secret key, got {} bytes",
                bytes.len()
            )));
        }

        let keypair = Self::from_seed(&bytes[..SEED_BYTES])?;
        if keypair.pubkey().as_ref() != &bytes[SEED_BYTES..] {
            return Err(TxError::InvalidKeyMaterial(
                "embedded public key does not match seed".into(),
            ));
        }
        Ok(keypair)
    }

    /// Parse a Base58-encoded 64-byte secret key.
    pub fn from_base58_string(s: &str) -> TxResult<Self> {
        let bytes = Zeroizing::new(bs58::decode(s).into_vec().map_err(|e| {
            TxError::InvalidKeyMaterial(format!("base58 decode failed: {e}"))
        })?);
        Self::from_bytes(&bytes)
    }

    /// The 64-byte `seed || pubkey` secret key.
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEYPAIR_BYTES]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// The secret key as Base58 text.
    pub fn to_base58_string(&self) -> Zeroizing<String> {
        Zeroizing::new(bs58::encode(&self.to_bytes()[..]).into_string())
    }

    /// A copy of the raw 32-byte seed, wiped when dropped.
    pub fn seed(&self) -> Zeroizing<[u8; SEED_BYTES]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey::from(self.signing_key.verifying_key().to_bytes())
    }

    pub fn pubkey_base58(&self) -> String {
        self.pubkey().to_string()
    }

    /// Sign arbitrary bytes.
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message).into()
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Pubkey {
        Keypair::pubkey(self)
    }

    fn try_sign_message(&self, message: &[u8]) -> TxResult<Signature> {
        Ok(self.sign_message(message))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}
