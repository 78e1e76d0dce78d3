use std::fmt;
use std::str::FromStr;

use crate::error::{TxError, TxResult};

/// Byte length of an Ed25519 signature.
pub const SIGNATURE_BYTES: usize = 64;

/// A 64-byte Ed25519 signature.
///
/// The all-zero value is the placeholder used for signer slots that have
/// not been signed yet.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_BYTES]);

impl Signature {
    pub const fn new_from_array(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; SIGNATURE_BYTES] {
        self.0
    }

    /// Whether this is the unsigned placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self([0u8; SIGNATURE_BYTES])
    }
}

impl From<[u8; SIGNATURE_BYTES]> for Signature {
    fn from(bytes: [u8; SIGNATURE_BYTES]) -> Self {
        Self(bytes)
    }
}

impl From<ed25519_dalek::Signature> for Signature {
    fn from(sig: ed25519_dalek::Signature) -> Self {
        Self(sig.to_bytes())
    }
}

impl TryFrom<&[u8]> for Signature {
    type Error = TxError;

    fn try_from(bytes: &[u8]) -> TxResult<Self> {
        let arr: [u8; SIGNATURE_BYTES] =
            bytes.try_into().map_err(|_| TxError::InvalidSignature {
                indices: vec![0],
                reason: format!("expected {SIGNATURE_BYTES} bytes, got {}", bytes.len()),
            })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Signature {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Signature {
    type Err = TxError;

    fn from_str(s: &str) -> TxResult<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| TxError::MalformedInput(format!("signature: base58 decode failed: {e}")))?;
        Signature::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}
