//! Public keys and blockhashes.
//!
//! Both are 32 raw bytes shown as Base58 text (the Bitcoin alphabet, which is
//! what `bs58` uses by default). A public key is the Ed25519 verifying key
//! itself; there is no hashing step between key and address.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TxError, TxResult};

/// Byte length of a public key.
pub const PUBKEY_BYTES: usize = 32;

/// Byte length of a blockhash.
pub const HASH_BYTES: usize = 32;

/// Decode a Base58 address into its 32 raw bytes.
///
/// Fails with [`TxError::InvalidPublicKey`] if the text is not Base58 or
/// does not decode to exactly 32 bytes.
pub fn address_to_bytes(address: &str) -> TxResult<[u8; 32]> {
    decode_32(address).map_err(TxError::InvalidPublicKey)
}

/// Encode 32 raw bytes as a Base58 address.
pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

fn decode_32(text: &str) -> Result<[u8; 32], String> {
    let bytes = bs58::decode(text)
        .into_vec()
        .map_err(|e| format!("base58 decode failed: {e}"))?;

    bytes
        .try_into()
        .map_err(|v: Vec<u8>| format!("expected 32 bytes, got {}", v.len()))
}

// ---------------------------------------------------------------------------
// Pubkey
// ---------------------------------------------------------------------------

/// A 32-byte account identifier. Equality is byte equality.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pubkey([u8; PUBKEY_BYTES]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; PUBKEY_BYTES] {
        self.0
    }

    pub fn as_array(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }
}

impl From<[u8; PUBKEY_BYTES]> for Pubkey {
    fn from(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Pubkey {
    type Error = TxError;

    fn try_from(bytes: &[u8]) -> TxResult<Self> {
        let arr: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
            TxError::InvalidPublicKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = TxError;

    fn from_str(s: &str) -> TxResult<Self> {
        address_to_bytes(s).map(Self)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes_to_address(&self.0))
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hash
// ---------------------------------------------------------------------------

/// A recent blockhash, bound into every message.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_BYTES]);

impl Hash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }

    pub fn as_array(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }
}

impl From<[u8; HASH_BYTES]> for Hash {
    fn from(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = TxError;

    fn from_str(s: &str) -> TxResult<Self> {
        decode_32(s)
            .map(Self)
            .map_err(|e| TxError::MalformedInput(format!("blockhash: {e}")))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({self})")
    }
}
