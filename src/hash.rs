use super::{Error, Result};
use sha1::{Digest, Sha1};
use std::fmt;

pub const SHA1_HASH_SIZE: usize = 20;
pub const SHA1_HEX_SIZE: usize = SHA1_HASH_SIZE * 2;

/// Raw 20-byte SHA-1 digest identifying an object.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sha1Hash([u8; SHA1_HASH_SIZE]);

impl Sha1Hash {
    pub fn hasher() -> Sha1 {
        Sha1::new()
    }

    pub fn new(hasher: Sha1) -> Self {
        Self(hasher.finalize().into())
    }

    /// Hashes `bytes` in one shot.
    pub fn digest(bytes: &[u8]) -> Self {
        Self::new(Self::hasher().chain_update(bytes))
    }

    /// Parses exactly 40 hex characters. Upper case input is accepted.
    pub fn from_hex(hex: &str) -> Result<Self> {
        if hex.len() != SHA1_HEX_SIZE {
            return Err(Error::InvalidArgs(format!(
                "SHA-1 hash must be {SHA1_HEX_SIZE}-characters long: {hex:?}"
            )));
        }

        let mut buf = [0u8; SHA1_HASH_SIZE];
        hex::decode_to_slice(hex, &mut buf)
            .map_err(|err| Error::InvalidArgs(format!("invalid SHA-1 hash {hex:?}. {err}")))?;
        Ok(Self(buf))
    }

    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Sha1Hash {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; SHA1_HASH_SIZE] = bytes.try_into().map_err(|_| {
            Error::CorruptObject(format!(
                "SHA-1 hash must be {SHA1_HASH_SIZE}-bytes long, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }
}

impl From<[u8; SHA1_HASH_SIZE]> for Sha1Hash {
    fn from(value: [u8; SHA1_HASH_SIZE]) -> Self {
        Self(value)
    }
}

impl fmt::Display for Sha1Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}
