pub(crate) mod blob;
pub(crate) mod commit;
pub(crate) mod tree;

pub use blob::Blob;
pub use commit::{Commit, Signature, Timestamp};
pub use tree::{Mode, Tree, TreeEntry, TreeRecords};

use super::{Error, Result, Sha1Hash};
use bytes::Bytes;
use std::fmt;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }

    /// `"<kind> <len>\0"`, the prefix every stored record and digest starts with.
    pub fn header(&self, len: usize) -> Vec<u8> {
        format!("{} {len}\0", self.as_str()).into_bytes()
    }

    /// Canonical encoding of a payload of this kind.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut buf = self.header(payload.len());
        buf.extend_from_slice(payload);
        buf
    }
}

impl FromStr for ObjectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(Self::Blob),
            "tree" => Ok(Self::Tree),
            "commit" => Ok(Self::Commit),
            _ => Err(Error::CorruptObject(format!("unknown object kind: {s:?}"))),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GitObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Box<Commit>),
}

impl GitObject {
    pub fn new_blob<R: Read>(mut content: R) -> Result<Self> {
        let mut buf = vec![];
        content.read_to_end(&mut buf)?;
        Ok(Self::Blob(Blob::from(Bytes::from(buf))))
    }

    /// Rebuilds a typed object from a kind and its raw payload.
    pub fn decode(kind: ObjectKind, payload: &[u8]) -> Result<Self> {
        let obj = match kind {
            ObjectKind::Blob => Self::Blob(Blob::from(Bytes::copy_from_slice(payload))),
            ObjectKind::Tree => Self::Tree(Tree::parse(payload)?),
            ObjectKind::Commit => Self::Commit(Box::new(Commit::parse(payload)?)),
        };
        Ok(obj)
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }

    pub fn payload(&self) -> Vec<u8> {
        match self {
            Self::Blob(blob) => blob.as_ref().to_vec(),
            Self::Tree(tree) => tree.serialize(),
            Self::Commit(commit) => commit.serialize(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.kind().encode(&self.payload())
    }

    /// Always recomputed from the encoding, never cached.
    pub fn hash(&self) -> Sha1Hash {
        Sha1Hash::digest(&self.encode())
    }
}

/// Splits a decompressed record into its kind and payload, checking the
/// declared length against what actually follows the header.
pub(crate) fn split_record(data: &[u8]) -> Result<(ObjectKind, &[u8])> {
    let zero_pos = zero_position(data)
        .ok_or_else(|| Error::CorruptObject("Not found \\0 in git object header".into()))?;
    let header = std::str::from_utf8(&data[..zero_pos])
        .map_err(|err| Error::CorruptObject(format!("Cannot stringify object header. {err}")))?;
    let (kind, size) = header
        .split_once(' ')
        .ok_or_else(|| Error::CorruptObject(format!("malformed object header: {header:?}")))?;

    let kind = kind.parse::<ObjectKind>()?;
    let size = size
        .parse::<usize>()
        .map_err(|err| Error::CorruptObject(format!("bad object size {size:?}. {err}")))?;

    let payload = &data[(zero_pos + 1)..];
    if payload.len() != size {
        return Err(Error::CorruptObject(format!(
            "{kind} header declares {size} bytes but payload has {}",
            payload.len()
        )));
    }

    Ok((kind, payload))
}

impl fmt::Display for GitObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob(blob) => fmt::Display::fmt(blob, f),
            Self::Tree(tree) => fmt::Display::fmt(tree, f),
            Self::Commit(commit) => fmt::Display::fmt(commit, f),
        }
    }
}

fn position(bytes: &[u8], byte: u8) -> Option<usize> {
    bytes.iter().position(|&b| b == byte)
}

fn zero_position(bytes: &[u8]) -> Option<usize> {
    position(bytes, b'\0')
}

fn space_position(bytes: &[u8]) -> Option<usize> {
    position(bytes, b' ')
}
