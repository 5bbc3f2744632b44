use super::{space_position, zero_position, Error, Result, Sha1Hash};
use crate::hash::SHA1_HASH_SIZE;
use std::{cmp::Ordering, collections::HashSet, fmt, str::FromStr};

const MODE_DIR: isize = 40000;
const MODE_FILE: isize = 100644;
const MODE_EXEC: isize = 100755;
const MODE_SYML: isize = 120000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    File = MODE_FILE,
    Executable = MODE_EXEC,
    Symlink = MODE_SYML,
    Directory = MODE_DIR,
}

impl Mode {
    pub fn is_tree(&self) -> bool {
        *self == Self::Directory
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "100644" => Ok(Self::File),
            "100755" => Ok(Self::Executable),
            "120000" => Ok(Self::Symlink),
            "40000" => Ok(Self::Directory),
            _ => Err(Error::CorruptObject(format!("Unknown mode: {s:?}"))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as isize)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    mode: Mode,
    name: String,
    hash: Sha1Hash,
}

impl TreeEntry {
    pub fn new(mode: Mode, name: impl Into<String>, hash: Sha1Hash) -> Result<Self> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(Error::InvalidArgs(format!("invalid tree entry name: {name:?}")));
        }
        Ok(Self { mode, name, hash })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn hash(&self) -> Sha1Hash {
        self.hash
    }

    /// `"<mode> <name>\0"` followed by the raw 20-byte digest.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(format!("{} {}\0", self.mode, self.name).as_bytes());
        buf.extend_from_slice(self.hash.as_bytes());
    }

    pub fn serialized_len(&self) -> usize {
        self.mode.to_string().len() + 1 + self.name.len() + 1 + SHA1_HASH_SIZE
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

impl fmt::Display for TreeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:06} {} {}\t{}",
            self.mode as isize,
            if self.mode.is_tree() { "tree" } else { "blob" },
            self.hash.hex(),
            self.name,
        )
    }
}

/// Entries of one directory, always held in ascending byte order of name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        entries.sort();
        if let Some(dup) = entries.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(Error::DuplicateEntry(dup[0].name.clone()));
        }
        Ok(Self { entries })
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let entries = TreeRecords::new(bytes).collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        if let Some(dup) = entries.iter().find(|e| !seen.insert(e.name())) {
            return Err(Error::CorruptObject(format!(
                "duplicate tree entry {:?}",
                dup.name()
            )));
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.serialized_len());
        for entry in &self.entries {
            entry.serialize_into(&mut buf);
        }
        buf
    }

    pub fn serialized_len(&self) -> usize {
        self.entries.iter().map(TreeEntry::serialized_len).sum()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Iterates `<mode> <name>\0<20 bytes>` records of a tree payload.
#[derive(Debug)]
pub struct TreeRecords<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> TreeRecords<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_entry(&mut self) -> Result<TreeEntry> {
        let rest = &self.bytes[self.pos..];

        let sp_pos = space_position(rest)
            .ok_or_else(|| Error::TruncatedTree(format!("no mode at offset {}", self.pos)))?;
        let zero_pos = zero_position(rest)
            .ok_or_else(|| Error::TruncatedTree(format!("no name at offset {}", self.pos)))?;
        if zero_pos < sp_pos {
            return Err(Error::CorruptObject(format!(
                "tree entry at offset {} has no mode",
                self.pos
            )));
        }

        let mode = std::str::from_utf8(&rest[..sp_pos])
            .map_err(|_| Error::CorruptObject("tree entry mode is not ASCII".into()))?
            .parse::<Mode>()?;
        let name = std::str::from_utf8(&rest[(sp_pos + 1)..zero_pos])
            .map_err(|err| Error::CorruptObject(format!("tree entry name. {err}")))?
            .to_string();
        if !is_valid_name(&name) {
            return Err(Error::CorruptObject(format!("invalid tree entry name: {name:?}")));
        }

        let hash_start = zero_pos + 1;
        let hash_end = hash_start + SHA1_HASH_SIZE;
        if rest.len() < hash_end {
            return Err(Error::TruncatedTree(format!(
                "entry {name:?} needs {SHA1_HASH_SIZE} hash bytes, {} left",
                rest.len() - hash_start
            )));
        }
        let hash = Sha1Hash::try_from(&rest[hash_start..hash_end])?;

        self.pos += hash_end;
        Ok(TreeEntry { mode, name, hash })
    }
}

impl Iterator for TreeRecords<'_> {
    type Item = Result<TreeEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }

        let entry = self.read_entry();
        if entry.is_err() {
            // nothing after a malformed record can be trusted
            self.pos = self.bytes.len();
        }
        Some(entry)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\0'])
}
