use super::{Error, Result, Sha1Hash};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the epoch plus the author's UTC offset in minutes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub offset_minutes: i32,
}

impl Timestamp {
    pub fn now() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        Self {
            seconds,
            offset_minutes: 0,
        }
    }

    fn parse(seconds: &str, offset: &str) -> Option<Self> {
        let seconds = seconds.parse::<i64>().ok()?;
        let (sign, digits) = match offset.as_bytes().first()? {
            b'+' => (1, &offset[1..]),
            b'-' => (-1, &offset[1..]),
            _ => return None,
        };
        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let hours = digits[..2].parse::<i32>().ok()?;
        let minutes = digits[2..].parse::<i32>().ok()?;
        Some(Self {
            seconds,
            offset_minutes: sign * (hours * 60 + minutes),
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let offset = self.offset_minutes.abs();
        write!(
            f,
            "{} {sign}{:02}{:02}",
            self.seconds,
            offset / 60,
            offset % 60
        )
    }
}

/// `Name <email> <seconds> <offset>` as found on author/committer lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub when: Timestamp,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: Timestamp) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        let (ident, time) = value.rsplit_once("> ")?;
        let (name, email) = ident.split_once(" <")?;
        let (seconds, offset) = time.split_once(' ')?;
        Some(Self::new(name, email, Timestamp::parse(seconds, offset)?))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.when)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    tree: Sha1Hash,
    parent: Option<Sha1Hash>,
    author: Signature,
    committer: Signature,
    message: String,
}

impl Commit {
    pub fn new(
        tree: Sha1Hash,
        parent: Option<Sha1Hash>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tree,
            parent,
            author,
            committer,
            message: message.into(),
        }
    }

    pub fn tree(&self) -> Sha1Hash {
        self.tree
    }

    pub fn parent(&self) -> Option<Sha1Hash> {
        self.parent
    }

    pub fn author(&self) -> &Signature {
        &self.author
    }

    pub fn committer(&self) -> &Signature {
        &self.committer
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut text = format!("tree {}\n", self.tree);
        if let Some(ref parent) = self.parent {
            text.push_str(&format!("parent {parent}\n"));
        }
        text.push_str(&format!("author {}\n", self.author));
        text.push_str(&format!("committer {}\n", self.committer));
        text.push('\n');
        text.push_str(&self.message);
        text.push('\n');
        text.into_bytes()
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|err| Error::CorruptObject(format!("commit is not UTF-8. {err}")))?;
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| Error::CorruptObject("commit has no message separator".into()))?;

        let mut tree = None;
        let mut parent = None;
        let mut author = None;
        let mut committer = None;

        for line in headers.lines() {
            let (key, value) = line
                .split_once(' ')
                .ok_or_else(|| Error::CorruptObject(format!("bad commit header: {line:?}")))?;
            match key {
                "tree" => tree = Some(parse_hash(value)?),
                // only the first parent is kept
                "parent" if parent.is_none() => parent = Some(parse_hash(value)?),
                "author" => author = Some(parse_signature(value)?),
                "committer" => committer = Some(parse_signature(value)?),
                _ => {}
            }
        }

        let missing = |field: &str| Error::CorruptObject(format!("commit has no {field}"));
        Ok(Self {
            tree: tree.ok_or_else(|| missing("tree"))?,
            parent,
            author: author.ok_or_else(|| missing("author"))?,
            committer: committer.ok_or_else(|| missing("committer"))?,
            message: message.strip_suffix('\n').unwrap_or(message).to_string(),
        })
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.serialize()))
    }
}

fn parse_hash(value: &str) -> Result<Sha1Hash> {
    Sha1Hash::from_hex(value).map_err(|_| Error::CorruptObject(format!("bad hash {value:?}")))
}

fn parse_signature(value: &str) -> Result<Signature> {
    Signature::parse(value).ok_or_else(|| Error::CorruptObject(format!("bad signature {value:?}")))
}
