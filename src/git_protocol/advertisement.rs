//! Ref advertisement returned by `GET info/refs?service=git-upload-pack`.

use super::{Error, PktLine, PktLines, Result};
use crate::hash::{Sha1Hash, SHA1_HEX_SIZE};

const HEAD: &str = "HEAD";
const HEADS_PREFIX: &str = "refs/heads/";
const SYMREF_HEAD: &str = "symref=HEAD:";

/// One `<40 hex> SP <refname>[NUL <capabilities>]` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord {
    pub hash: Sha1Hash,
    pub name: String,
    pub capabilities: Vec<String>,
}

impl RefRecord {
    fn parse(line: &[u8]) -> Result<Self> {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        let (refpart, caps) = match line.iter().position(|&b| b == b'\0') {
            Some(n) => (&line[..n], &line[(n + 1)..]),
            None => (line, &b""[..]),
        };

        // exactly 40 hex, one space, then a non-empty name
        let malformed = || {
            Error::RefDiscoveryFailed(format!(
                "malformed ref record: {:?}",
                String::from_utf8_lossy(line)
            ))
        };
        if refpart.len() <= SHA1_HEX_SIZE + 1 || refpart[SHA1_HEX_SIZE] != b' ' {
            return Err(malformed());
        }
        let hex = std::str::from_utf8(&refpart[..SHA1_HEX_SIZE]).map_err(|_| malformed())?;
        let hash = Sha1Hash::from_hex(hex).map_err(|_| malformed())?;
        let name = std::str::from_utf8(&refpart[(SHA1_HEX_SIZE + 1)..])
            .map_err(|_| malformed())?
            .to_string();
        if name.contains(' ') {
            return Err(malformed());
        }

        let capabilities = String::from_utf8_lossy(caps)
            .split_whitespace()
            .map(String::from)
            .collect();

        Ok(Self {
            hash,
            name,
            capabilities,
        })
    }
}

/// The branch `HEAD` resolves to and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub branch: String,
    pub hash: Sha1Hash,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefAdvertisement {
    records: Vec<RefRecord>,
}

impl RefAdvertisement {
    pub fn parse(body: &[u8]) -> Result<Self> {
        let mut records = vec![];

        for line in PktLines::lenient(body) {
            let line = line.map_err(|err| Error::RefDiscoveryFailed(err.to_string()))?;
            let data = match line {
                PktLine::Flush => continue,
                PktLine::Data(ref data) => data.as_slice(),
            };
            if data.starts_with(b"#") || data == b"\n" || data.is_empty() {
                continue;
            }
            records.push(RefRecord::parse(data)?);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[RefRecord] {
        &self.records
    }

    pub fn capabilities(&self) -> &[String] {
        self.records
            .iter()
            .find(|r| !r.capabilities.is_empty())
            .map_or(&[][..], |r| r.capabilities.as_slice())
    }

    /// Resolves `HEAD`. The branch comes from the `symref=HEAD:` capability;
    /// when that is absent or names `HEAD` itself, `fallback` is used.
    pub fn head(&self, fallback: &str) -> Result<Head> {
        let record = self
            .records
            .iter()
            .find(|r| r.name == HEAD)
            .ok_or_else(|| Error::RefDiscoveryFailed("no HEAD in ref advertisement".into()))?;

        let branch = self
            .capabilities()
            .iter()
            .find_map(|cap| cap.strip_prefix(SYMREF_HEAD))
            .map(|target| target.strip_prefix(HEADS_PREFIX).unwrap_or(target))
            .filter(|branch| !branch.is_empty() && *branch != HEAD)
            .unwrap_or(fallback);

        Ok(Head {
            branch: branch.to_string(),
            hash: record.hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "3b1031798a00fdf9b574b5857b1721bc4b0e6bac";

    #[test]
    fn it_resolves_bare_head_to_fallback() {
        let body = format!("0000# service=git-upload-pack\n0032{HEX} HEAD\n0000");
        let head = RefAdvertisement::parse(body.as_bytes())
            .unwrap()
            .head("master")
            .unwrap();
        assert_eq!(head.branch, "master");
        assert_eq!(head.hash.hex(), HEX);
    }

    #[test]
    fn it_resolves_symref_branch() {
        let first = format!("{HEX} HEAD\0multi_ack symref=HEAD:refs/heads/main agent=git/2.43\n");
        let second = format!("{HEX} refs/heads/main\n");
        let body = [
            PktLine::new(b"# service=git-upload-pack\n".to_vec()).encode(),
            PktLine::flush().encode(),
            PktLine::new(first.into_bytes()).encode(),
            PktLine::new(second.into_bytes()).encode(),
            PktLine::flush().encode(),
        ]
        .concat();

        let adv = RefAdvertisement::parse(&body).unwrap();
        assert_eq!(adv.records().len(), 2);
        assert_eq!(adv.capabilities()[0], "multi_ack");

        let head = adv.head("master").unwrap();
        assert_eq!(head.branch, "main");
        assert_eq!(head.hash.hex(), HEX);
    }

    #[test]
    fn it_ignores_symref_to_head() {
        let line = format!("{HEX} HEAD\0symref=HEAD:HEAD\n");
        let body = [PktLine::new(line.into_bytes()).encode(), b"0000".to_vec()].concat();
        let head = RefAdvertisement::parse(&body).unwrap().head("master").unwrap();
        assert_eq!(head.branch, "master");
    }

    #[test]
    fn it_does_not_match_head_inside_other_names() {
        let line = format!("{HEX} refs/heads/HEADLESS\n");
        let body = [PktLine::new(line.into_bytes()).encode(), b"0000".to_vec()].concat();
        let adv = RefAdvertisement::parse(&body).unwrap();
        assert!(matches!(adv.head("master"), Err(Error::RefDiscoveryFailed(_))));
    }

    #[test]
    fn it_fails_on_bad_digest() {
        let body = b"0032zz1031798a00fdf9b574b5857b1721bc4b0e6bac HEAD\n0000";
        assert!(matches!(
            RefAdvertisement::parse(body),
            Err(Error::RefDiscoveryFailed(_))
        ));
    }

    #[test]
    fn it_fails_on_empty_advertisement() {
        let adv = RefAdvertisement::parse(b"001e# service=git-upload-pack\n00000000").unwrap();
        assert!(adv.records().is_empty());
        assert!(matches!(adv.head("master"), Err(Error::RefDiscoveryFailed(_))));
    }
}
