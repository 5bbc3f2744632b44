//! Loose object store: one zlib-compressed record per digest, sharded by
//! the first two hex characters of the digest.

use super::{
    git_object::{split_record, GitObject, ObjectKind},
    zlib, Error, Result, Sha1Hash,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub fn new<P: AsRef<Path>>(objects_dir: P) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().into(),
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// `objects/<hex[0..2]>/<hex[2..40]>`
    pub fn path_of(&self, hash: &Sha1Hash) -> PathBuf {
        let hex = hash.hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }

    pub fn put(&self, kind: ObjectKind, payload: &[u8]) -> Result<Sha1Hash> {
        let record = kind.encode(payload);
        let hash = Sha1Hash::digest(&record);
        let compressed = zlib::compress(&record)?;

        let path = self.path_of(&hash);
        if let Some(dir) = path.parent() {
            // a concurrent writer may create the shard first
            fs::create_dir_all(dir)?;
        }
        fs::write(&path, compressed)?;

        debug!(%hash, %kind, size = payload.len(), "stored object");
        Ok(hash)
    }

    pub fn get(&self, hash: &Sha1Hash) -> Result<(ObjectKind, Vec<u8>)> {
        let path = self.path_of(hash);
        let compressed = fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => Error::ObjectNotFound(hash.hex()),
            _ => Error::Io(err),
        })?;

        let data = zlib::decompress(&compressed)?;
        let (kind, payload) = split_record(&data)?;
        Ok((kind, payload.to_vec()))
    }

    pub fn write(&self, object: &GitObject) -> Result<Sha1Hash> {
        self.put(object.kind(), &object.payload())
    }

    pub fn read(&self, hash: &Sha1Hash) -> Result<GitObject> {
        let (kind, payload) = self.get(hash)?;
        GitObject::decode(kind, &payload)
    }
}
