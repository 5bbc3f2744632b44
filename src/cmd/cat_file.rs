use super::{Config, Result};
use crate::{git_object::GitObject, store::ObjectStore, Sha1Hash};
use std::io::{self, Write};

pub(crate) fn run(config: &Config, hash: &str) -> Result<()> {
    let hash = Sha1Hash::from_hex(hash)?;
    let store = ObjectStore::new(config.objects_dir());
    let (kind, payload) = store.get(&hash)?;

    let mut out = io::stdout().lock();
    match GitObject::decode(kind, &payload)? {
        tree @ GitObject::Tree(_) => write!(out, "{tree}")?,
        _ => out.write_all(&payload)?,
    }
    out.flush()?;
    Ok(())
}
