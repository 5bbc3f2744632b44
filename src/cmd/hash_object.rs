use super::{Config, Result};
use crate::{git_object::GitObject, store::ObjectStore};
use std::fs::File;
use std::path::Path;

pub(crate) fn run(config: &Config, path: &Path, write: bool) -> Result<()> {
    let f = File::open(path)?;
    let obj = GitObject::new_blob(f)?;
    let hash = if write {
        ObjectStore::new(config.objects_dir()).write(&obj)?
    } else {
        obj.hash()
    };
    println!("{hash}");
    Ok(())
}
