use super::{Config, Result};
use crate::{git_object::GitObject, store::ObjectStore, Error, Sha1Hash};

pub(crate) fn run(config: &Config, hash: &str, name_only: bool) -> Result<()> {
    let hash = Sha1Hash::from_hex(hash)?;
    let obj = ObjectStore::new(config.objects_dir()).read(&hash)?;
    for line in lines(&obj, name_only)? {
        println!("{line}");
    }
    Ok(())
}

fn lines(obj: &GitObject, name_only: bool) -> Result<Vec<String>> {
    let GitObject::Tree(tree) = obj else {
        return Err(Error::InvalidArgs(format!("{} is not a tree", obj.hash())));
    };
    Ok(tree
        .entries()
        .iter()
        .map(|entry| {
            if name_only {
                entry.name().to_string()
            } else {
                entry.to_string()
            }
        })
        .collect())
}
