use super::{Config, Result};
use crate::{commit::CommitBuilder, store::ObjectStore, Sha1Hash};

pub(crate) fn run(config: &Config, tree: &str, parent: Option<&str>, message: &str) -> Result<()> {
    let tree = Sha1Hash::from_hex(tree)?;
    let parent = parent.map(Sha1Hash::from_hex).transpose()?;

    let store = ObjectStore::new(config.objects_dir());
    let hash = CommitBuilder::new(&store, config).commit(tree, parent, message)?;
    println!("{hash}");
    Ok(())
}
