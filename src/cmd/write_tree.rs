use super::{Config, Result};
use crate::{store::ObjectStore, tree::TreeBuilder};

pub(crate) fn run(config: &Config) -> Result<()> {
    let store = ObjectStore::new(config.objects_dir());
    let hash = TreeBuilder::new(&store, config).write_tree(".")?;
    println!("{hash}");
    Ok(())
}
