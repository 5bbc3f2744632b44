use super::{Config, Result};
use crate::refs;

pub(crate) fn run(config: &Config) -> Result<()> {
    refs::init(&config.git_dir, &config.init_branch)?;
    println!("Initialized git directory");
    Ok(())
}
