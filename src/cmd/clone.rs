use super::{Config, Result};
use crate::{clone::Cloner, unpack::UnpackObjects};
use std::path::PathBuf;

pub(crate) async fn run(config: &Config, url: &str, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| default_dir(url));
    let head = Cloner::new(config, UnpackObjects::default())
        .run(url, &dir)
        .await?;
    println!("{}", head.hash);
    Ok(())
}

/// `https://host/owner/repo.git` clones into `repo`.
fn default_dir(url: &str) -> PathBuf {
    let name = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        "repo".into()
    } else {
        name.into()
    }
}
