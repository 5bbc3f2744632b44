use super::{
    config::{Config, GIT_DIR},
    git_protocol::{upload_pack, Head, RemoteClient},
    refs,
    unpack::Unpack,
    Error, Result,
};
use std::fs;
use std::path::Path;
use tracing::info;

/// Clones the default branch of a smart-HTTP remote.
///
/// Each step aborts the rest on failure. Directories created before the
/// failure are left behind.
#[derive(Debug)]
pub struct Cloner<'a, U> {
    config: &'a Config,
    unpacker: U,
}

impl<'a, U: Unpack> Cloner<'a, U> {
    pub fn new(config: &'a Config, unpacker: U) -> Self {
        Self { config, unpacker }
    }

    pub async fn run<P: AsRef<Path>>(&self, url: &str, target: P) -> Result<Head> {
        let target = target.as_ref();
        info!(%url, target = %target.display(), "cloning");

        if target.exists() && !target.is_dir() {
            return Err(Error::InvalidArgs(format!(
                "{} exists and is not a directory",
                target.display()
            )));
        }
        fs::create_dir_all(target)?;

        let git_dir = target.join(GIT_DIR);
        refs::init(&git_dir, &self.config.fallback_branch)?;

        let client = RemoteClient::new(url, self.config)?;
        let head = client.discover().await?;

        let body = client.fetch(&head).await?;
        let pack = upload_pack::pack_data(&body)?;
        info!(bytes = pack.len(), "received pack");

        self.unpacker
            .unpack(&pack, &git_dir)
            .map_err(|err| match err {
                Error::UnpackFailed(_) => err,
                other => Error::UnpackFailed(other.to_string()),
            })?;

        refs::write_ref(&git_dir, &head.branch, &head.hash)?;
        if head.branch != self.config.fallback_branch {
            refs::write_head(&git_dir, &head.branch)?;
        }

        info!(branch = %head.branch, hash = %head.hash, "clone complete");
        Ok(head)
    }
}
