use super::{
    config::{Config, Identity},
    git_object::{
        commit::{Commit, Signature, Timestamp},
        ObjectKind,
    },
    store::ObjectStore,
    Result, Sha1Hash,
};
use tracing::debug;

/// Composes and stores commits for one author/committer pair.
#[derive(Debug)]
pub struct CommitBuilder<'a> {
    store: &'a ObjectStore,
    author: Identity,
    committer: Identity,
}

impl<'a> CommitBuilder<'a> {
    pub fn new(store: &'a ObjectStore, config: &Config) -> Self {
        Self {
            store,
            author: config.author.clone(),
            committer: config.committer.clone(),
        }
    }

    /// Stamps the commit with the current time. Pointing a ref at the
    /// result is left to the caller.
    pub fn commit(
        &self,
        tree: Sha1Hash,
        parent: Option<Sha1Hash>,
        message: &str,
    ) -> Result<Sha1Hash> {
        self.commit_at(tree, parent, message, Timestamp::now())
    }

    pub fn commit_at(
        &self,
        tree: Sha1Hash,
        parent: Option<Sha1Hash>,
        message: &str,
        when: Timestamp,
    ) -> Result<Sha1Hash> {
        let commit = Commit::new(
            tree,
            parent,
            Signature::new(&self.author.name, &self.author.email, when),
            Signature::new(&self.committer.name, &self.committer.email, when),
            message,
        );
        let hash = self.store.put(ObjectKind::Commit, &commit.serialize())?;
        debug!(%hash, %tree, ?parent, "wrote commit");
        Ok(hash)
    }
}
