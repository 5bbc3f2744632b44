use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const GIT_DIR: &str = ".git";
pub const FALLBACK_BRANCH: &str = "master";
pub const INIT_BRANCH: &str = "main";

const DEFAULT_NAME: &str = "tinygit";
const DEFAULT_EMAIL: &str = "tinygit@localhost";
const DEFAULT_MAX_TREE_ENTRIES: usize = 64 * 1024;
const DEFAULT_MAX_TREE_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_CAPABILITIES: &str = "side-band-64k ofs-delta";
pub const AGENT: &str = concat!("tinygit/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

/// Runtime settings. Defaults apply unless an environment variable overrides them.
#[derive(Debug, Clone)]
pub struct Config {
    pub git_dir: PathBuf,
    pub author: Identity,
    pub committer: Identity,
    pub fallback_branch: String,
    pub init_branch: String,
    pub max_tree_entries: usize,
    pub max_tree_bytes: usize,
    pub capabilities: String,
}

impl Default for Config {
    fn default() -> Self {
        let identity = Identity {
            name: DEFAULT_NAME.into(),
            email: DEFAULT_EMAIL.into(),
        };
        Self {
            git_dir: GIT_DIR.into(),
            author: identity.clone(),
            committer: identity,
            fallback_branch: FALLBACK_BRANCH.into(),
            init_branch: INIT_BRANCH.into(),
            max_tree_entries: DEFAULT_MAX_TREE_ENTRIES,
            max_tree_bytes: DEFAULT_MAX_TREE_BYTES,
            capabilities: format!("{DEFAULT_CAPABILITIES} agent={AGENT}"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("GIT_DIR") {
            config.git_dir = dir.into();
        }
        if let Some(name) = lookup("GIT_AUTHOR_NAME") {
            config.author.name = name;
        }
        if let Some(email) = lookup("GIT_AUTHOR_EMAIL") {
            config.author.email = email;
        }
        config.committer = Identity {
            name: lookup("GIT_COMMITTER_NAME").unwrap_or_else(|| config.author.name.clone()),
            email: lookup("GIT_COMMITTER_EMAIL").unwrap_or_else(|| config.author.email.clone()),
        };
        if let Some(n) = parse_limit(&lookup, "GIT_TREE_MAX_ENTRIES") {
            config.max_tree_entries = n;
        }
        if let Some(n) = parse_limit(&lookup, "GIT_TREE_MAX_BYTES") {
            config.max_tree_bytes = n;
        }

        config
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.git_dir.join("objects")
    }
}

fn parse_limit<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key)?;
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            warn!(%key, %value, "ignoring invalid limit");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn it_uses_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.git_dir, PathBuf::from(".git"));
        assert_eq!(config.fallback_branch, "master");
        assert_eq!(config.author, config.committer);
        assert!(config.capabilities.contains("agent=tinygit/"));
    }

    #[test]
    fn it_falls_back_to_author_for_committer() {
        let config = Config::from_lookup(lookup(&[
            ("GIT_AUTHOR_NAME", "Ada"),
            ("GIT_AUTHOR_EMAIL", "ada@example.com"),
            ("GIT_COMMITTER_EMAIL", "ci@example.com"),
        ]));
        assert_eq!(config.author.name, "Ada");
        assert_eq!(config.committer.name, "Ada");
        assert_eq!(config.committer.email, "ci@example.com");
    }

    #[test]
    fn it_ignores_invalid_limits() {
        let config = Config::from_lookup(lookup(&[
            ("GIT_TREE_MAX_ENTRIES", "lots"),
            ("GIT_TREE_MAX_BYTES", "1024"),
        ]));
        assert_eq!(config.max_tree_entries, DEFAULT_MAX_TREE_ENTRIES);
        assert_eq!(config.max_tree_bytes, 1024);
    }
}
