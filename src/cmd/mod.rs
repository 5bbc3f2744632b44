mod cat_file;
mod clone;
mod commit_tree;
mod hash_object;
mod init;
mod ls_tree;
mod write_tree;

use super::{Config, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tinygit", version, about = "Git plumbing: objects, trees, commits and clone")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an empty repository in the current directory
    Init,
    /// Print an object's content
    CatFile {
        #[arg(short = 'p', value_name = "OBJECT")]
        hash: String,
    },
    /// Compute a file's blob digest, storing it with -w
    HashObject {
        #[arg(short = 'w')]
        write: bool,
        path: PathBuf,
    },
    /// List the entries of a tree
    LsTree {
        #[arg(long)]
        name_only: bool,
        hash: String,
    },
    /// Store the current directory as a tree
    WriteTree,
    /// Create a commit for a tree
    CommitTree {
        tree: String,
        #[arg(short = 'p')]
        parent: Option<String>,
        #[arg(short = 'm')]
        message: String,
    },
    /// Clone a repository over smart HTTP
    Clone { url: String, dir: Option<PathBuf> },
}

impl Command {
    pub async fn run(self, config: &Config) -> Result<()> {
        match self {
            Self::Init => init::run(config),
            Self::CatFile { hash } => cat_file::run(config, &hash),
            Self::HashObject { write, path } => hash_object::run(config, &path, write),
            Self::LsTree { name_only, hash } => ls_tree::run(config, &hash, name_only),
            Self::WriteTree => write_tree::run(config),
            Self::CommitTree {
                tree,
                parent,
                message,
            } => commit_tree::run(config, &tree, parent.as_deref(), &message),
            Self::Clone { url, dir } => clone::run(config, &url, dir).await,
        }
    }
}
