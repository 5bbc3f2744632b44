mod cmd;
mod error;

pub mod clone;
pub mod commit;
pub mod config;
pub mod git_object;
pub mod git_protocol;
pub mod hash;
pub mod refs;
pub mod store;
pub mod tree;
pub mod unpack;
pub mod zlib;

pub use cmd::{Cli, Command};
pub use config::Config;
pub use error::Error;
pub use hash::Sha1Hash;
pub type Result<T> = std::result::Result<T, Error>;
