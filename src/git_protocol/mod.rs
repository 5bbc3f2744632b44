mod advertisement;
mod client;
mod pkt_line;
pub mod upload_pack;

pub use advertisement::{Head, RefAdvertisement, RefRecord};
pub use client::RemoteClient;
pub use pkt_line::{PktLine, PktLines};

use super::{Error, Result};
