pub mod naming;
pub mod recycle;
pub mod transfer;

pub use naming::{JellyfinLayout, NamingOptions};
pub use recycle::RecycleBin;
