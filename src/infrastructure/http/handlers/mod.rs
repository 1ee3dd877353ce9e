//! HTTP Handlers

mod filter;
mod jobs;
mod ping;
mod video;

pub use filter::*;
pub use jobs::*;
pub use ping::*;
pub use video::*;
