//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod codec;
pub mod media;
pub mod storage;
pub mod tts;

pub use codec::*;
pub use media::*;
pub use storage::*;
pub use tts::*;
