//! Utility modules

mod span;
mod error;
mod arena;

pub use span::Span;
pub use error::{Error, Result};
pub use arena::{Arena, ArenaKey};
