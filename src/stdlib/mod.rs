//! Builtin registry

mod builtins;

pub use builtins::{Builtin, Universe};
