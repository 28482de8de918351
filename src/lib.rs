//! goinspect
//!
//! Static type attribution for the package-level declarations of Go
//! packages: every const, var, type and function gets a type, imported
//! packages are loaded on demand and composite types are interned per
//! package.

pub mod frontend;
pub mod inspect;
pub mod package;
pub mod report;
pub mod stdlib;
pub mod types;
pub mod utils;

pub use inspect::{Config, Session};
pub use report::PackageReport;
pub use utils::{Error, Result};
