//! Persistent package registry maintained by the Stevedore reconciler.

mod entry;
mod index;
mod snapshot;
mod store;

pub use entry::*;
pub use index::*;
pub use snapshot::*;
pub use store::*;
