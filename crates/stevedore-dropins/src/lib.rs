//! Discovers plugin packs dropped into the dropins directory and reconciles
//! them into the host runtime's package registry.

mod manifest;
mod reconcile;
mod scan;

pub use manifest::*;
pub use reconcile::*;
pub use scan::*;
