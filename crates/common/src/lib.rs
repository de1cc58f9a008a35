//! Shared types for the hexscape workspace.
//!
//! Descriptor ids and entity placements are used by the renderer and by
//! applications alike; the hex module carries the grid math the demo
//! scenes are laid out with.

pub mod hex;
mod types;

pub use hex::{Hex, HexLayout, hex_fan_vertices};
pub use types::{DescriptorId, Placement, Transform};
