//! Persistent animated background and the clear policy that preserves it.

mod mesh;
mod policy;

pub use mesh::{BackgroundMesh, BackgroundMode};
pub use policy::PreservationPolicy;
