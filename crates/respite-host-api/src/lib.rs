//! Host collaborator trait interfaces for respited
//!
//! This crate defines the narrow interface between the work/rest state
//! machine and the platform: where input activity comes from and how the
//! screen gets locked. It contains no platform code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
