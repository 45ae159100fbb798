//! Pure domain types with minimal dependencies
//!
//! This module contains core types used throughout the crate.
//! Types here should have no async or imaging dependencies
//! to avoid circular dependencies.

pub mod image_ref;
pub mod orientation;
pub mod stroke;

pub use image_ref::*;
pub use orientation::*;
pub use stroke::*;
