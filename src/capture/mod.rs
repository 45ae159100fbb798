//! Capture pipeline for annotated images
//!
//! This module consolidates:
//! - Collision-free output naming (naming.rs)
//! - JPEG encoding (encode.rs)
//! - The asynchronous save service (service.rs)

pub mod encode;
pub mod naming;
pub mod service;

pub use service::{CaptureService, SaveResult};
