//! Annotate a captured image and save the result as a new file.
//!
//! An [`AnnotationScreen`](screen::AnnotationScreen) resolves the image's
//! orientation, hosts one [`AnnotationSession`](session::AnnotationSession)
//! over a drawing surface, gates every exit attempt through the
//! [`ExitGate`](exit_gate::ExitGate), and writes saves via the
//! [`CaptureService`](capture::CaptureService) without clobbering
//! existing files.

pub mod capture;
pub mod config;
pub mod domain;
pub mod error;
pub mod exit_gate;
pub mod orientation;
pub mod render;
pub mod screen;
pub mod session;
