//! Annotation session management module
//!
//! This module contains:
//! - Session state (strokes over a drawing surface)
//! - Generation tokens that tie async results to the session that asked
//! - Message types exchanged between the host, the screen and background tasks

pub mod messages;
pub mod state;
pub mod token;

pub use messages::{Command, Completion, ConfirmChoice};
pub use state::AnnotationSession;
pub use token::{SessionToken, TokenSource};
