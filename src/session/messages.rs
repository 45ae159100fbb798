//! Message types for annotation sessions
//!
//! This module contains:
//! - Command enum for the menu-equivalent user commands
//! - ConfirmChoice enum fed into the exit gate by the confirmation prompt
//! - Completion enum carrying background results back to the screen

use crate::capture::SaveResult;
use crate::error::StartError;
use crate::orientation::ResolvedImage;

use super::token::SessionToken;

/// User commands available while editing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Save the annotated image and exit on success
    Save,
    /// Remove the most recent stroke
    Undo,
    /// Remove every stroke
    Clear,
}

/// Answer to the "discard changes?" prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmChoice {
    /// Save, then exit if the save succeeds
    Save,
    /// Exit without saving
    Discard,
    /// Back to editing
    Cancel,
    /// Prompt dismissed without an answer
    Resume,
}

/// Single result delivered by a background task
#[derive(Debug)]
pub enum Completion {
    OrientationResolved {
        token: SessionToken,
        result: Result<ResolvedImage, StartError>,
    },
    SaveFinished {
        token: SessionToken,
        result: SaveResult,
    },
}

impl Completion {
    /// Session the result belongs to
    pub fn token(&self) -> SessionToken {
        match self {
            Completion::OrientationResolved { token, .. } => *token,
            Completion::SaveFinished { token, .. } => *token,
        }
    }
}
