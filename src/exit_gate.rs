//! Exit gate for annotation sessions
//!
//! Every exit attempt passes through here. The gate only decides; the
//! screen performs whatever `GateAction` it returns.

use crate::session::ConfirmChoice;

/// How the editing screen is being left
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitDecision {
    Save,
    Discard,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Editing,
    /// Waiting for the user to answer the discard prompt
    ConfirmPending,
    /// A save is in flight; its outcome decides between exit and editing
    Saving,
    /// Terminal
    Exiting(ExitDecision),
}

/// What the host must do after a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateAction {
    None,
    /// Present Save / Discard / Cancel
    Prompt,
    /// Snapshot the session and dispatch a save
    StartSave,
    /// Exit abandoned; the user keeps editing
    Resume(ExitDecision),
    /// Leave the screen
    Exit(ExitDecision),
}

#[derive(Debug, Default)]
pub struct ExitGate {
    state: GateState,
}

impl ExitGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_exiting(&self) -> bool {
        matches!(self.state, GateState::Exiting(_))
    }

    pub fn is_saving(&self) -> bool {
        self.state == GateState::Saving
    }

    /// Back/cancel input. `is_clear` is the session's current dirtiness.
    pub fn exit_attempt(&mut self, is_clear: bool) -> GateAction {
        match self.state {
            GateState::Editing | GateState::ConfirmPending => {
                if is_clear {
                    self.exit(ExitDecision::Discard)
                } else {
                    self.state = GateState::ConfirmPending;
                    GateAction::Prompt
                }
            }
            GateState::Saving => {
                log::debug!("Exit attempt ignored while a save is in flight");
                GateAction::None
            }
            GateState::Exiting(_) => GateAction::None,
        }
    }

    /// Answer from the discard prompt
    pub fn choose(&mut self, choice: ConfirmChoice) -> GateAction {
        if self.state != GateState::ConfirmPending {
            log::warn!("Ignoring {:?}: no confirmation pending ({:?})", choice, self.state);
            return GateAction::None;
        }
        match choice {
            ConfirmChoice::Save => {
                self.state = GateState::Saving;
                GateAction::StartSave
            }
            ConfirmChoice::Discard => self.exit(ExitDecision::Discard),
            ConfirmChoice::Cancel => {
                self.state = GateState::Editing;
                GateAction::Resume(ExitDecision::Cancel)
            }
            // Prompt dismissed; stays pending until answered or re-triggered
            ConfirmChoice::Resume => GateAction::None,
        }
    }

    /// Save command from the menu
    pub fn request_save(&mut self) -> GateAction {
        match self.state {
            GateState::Editing | GateState::ConfirmPending => {
                self.state = GateState::Saving;
                GateAction::StartSave
            }
            GateState::Saving => {
                log::debug!("Save already in flight");
                GateAction::None
            }
            GateState::Exiting(_) => GateAction::None,
        }
    }

    /// Outcome of the save started by `StartSave`
    pub fn save_finished(&mut self, succeeded: bool) -> GateAction {
        if self.state != GateState::Saving {
            log::warn!("Save outcome arrived with no save in flight ({:?})", self.state);
            return GateAction::None;
        }
        if succeeded {
            self.exit(ExitDecision::Save)
        } else {
            self.state = GateState::Editing;
            GateAction::None
        }
    }

    fn exit(&mut self, decision: ExitDecision) -> GateAction {
        self.state = GateState::Exiting(decision);
        GateAction::Exit(decision)
    }
}
