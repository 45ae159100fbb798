//! Annotation screen controller
//!
//! Owns the one live session and drives it from the interactive side.
//! Background work (decoding and orientation, saving) is spawned onto tokio and
//! reports back through the completion channel; the host feeds each
//! `Completion` to `handle`. State is only ever mutated from these calls.

use std::path::PathBuf;

use tokio::sync::{mpsc, oneshot};

use crate::capture::CaptureService;
use crate::domain::{DisplayGeometry, ImageReference, Orientation, Stroke};
use crate::error::{SaveError, StartError};
use crate::exit_gate::{ExitGate, GateAction, GateState};
use crate::orientation::{Freshness, OrientationResolver, ResolvedImage};
use crate::render::SurfaceFactory;
use crate::session::{AnnotationSession, Command, Completion, ConfirmChoice, TokenSource};

/// What the screen hands back to whoever launched it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenResult {
    /// Newly written annotated image
    Saved(PathBuf),
    /// Left without saving
    Cancelled,
}

/// Visible effect of one input or completion
#[derive(Debug)]
pub enum ScreenUpdate {
    None,
    /// Result belonged to a session that no longer exists
    Ignored,
    /// Display orientation changed while resolving; nothing was built
    RenderSkipped { requested: Orientation },
    SessionReady(Orientation),
    StartFailed(StartError),
    /// Ask the user: Save, Discard or Cancel
    Prompt,
    SaveStarted,
    SaveFailed(SaveError),
    Finished(ScreenResult),
}

/// Everything the screen needs from its host besides the image
pub struct ScreenContext {
    pub display: DisplayGeometry,
    pub destination: PathBuf,
    pub capture: CaptureService,
    pub completions: mpsc::UnboundedSender<Completion>,
    /// Where the final result goes; the top-level caller's channel when nested
    pub reply: Option<oneshot::Sender<ScreenResult>>,
}

pub struct AnnotationScreen<F: SurfaceFactory> {
    factory: F,
    image: ImageReference,
    display: DisplayGeometry,
    destination: PathBuf,
    capture: CaptureService,
    completions: mpsc::UnboundedSender<Completion>,
    reply: Option<oneshot::Sender<ScreenResult>>,
    tokens: TokenSource,
    session: Option<AnnotationSession<F::Surface>>,
    gate: ExitGate,
    requested_orientation: Option<Orientation>,
    result: Option<ScreenResult>,
}

impl<F: SurfaceFactory> AnnotationScreen<F> {
    /// Validate input and dispatch orientation resolution
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        image: Option<ImageReference>,
        factory: F,
        ctx: ScreenContext,
    ) -> Result<Self, StartError> {
        let Some(image) = image else {
            log::error!("Can't start annotation screen: no image reference provided");
            return Err(StartError::Configuration(
                "image reference is required".into(),
            ));
        };

        let mut screen = Self {
            factory,
            image,
            display: ctx.display,
            destination: ctx.destination,
            capture: ctx.capture,
            completions: ctx.completions,
            reply: ctx.reply,
            tokens: TokenSource::new(),
            session: None,
            gate: ExitGate::new(),
            requested_orientation: None,
            result: None,
        };
        screen.dispatch_resolve();
        Ok(screen)
    }

    pub fn image(&self) -> &ImageReference {
        &self.image
    }

    pub fn display(&self) -> DisplayGeometry {
        self.display
    }

    pub fn session(&self) -> Option<&AnnotationSession<F::Surface>> {
        self.session.as_ref()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Orientation the host should switch the display to, once known
    pub fn requested_orientation(&self) -> Option<Orientation> {
        self.requested_orientation
    }

    pub fn result(&self) -> Option<&ScreenResult> {
        self.result.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Apply a background result on the interactive side
    pub fn handle(&mut self, completion: Completion) -> ScreenUpdate {
        let token = completion.token();
        if !self.tokens.is_current(token) {
            log::debug!("Dropping result for {token}: session no longer exists");
            return ScreenUpdate::Ignored;
        }
        match completion {
            Completion::OrientationResolved { result, .. } => self.on_orientation(result),
            Completion::SaveFinished { result, .. } => self.on_save_finished(result),
        }
    }

    /// Host destroyed and recreated the screen for a new display configuration
    pub fn configuration_changed(&mut self, display: DisplayGeometry) {
        self.display = display;
        if self.is_finished() {
            return;
        }
        if let Some(session) = self.session.take()
            && !session.is_clear()
        {
            log::warn!("Configuration change discards unsaved strokes on {}", self.image);
        }
        self.gate = ExitGate::new();
        self.dispatch_resolve();
    }

    /// Host screen is gone; in-flight results will be ignored
    pub fn teardown(&mut self) {
        if let Some(token) = self.tokens.current() {
            log::debug!("Tearing down {token}");
        }
        self.tokens.invalidate();
        self.session = None;
        self.reply = None;
    }

    pub fn commit_stroke(&mut self, stroke: Stroke) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.commit_stroke(stroke);
                true
            }
            None => {
                log::debug!("Stroke dropped: no session");
                false
            }
        }
    }

    pub fn command(&mut self, command: Command) -> ScreenUpdate {
        let Some(session) = self.session.as_mut() else {
            log::debug!("{command:?} ignored: no session");
            return ScreenUpdate::None;
        };
        match command {
            Command::Undo => {
                session.undo();
                ScreenUpdate::None
            }
            Command::Clear => {
                session.clear();
                ScreenUpdate::None
            }
            Command::Save => {
                let action = self.gate.request_save();
                self.perform(action)
            }
        }
    }

    /// Back/cancel input
    pub fn exit_attempt(&mut self) -> ScreenUpdate {
        if self.is_finished() {
            return ScreenUpdate::None;
        }
        // Nothing to lose before the session exists
        let is_clear = self.session.as_ref().is_none_or(|s| s.is_clear());
        let action = self.gate.exit_attempt(is_clear);
        self.perform(action)
    }

    /// Answer to the prompt raised by `ScreenUpdate::Prompt`
    pub fn choose(&mut self, choice: ConfirmChoice) -> ScreenUpdate {
        let action = self.gate.choose(choice);
        self.perform(action)
    }

    fn dispatch_resolve(&mut self) {
        let token = self.tokens.issue();
        let image = self.image.clone();
        let tx = self.completions.clone();
        log::debug!("Resolving orientation of {image} for {token}");
        tokio::spawn(async move {
            let result = OrientationResolver::resolve(image).await;
            if tx
                .send(Completion::OrientationResolved { token, result })
                .is_err()
            {
                log::debug!("Orientation for {token} resolved after host shut down");
            }
        });
    }

    fn on_orientation(&mut self, result: Result<ResolvedImage, StartError>) -> ScreenUpdate {
        if self.session.is_some() {
            return ScreenUpdate::Ignored;
        }
        let ResolvedImage {
            orientation: resolved,
            pixels,
        } = match result {
            Ok(resolved) => resolved,
            Err(err) => return self.start_failed(err),
        };
        self.requested_orientation = Some(resolved);

        match OrientationResolver::check(resolved, self.display) {
            Freshness::Stale { resolved, current } => {
                log::debug!(
                    "Image loading skipped: display is {current:?} but {resolved:?} was requested"
                );
                self.tokens.invalidate();
                ScreenUpdate::RenderSkipped {
                    requested: resolved,
                }
            }
            Freshness::Current(orientation) => match self.factory.open(&self.image, pixels) {
                Ok(surface) => {
                    let Some(token) = self.tokens.current() else {
                        return ScreenUpdate::Ignored;
                    };
                    self.session = Some(AnnotationSession::new(
                        token,
                        self.image.clone(),
                        orientation,
                        surface,
                    ));
                    log::info!("Annotating {} in {orientation:?}", self.image);
                    ScreenUpdate::SessionReady(orientation)
                }
                Err(err) => self.start_failed(err.into()),
            },
        }
    }

    fn start_failed(&mut self, err: StartError) -> ScreenUpdate {
        log::error!("Could not start annotation screen: {err}");
        self.conclude(ScreenResult::Cancelled);
        ScreenUpdate::StartFailed(err)
    }

    fn perform(&mut self, action: GateAction) -> ScreenUpdate {
        match action {
            GateAction::None => ScreenUpdate::None,
            GateAction::Prompt => ScreenUpdate::Prompt,
            GateAction::Resume(decision) => {
                log::debug!("Exit {decision:?}, back to editing");
                ScreenUpdate::None
            }
            GateAction::StartSave => self.start_save(),
            // Saves exit from on_save_finished, so only discards land here
            GateAction::Exit(decision) => {
                log::debug!("Leaving screen: {decision:?}");
                self.finish(ScreenResult::Cancelled)
            }
        }
    }

    /// Snapshot now, write in the background
    fn start_save(&mut self) -> ScreenUpdate {
        let Some(session) = self.session.as_ref() else {
            self.gate.save_finished(false);
            return ScreenUpdate::None;
        };
        let buffer = match session.snapshot() {
            Ok(buffer) => buffer,
            Err(err) => {
                log::error!("Could not save image: {err}");
                self.gate.save_finished(false);
                return ScreenUpdate::SaveFailed(err.into());
            }
        };

        let token = session.token();
        let image = session.image().clone();
        let destination = self.destination.clone();
        let capture = self.capture.clone();
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let result = capture.save(buffer, image, destination).await;
            if tx.send(Completion::SaveFinished { token, result }).is_err() {
                log::debug!("Save for {token} finished after host shut down");
            }
        });
        ScreenUpdate::SaveStarted
    }

    fn on_save_finished(&mut self, result: Result<PathBuf, SaveError>) -> ScreenUpdate {
        match result {
            Ok(path) => match self.gate.save_finished(true) {
                GateAction::Exit(_) => self.finish(ScreenResult::Saved(path)),
                _ => ScreenUpdate::None,
            },
            Err(err) => {
                log::error!("Could not save image: {err}");
                self.gate.save_finished(false);
                ScreenUpdate::SaveFailed(err)
            }
        }
    }

    fn finish(&mut self, result: ScreenResult) -> ScreenUpdate {
        self.conclude(result.clone());
        ScreenUpdate::Finished(result)
    }

    fn conclude(&mut self, result: ScreenResult) {
        log::info!("Annotation screen finished: {result:?}");
        self.tokens.invalidate();
        self.session = None;
        if let Some(reply) = self.reply.take()
            && reply.send(result.clone()).is_err()
        {
            log::debug!("Caller stopped waiting for the screen result");
        }
        self.result = Some(result);
    }
}
