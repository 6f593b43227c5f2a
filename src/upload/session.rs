use crate::error::{IntakeError, LoadError};
use crate::scene::model::Model;
use crate::upload::intake::{
    FileCandidate, IntakeLimits, ModelSource, Verdict, format_file_size, large_model_message, validate,
};
use crate::upload::worker::{LoadEvent, LoadEventKind};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fmt;

/// User-facing text for every decode failure; the cause goes to the log.
pub const DECODE_FAILED_MESSAGE: &str =
    "Failed to load model. Please check the file format and try again.";

/// Identifies one load attempt. Later attempts get larger tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A decode the caller should dispatch.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub name: String,
    pub source: ModelSource,
}

/// What a failed decode does to the model on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeErrorPolicy {
    /// Remove the previous model and show the placeholder.
    #[default]
    Clear,
    KeepPrevious,
}

/// Name and formatted size shown on the status card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: String,
}

impl FileInfo {
    fn of(candidate: &FileCandidate) -> Self {
        Self {
            name: candidate.name.clone(),
            size: format_file_size(candidate.size_bytes),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    Idle,
    AwaitingConfirmation { pending: FileCandidate },
    Loading { ticket: LoadTicket, progress: f32 },
    Ready,
    Failed,
}

/// Result of [`ViewerSession::submit`].
#[derive(Debug)]
pub enum Submission {
    Load(LoadRequest),
    NeedsConfirmation,
    Rejected(IntakeError),
}

/// Result of feeding a [`LoadEvent`] to the session.
#[derive(Debug)]
pub enum Applied {
    /// Event belonged to a superseded or finished attempt.
    Stale,
    Progress(f32),
    /// The model to present. Happens at most once per ticket.
    Present(Model),
    Failed { policy: DecodeErrorPolicy },
}

/// Explicit view state for the upload flow.
///
/// `Idle -> (AwaitingConfirmation) -> Loading -> Ready | Failed`. Any new
/// submission supersedes the attempt in flight, and events are matched by
/// ticket so a superseded decode can never reach the stage.
#[derive(Debug)]
pub struct ViewerSession {
    limits: IntakeLimits,
    policy: DecodeErrorPolicy,
    phase: Phase,
    next_ticket: u64,
    /// Candidate being validated or loaded.
    file: Option<FileInfo>,
    /// File behind the model currently on screen.
    shown: Option<FileInfo>,
    error: Option<String>,
    warning: Option<String>,
}

impl ViewerSession {
    pub fn new(limits: IntakeLimits, policy: DecodeErrorPolicy) -> Self {
        Self {
            limits,
            policy,
            phase: Phase::Idle,
            next_ticket: 1,
            file: None,
            shown: None,
            error: None,
            warning: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn file(&self) -> Option<&FileInfo> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn limits(&self) -> &IntakeLimits {
        &self.limits
    }

    pub fn has_model(&self) -> bool {
        self.shown.is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    pub fn progress(&self) -> Option<f32> {
        match self.phase {
            Phase::Loading { progress, .. } => Some(progress),
            _ => None,
        }
    }

    /// Ticket of the attempt whose events are still wanted.
    pub fn current_ticket(&self) -> Option<LoadTicket> {
        match self.phase {
            Phase::Loading { ticket, .. } => Some(ticket),
            _ => None,
        }
    }

    /// Validates a dropped or picked file.
    pub fn submit(&mut self, candidate: FileCandidate) -> Submission {
        self.error = None;
        self.warning = None;
        match validate(&candidate, &self.limits) {
            Err(err) => {
                self.file = None;
                self.error = Some(err.to_string());
                self.phase = Phase::Failed;
                Submission::Rejected(err)
            }
            Ok(Verdict::Confirm) => {
                info!(
                    "'{}' ({}) needs confirmation",
                    candidate.name,
                    format_file_size(candidate.size_bytes)
                );
                self.file = Some(FileInfo::of(&candidate));
                self.warning = Some(large_model_message(&candidate));
                self.phase = Phase::AwaitingConfirmation { pending: candidate };
                Submission::NeedsConfirmation
            }
            Ok(Verdict::Accept) => Submission::Load(self.begin(candidate)),
        }
    }

    /// Proceeds with the file waiting on the large-model dialog.
    pub fn confirm(&mut self) -> Option<LoadRequest> {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingConfirmation { pending } => {
                self.warning = None;
                Some(self.begin(pending))
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Drops the file waiting on the large-model dialog.
    pub fn cancel_pending(&mut self) {
        if !matches!(self.phase, Phase::AwaitingConfirmation { .. }) {
            return;
        }
        debug!("Large model load cancelled");
        self.warning = None;
        self.file = self.shown.clone();
        self.phase = self.resting_phase();
    }

    /// Dismisses the error dialog.
    pub fn dismiss_error(&mut self) {
        self.error = None;
        if matches!(self.phase, Phase::Failed) {
            self.phase = self.resting_phase();
        }
    }

    pub fn apply(&mut self, event: LoadEvent) -> Applied {
        let (current, progress) = match self.phase {
            Phase::Loading { ticket, progress } => (ticket, progress),
            _ => {
                debug!("Dropping event for {} (no load in flight)", event.ticket);
                return Applied::Stale;
            }
        };
        if event.ticket != current {
            debug!("Dropping stale event for {} (current {})", event.ticket, current);
            return Applied::Stale;
        }

        match event.kind {
            LoadEventKind::Progress(p) => {
                let p = progress.max(p.clamp(0.0, 100.0));
                self.phase = Phase::Loading {
                    ticket: current,
                    progress: p,
                };
                Applied::Progress(p)
            }
            LoadEventKind::Complete(model) => {
                info!("Load {} complete: '{}'", current, model.name);
                self.shown = self.file.clone();
                self.phase = Phase::Ready;
                Applied::Present(model)
            }
            LoadEventKind::Failed(err) => self.fail(current, &err),
        }
    }

    /// Back to an empty viewer. Any in-flight attempt becomes stale.
    pub fn reset(&mut self) {
        if let Some(ticket) = self.current_ticket() {
            info!("Reset abandons load {}", ticket);
        }
        self.phase = Phase::Idle;
        self.file = None;
        self.shown = None;
        self.error = None;
        self.warning = None;
    }

    fn begin(&mut self, candidate: FileCandidate) -> LoadRequest {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        if let Some(previous) = self.current_ticket() {
            info!("Load {} supersedes {}", ticket, previous);
        }
        info!(
            "Load {}: '{}' ({})",
            ticket,
            candidate.name,
            format_file_size(candidate.size_bytes)
        );
        self.file = Some(FileInfo::of(&candidate));
        self.phase = Phase::Loading {
            ticket,
            progress: 0.0,
        };
        LoadRequest {
            ticket,
            name: candidate.name,
            source: candidate.source,
        }
    }

    fn fail(&mut self, ticket: LoadTicket, err: &LoadError) -> Applied {
        warn!("Load {} failed: {}", ticket, err);
        self.error = Some(DECODE_FAILED_MESSAGE.to_string());
        self.file = None;
        if self.policy == DecodeErrorPolicy::Clear {
            self.shown = None;
        }
        self.phase = Phase::Failed;
        Applied::Failed {
            policy: self.policy,
        }
    }

    fn resting_phase(&self) -> Phase {
        if self.has_model() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Applied, DecodeErrorPolicy, LoadRequest, Phase, Submission, ViewerSession};
    use crate::error::LoadError;
    use crate::scene::model::Model;
    use crate::upload::intake::{FileCandidate, IntakeLimits, ModelSource};
    use crate::upload::worker::{LoadEvent, LoadEventKind};
    use std::path::PathBuf;

    const MB: u64 = 1024 * 1024;

    fn candidate(name: &str, size_bytes: u64) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            size_bytes,
            source: ModelSource::Path(PathBuf::from(name)),
        }
    }

    fn session() -> ViewerSession {
        ViewerSession::new(IntakeLimits::default(), DecodeErrorPolicy::Clear)
    }

    fn load(session: &mut ViewerSession, name: &str) -> LoadRequest {
        match session.submit(candidate(name, 10 * MB)) {
            Submission::Load(request) => request,
            other => panic!("expected a load, got {other:?}"),
        }
    }

    fn complete(request: &LoadRequest, name: &str) -> LoadEvent {
        LoadEvent {
            ticket: request.ticket,
            kind: LoadEventKind::Complete(Model::new(name, Vec::new(), Vec::new())),
        }
    }

    #[test]
    fn accepted_file_starts_loading() {
        let mut s = session();
        let request = load(&mut s, "model.glb");
        assert_eq!(s.current_ticket(), Some(request.ticket));
        assert_eq!(s.progress(), Some(0.0));
        let file = s.file().expect("file info");
        assert_eq!((file.name.as_str(), file.size.as_str()), ("model.glb", "10 MB"));
    }

    #[test]
    fn large_file_waits_for_confirmation() {
        let mut s = session();
        assert!(matches!(
            s.submit(candidate("big.glb", 150 * MB)),
            Submission::NeedsConfirmation
        ));
        assert!(matches!(s.phase(), Phase::AwaitingConfirmation { .. }));
        assert!(s.warning().is_some());
        assert!(!s.is_loading());

        let request = s.confirm().expect("confirmed load");
        assert_eq!(request.name, "big.glb");
        assert!(s.is_loading());
        assert!(s.warning().is_none());
        assert!(s.confirm().is_none());
    }

    #[test]
    fn cancelling_confirmation_returns_to_rest() {
        let mut s = session();
        s.submit(candidate("big.glb", 150 * MB));
        s.cancel_pending();
        assert!(matches!(s.phase(), Phase::Idle));
        assert!(s.file().is_none());

        let request = load(&mut s, "small.glb");
        s.apply(complete(&request, "small"));
        s.submit(candidate("big.glb", 150 * MB));
        s.cancel_pending();
        assert!(matches!(s.phase(), Phase::Ready));
        assert_eq!(s.file().map(|f| f.name.as_str()), Some("small.glb"));
    }

    #[test]
    fn rejected_file_never_loads() {
        let mut s = session();
        match s.submit(candidate("huge.glb", 600 * MB)) {
            Submission::Rejected(_) => {}
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(matches!(s.phase(), Phase::Failed));
        assert!(s.error().is_some_and(|e| e.contains("too large")));
        assert!(s.current_ticket().is_none());

        s.dismiss_error();
        assert!(matches!(s.phase(), Phase::Idle));
        assert!(s.error().is_none());
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let mut s = session();
        let request = load(&mut s, "model.glb");
        let progress = |p| LoadEvent {
            ticket: request.ticket,
            kind: LoadEventKind::Progress(p),
        };
        assert!(matches!(s.apply(progress(40.0)), Applied::Progress(p) if p == 40.0));
        assert!(matches!(s.apply(progress(20.0)), Applied::Progress(p) if p == 40.0));
        assert!(matches!(s.apply(progress(250.0)), Applied::Progress(p) if p == 100.0));
    }

    #[test]
    fn only_the_latest_completion_is_presented() {
        let mut s = session();
        let first = load(&mut s, "first.glb");
        let second = load(&mut s, "second.glb");
        assert!(second.ticket > first.ticket);

        assert!(matches!(s.apply(complete(&first, "first")), Applied::Stale));
        assert!(s.is_loading());
        match s.apply(complete(&second, "second")) {
            Applied::Present(model) => assert_eq!(model.name, "second"),
            other => panic!("expected present, got {other:?}"),
        }
        assert!(matches!(s.apply(complete(&second, "again")), Applied::Stale));
        assert!(matches!(s.phase(), Phase::Ready));
    }

    #[test]
    fn decode_failure_follows_the_policy() {
        for policy in [DecodeErrorPolicy::Clear, DecodeErrorPolicy::KeepPrevious] {
            let mut s = ViewerSession::new(IntakeLimits::default(), policy);
            let ok = load(&mut s, "good.glb");
            s.apply(complete(&ok, "good"));

            let bad = load(&mut s, "bad.glb");
            let applied = s.apply(LoadEvent {
                ticket: bad.ticket,
                kind: LoadEventKind::Failed(LoadError::Empty),
            });
            assert!(matches!(applied, Applied::Failed { policy: p } if p == policy));
            assert!(s.file().is_none());
            assert_eq!(s.error(), Some(super::DECODE_FAILED_MESSAGE));
            assert_eq!(s.has_model(), policy == DecodeErrorPolicy::KeepPrevious);
        }
    }

    #[test]
    fn reset_makes_in_flight_events_stale() {
        let mut s = session();
        let request = load(&mut s, "model.glb");
        s.reset();
        assert!(matches!(s.phase(), Phase::Idle));
        assert!(matches!(s.apply(complete(&request, "late")), Applied::Stale));
        assert!(!s.has_model());
    }
}
