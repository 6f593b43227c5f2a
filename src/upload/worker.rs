use crate::error::LoadError;
use crate::scene::model::Model;
use crate::upload::intake::ModelSource;
use crate::upload::session::{LoadRequest, LoadTicket};
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::Arc;
use std::thread;

/// Turns a file into a [`Model`].
///
/// `progress` takes percentages in `0..=100`. Implementations should check
/// `cancel` between units of work and return [`LoadError::Cancelled`] once it
/// is raised.
pub trait SceneDecoder: Send + Sync + 'static {
    fn decode(
        &self,
        source: &ModelSource,
        progress: &mut dyn FnMut(f32),
        cancel: &AtomicBool,
    ) -> Result<Model, LoadError>;
}

#[derive(Debug)]
pub enum LoadEventKind {
    Progress(f32),
    Complete(Model),
    Failed(LoadError),
}

/// Something a background decode reported, tagged with its attempt.
#[derive(Debug)]
pub struct LoadEvent {
    pub ticket: LoadTicket,
    pub kind: LoadEventKind,
}

type Notify = Arc<dyn Fn() + Send + Sync>;

/// Runs each [`LoadRequest`] on its own thread and collects the events.
///
/// Only one decode is wanted at a time: dispatching raises the previous
/// attempt's cancel flag. Whatever it still sends is left for the session to
/// discard by ticket.
pub struct LoadDispatcher<D: SceneDecoder> {
    decoder: Arc<D>,
    sender: Sender<LoadEvent>,
    receiver: Receiver<LoadEvent>,
    in_flight: Option<(LoadTicket, Arc<AtomicBool>)>,
    notify: Option<Notify>,
}

impl<D: SceneDecoder> LoadDispatcher<D> {
    pub fn new(decoder: D) -> Self {
        let (sender, receiver) = channel();
        Self {
            decoder: Arc::new(decoder),
            sender,
            receiver,
            in_flight: None,
            notify: None,
        }
    }

    /// Called from the worker after every event, e.g. to wake the UI.
    pub fn with_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    pub fn in_flight(&self) -> Option<LoadTicket> {
        self.in_flight.as_ref().map(|(ticket, _)| *ticket)
    }

    pub fn dispatch(&mut self, request: LoadRequest) {
        self.cancel_in_flight();

        let cancel = Arc::new(AtomicBool::new(false));
        let ticket = request.ticket;
        let decoder = Arc::clone(&self.decoder);
        let sender = self.sender.clone();
        let notify = self.notify.clone();
        let flag = Arc::clone(&cancel);
        let name = request.name.clone();

        let spawned = thread::Builder::new()
            .name(format!("decode-{}", ticket.0))
            .spawn(move || {
                let emit = |kind: LoadEventKind| {
                    // The dispatcher owns a sender too, so this only fails
                    // after the dispatcher itself is gone.
                    let _ = sender.send(LoadEvent { ticket, kind });
                    if let Some(notify) = &notify {
                        notify();
                    }
                };

                let mut last_whole = -1i32;
                let mut on_progress = |p: f32| {
                    let whole = p.floor() as i32;
                    if whole > last_whole {
                        last_whole = whole;
                        emit(LoadEventKind::Progress(p));
                    }
                };

                let result = decoder.decode(&request.source, &mut on_progress, &flag);
                match result {
                    Ok(model) => emit(LoadEventKind::Complete(model)),
                    Err(LoadError::Cancelled) => {
                        debug!("Load {} cancelled", ticket);
                        emit(LoadEventKind::Failed(LoadError::Cancelled));
                    }
                    Err(err) => emit(LoadEventKind::Failed(err)),
                }
            });

        match spawned {
            Ok(_) => {
                info!("Dispatched load {} for '{}'", ticket, name);
                self.in_flight = Some((ticket, cancel));
            }
            Err(err) => {
                error!("Could not start decode thread: {}", err);
                let _ = self.sender.send(LoadEvent {
                    ticket,
                    kind: LoadEventKind::Failed(LoadError::Io(err)),
                });
            }
        }
    }

    /// Raises the cancel flag of the attempt in flight, if any.
    pub fn cancel_in_flight(&mut self) {
        if let Some((ticket, cancel)) = self.in_flight.take() {
            debug!("Cancelling load {}", ticket);
            cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Drains everything reported since the last poll.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.receiver.try_iter().collect();
        let finished = events.iter().any(|e| {
            Some(e.ticket) == self.in_flight()
                && matches!(e.kind, LoadEventKind::Complete(_) | LoadEventKind::Failed(_))
        });
        if finished {
            self.in_flight = None;
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadDispatcher, LoadEvent, LoadEventKind, SceneDecoder};
    use crate::error::LoadError;
    use crate::scene::model::Model;
    use crate::upload::intake::ModelSource;
    use crate::upload::session::{LoadRequest, LoadTicket};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    /// Names the model after the file and waits for cancellation when the
    /// file is called "slow.glb".
    struct FakeDecoder;

    impl SceneDecoder for FakeDecoder {
        fn decode(
            &self,
            source: &ModelSource,
            progress: &mut dyn FnMut(f32),
            cancel: &AtomicBool,
        ) -> Result<Model, LoadError> {
            let name = source.display_name();
            progress(10.0);
            progress(10.5);
            if name == "slow.glb" {
                let started = Instant::now();
                while !cancel.load(Ordering::Relaxed) {
                    if started.elapsed() > Duration::from_secs(5) {
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(1));
                }
                return Err(LoadError::Cancelled);
            }
            if name == "broken.glb" {
                return Err(LoadError::Empty);
            }
            progress(100.0);
            Ok(Model::new(name, Vec::new(), Vec::new()))
        }
    }

    fn request(ticket: u64, name: &str) -> LoadRequest {
        LoadRequest {
            ticket: LoadTicket(ticket),
            name: name.to_string(),
            source: ModelSource::Path(PathBuf::from(name)),
        }
    }

    /// Polls until every ticket in `tickets` has finished.
    fn drain_until_done<D: SceneDecoder>(
        dispatcher: &mut LoadDispatcher<D>,
        tickets: &[LoadTicket],
    ) -> Vec<LoadEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut all: Vec<LoadEvent> = Vec::new();
        while Instant::now() < deadline {
            all.extend(dispatcher.poll());
            let done = tickets.iter().all(|ticket| {
                all.iter().any(|e| {
                    e.ticket == *ticket
                        && matches!(e.kind, LoadEventKind::Complete(_) | LoadEventKind::Failed(_))
                })
            });
            if done {
                return all;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        panic!("loads {tickets:?} never finished");
    }

    #[test]
    fn completion_arrives_with_its_ticket() {
        let mut dispatcher = LoadDispatcher::new(FakeDecoder);
        dispatcher.dispatch(request(1, "model.glb"));
        assert_eq!(dispatcher.in_flight(), Some(LoadTicket(1)));

        let events = drain_until_done(&mut dispatcher, &[LoadTicket(1)]);
        assert!(dispatcher.in_flight().is_none());
        let progress: Vec<f32> = events
            .iter()
            .filter_map(|e| match e.kind {
                LoadEventKind::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        // 10.5 shares a whole percent with 10 and is coalesced.
        assert_eq!(progress, vec![10.0, 100.0]);
        assert!(matches!(
            events.last().map(|e| &e.kind),
            Some(LoadEventKind::Complete(model)) if model.name == "model.glb"
        ));
    }

    #[test]
    fn failures_are_reported_not_panicked() {
        let mut dispatcher = LoadDispatcher::new(FakeDecoder);
        dispatcher.dispatch(request(7, "broken.glb"));
        let events = drain_until_done(&mut dispatcher, &[LoadTicket(7)]);
        assert!(matches!(
            events.last().map(|e| &e.kind),
            Some(LoadEventKind::Failed(LoadError::Empty))
        ));
    }

    #[test]
    fn new_dispatch_cancels_the_previous_one() {
        let mut dispatcher = LoadDispatcher::new(FakeDecoder);
        dispatcher.dispatch(request(1, "slow.glb"));
        dispatcher.dispatch(request(2, "fast.glb"));
        assert_eq!(dispatcher.in_flight(), Some(LoadTicket(2)));

        let events = drain_until_done(&mut dispatcher, &[LoadTicket(1), LoadTicket(2)]);
        assert!(events.iter().any(|e| e.ticket == LoadTicket(1)
            && matches!(e.kind, LoadEventKind::Failed(LoadError::Cancelled))));
    }

    #[test]
    fn notify_runs_for_each_event() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut dispatcher = LoadDispatcher::new(FakeDecoder).with_notify(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.dispatch(request(3, "model.glb"));
        let events = drain_until_done(&mut dispatcher, &[LoadTicket(3)]);

        // The last notify may still be running when its event is polled.
        let deadline = Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) < events.len() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), events.len());
    }
}
