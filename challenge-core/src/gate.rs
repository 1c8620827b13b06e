use std::rc::Rc;

use log::{debug, info, warn};

use crate::descriptor::{Ack, SubmitRequest};
use crate::error::SubmitError;
use crate::session::ChallengeSession;

/// Transport for submissions. Dispatch is fire-and-forget: implementations
/// start the request and report its outcome through [`record_ack`].
pub trait SubmissionSink {
    fn dispatch(&self, request: SubmitRequest);
}

impl<S: SubmissionSink + ?Sized> SubmissionSink for &S {
    fn dispatch(&self, request: SubmitRequest) {
        (**self).dispatch(request)
    }
}

impl<S: SubmissionSink + ?Sized> SubmissionSink for Rc<S> {
    fn dispatch(&self, request: SubmitRequest) {
        (**self).dispatch(request)
    }
}

/// At-most-once dispatcher of a session's final state.
#[derive(Debug)]
pub struct SubmissionGate<S> {
    sink: S,
}

impl<S: SubmissionSink> SubmissionGate<S> {
    pub fn new(sink: S) -> Self {
        SubmissionGate { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Submit `session` unless it already was. The session is marked before
    /// the request is handed to the sink, so a trigger arriving while the
    /// request is in flight is a no-op. Returns whether a dispatch happened.
    pub fn trigger(&self, session: &mut ChallengeSession) -> bool {
        if session.is_submitted() {
            debug!("session {} already submitted; trigger ignored", session.id());
            return false;
        }
        session.mark_submitted();
        let request = session.submit_request();
        info!(
            "submitting session {} ({})",
            session.id(),
            session.variant()
        );
        self.sink.dispatch(request);
        true
    }
}

/// Log the outcome of a dispatched submission. Failures are not retried and do
/// not reopen the session.
pub fn record_ack(id: &str, outcome: Result<Ack, SubmitError>) {
    match outcome {
        Ok(ack) => match ack.solved {
            Some(solved) => info!("session {id} acknowledged, solved: {solved}"),
            None => info!("session {id} acknowledged"),
        },
        Err(e) => warn!("session {id}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::accumulator::GestureEvent;
    use crate::descriptor::ChallengeDescriptor;
    use crate::registry;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<SubmitRequest>>);

    impl SubmissionSink for Recorder {
        fn dispatch(&self, request: SubmitRequest) {
            self.0.borrow_mut().push(request);
        }
    }

    fn session() -> ChallengeSession {
        let entry = registry::lookup("arkose_paged").unwrap();
        let descriptor = ChallengeDescriptor {
            images: crate::descriptor::ChoiceImages::List(vec!["a".into(), "b".into()]),
            ..Default::default()
        };
        ChallengeSession::new("4", entry, &descriptor).unwrap()
    }

    #[test]
    fn double_trigger_dispatches_once() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session();
        assert!(gate.trigger(&mut s));
        assert!(!gate.trigger(&mut s));
        assert!(s.is_submitted());
        assert_eq!(rec.0.borrow().len(), 1);
    }

    #[test]
    fn failed_ack_keeps_session_closed() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session();
        s.handle(GestureEvent::Confirm, &gate);
        record_ack(
            s.id(),
            Err(SubmitError::Transport("network unreachable".into())),
        );
        s.handle(GestureEvent::Confirm, &gate);
        assert!(s.is_submitted());
        assert_eq!(rec.0.borrow().len(), 1);
    }
}
