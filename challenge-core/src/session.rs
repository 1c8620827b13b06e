use log::debug;

use crate::accumulator::{Accumulator, GestureEvent, Update};
use crate::completion::CompletionPolicy;
use crate::descriptor::{ChallengeDescriptor, SubmitRequest};
use crate::error::RegistryError;
use crate::gate::{SubmissionGate, SubmissionSink};
use crate::registry::{VariantEntry, VariantKey};
use crate::state::{StateShape, StateValue};

/// Result of routing one event through a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    pub update: Update,
    /// The completion policy fired on this event.
    pub complete: bool,
}

/// One challenge being solved. Owned by a single UI flow.
#[derive(Clone, Debug)]
pub struct ChallengeSession {
    id: String,
    entry: &'static VariantEntry,
    accumulator: Accumulator,
    policy: CompletionPolicy,
    shape: StateShape,
    submitted: bool,
}

impl ChallengeSession {
    pub fn new(
        id: impl Into<String>,
        entry: &'static VariantEntry,
        descriptor: &ChallengeDescriptor,
    ) -> Result<Self, RegistryError> {
        let (accumulator, policy) = entry.build(descriptor)?;
        let shape = accumulator.shape();
        Ok(ChallengeSession {
            id: id.into(),
            entry,
            accumulator,
            policy,
            shape,
            submitted: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn variant(&self) -> VariantKey {
        self.entry.key
    }

    pub fn entry(&self) -> &'static VariantEntry {
        self.entry
    }

    pub fn policy(&self) -> CompletionPolicy {
        self.policy
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn state(&self) -> StateValue {
        self.accumulator.snapshot()
    }

    pub fn shape(&self) -> StateShape {
        self.shape
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    pub fn submit_request(&self) -> SubmitRequest {
        SubmitRequest {
            id: self.id.clone(),
            state: self.state(),
            variant_tag: self.entry.variant_tag,
        }
    }

    /// Apply `event` and evaluate the completion policy. Does not submit.
    pub fn apply(&mut self, event: &GestureEvent) -> Applied {
        let update = self.accumulator.apply(event);
        debug_assert_eq!(self.accumulator.shape(), self.shape);
        if update == Update::Ignored {
            debug!("session {}: dropped {event:?}", self.id);
        }
        let complete = self.policy.is_complete(update, self.accumulator.progress());
        if complete {
            self.accumulator.freeze();
        }
        Applied { update, complete }
    }

    /// Apply `event` and hand the session to `gate` when it completes.
    pub fn handle<S: SubmissionSink>(
        &mut self,
        event: GestureEvent,
        gate: &SubmissionGate<S>,
    ) -> Applied {
        let applied = self.apply(&event);
        if applied.complete {
            gate.trigger(self);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::accumulator::{DragTarget, TrackMetrics};
    use crate::pointer::{BoundingBox, Point, Surface};
    use crate::registry;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<SubmitRequest>>);

    impl SubmissionSink for Recorder {
        fn dispatch(&self, request: SubmitRequest) {
            self.0.borrow_mut().push(request);
        }
    }

    fn session(key: &str, d: serde_json::Value) -> ChallengeSession {
        let d: ChallengeDescriptor = serde_json::from_value(d).unwrap();
        ChallengeSession::new("1", registry::lookup(key).unwrap(), &d).unwrap()
    }

    #[test]
    fn text_submits_on_sixth_character_and_locks() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session("botdetect", json!({"labels": ["k3x9qa"]}));
        for typed in ["k", "k3", "k3x", "k3x9", "k3x9q"] {
            let applied = s.handle(GestureEvent::Edit(typed.into()), &gate);
            assert!(!applied.complete);
        }
        assert!(rec.0.borrow().is_empty());
        let applied = s.handle(GestureEvent::Edit("k3x9qa".into()), &gate);
        assert!(applied.complete);
        let applied = s.handle(GestureEvent::Edit("k3x9qaz".into()), &gate);
        assert_eq!(applied.update, Update::Ignored);
        let sent = rec.0.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].state, StateValue::Text("k3x9qa".into()));
    }

    #[test]
    fn tencent_submits_on_first_valid_click() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session("tencent", json!({}));
        let surface = Surface::new(BoundingBox::new(0.0, 0.0, 340.0, 230.0));
        s.handle(
            GestureEvent::Click {
                at: Point { x: 400.0, y: 10.0 },
                surface,
            },
            &gate,
        );
        assert!(!s.is_submitted());
        s.handle(
            GestureEvent::Click {
                at: Point { x: 170.0, y: 23.0 },
                surface,
            },
            &gate,
        );
        assert!(s.is_submitted());
        assert_eq!(
            serde_json::to_value(&rec.0.borrow()[0]).unwrap(),
            json!({"id": "1", "state": [0.5, 0.1]})
        );
    }

    #[test]
    fn slider_submits_on_release_only() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session("baidu", json!({}));
        s.handle(
            GestureEvent::DragStart {
                at: Point { x: 0.0, y: 0.0 },
                target: DragTarget::Handle(TrackMetrics {
                    max_distance: 240.0,
                    reference_width: 240.0,
                }),
            },
            &gate,
        );
        s.handle(GestureEvent::DragMove { at: Point { x: 60.0, y: 3.0 } }, &gate);
        assert!(rec.0.borrow().is_empty());
        assert!(s.handle(GestureEvent::DragEnd, &gate).complete);
        assert!(!s.handle(GestureEvent::DragEnd, &gate).complete);
        let sent = rec.0.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].state, StateValue::Scalar(90.0));
    }

    #[test]
    fn cancelled_drags_do_not_submit() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session("baidu", json!({}));
        s.handle(
            GestureEvent::DragStart {
                at: Point { x: 0.0, y: 0.0 },
                target: DragTarget::Handle(TrackMetrics {
                    max_distance: 240.0,
                    reference_width: 240.0,
                }),
            },
            &gate,
        );
        s.handle(GestureEvent::DragMove { at: Point { x: 8.0, y: 0.0 } }, &gate);
        assert!(!s.handle(GestureEvent::DragCancel, &gate).complete);
        assert!(!s.handle(GestureEvent::DragEnd, &gate).complete);
        assert!(rec.0.borrow().is_empty());
        assert!(!s.is_submitted());

        let mut s = session("lemin", json!({"n_holes": 1, "n_pieces": 2}));
        let grid = BoundingBox::new(0.0, 0.0, 200.0, 200.0);
        s.handle(
            GestureEvent::DragStart {
                at: Point { x: 20.0, y: 20.0 },
                target: DragTarget::Piece { piece: 0, grid },
            },
            &gate,
        );
        s.handle(GestureEvent::DragCancel, &gate);
        assert_eq!(s.state(), StateValue::Placements(Vec::new()));
        assert!(rec.0.borrow().is_empty());
    }

    #[test]
    fn hcaptcha_area_sends_variant_tag() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session("hcaptcha_area", json!({}));
        s.handle(GestureEvent::Confirm, &gate);
        assert_eq!(rec.0.borrow()[0].variant_tag, Some("area"));
        assert_eq!(rec.0.borrow()[0].state, StateValue::Point(None));
    }

    #[test]
    fn confirm_before_click_sends_origin() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let mut s = session("amazon", json!({}));
        s.handle(GestureEvent::Confirm, &gate);
        assert_eq!(
            serde_json::to_value(&rec.0.borrow()[0]).unwrap(),
            json!({"id": "1", "state": [0.0, 0.0]})
        );
    }

    #[test]
    fn gobang_submits_after_one_swap() {
        let rec = Recorder::default();
        let gate = SubmissionGate::new(&rec);
        let grid: Vec<Vec<u32>> = (0..5).map(|r| (0..5).map(|c| r * 5 + c).collect()).collect();
        let mut s = session("geetest_gobang", json!({ "grid": grid }));
        s.handle(GestureEvent::SelectCell { row: 0, col: 0 }, &gate);
        assert!(rec.0.borrow().is_empty());
        s.handle(GestureEvent::SelectCell { row: 4, col: 4 }, &gate);
        let sent = rec.0.borrow();
        assert_eq!(sent.len(), 1);
        let StateValue::Grid(g) = &sent[0].state else {
            panic!("expected grid state");
        };
        assert_eq!((g[0][0], g[4][4]), (24, 0));
    }
}
