use crate::accumulator::Update;

/// When accumulated state becomes final.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionPolicy {
    /// Only an explicit confirmation completes the session.
    ExplicitAction,
    /// Completes as soon as progress equals `required`. An explicit
    /// confirmation, when the widget offers one, also completes.
    Threshold { required: usize },
    /// Completes when a drag is released; moves before release never do.
    ReleaseTriggered,
}

impl CompletionPolicy {
    /// Whether `update`, leaving the accumulator at `progress`, completes the
    /// session. Re-evaluating after completion may return `true` again; the
    /// submission gate absorbs repeats.
    pub fn is_complete(&self, update: Update, progress: usize) -> bool {
        match (*self, update) {
            (_, Update::Ignored | Update::Tracking) => false,
            (CompletionPolicy::ExplicitAction, update) => update == Update::Confirmed,
            (CompletionPolicy::Threshold { .. }, Update::Confirmed) => true,
            (CompletionPolicy::Threshold { required }, _) => progress == required,
            (CompletionPolicy::ReleaseTriggered, update) => update == Update::Released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_action_waits_for_confirm() {
        let p = CompletionPolicy::ExplicitAction;
        assert!(!p.is_complete(Update::Changed, 5));
        assert!(!p.is_complete(Update::Released, 5));
        assert!(p.is_complete(Update::Confirmed, 0));
    }

    #[test]
    fn threshold_fires_on_exact_count() {
        let p = CompletionPolicy::Threshold { required: 3 };
        assert!(!p.is_complete(Update::Released, 2));
        assert!(p.is_complete(Update::Released, 3));
        assert!(!p.is_complete(Update::Changed, 4));
        assert!(!p.is_complete(Update::Tracking, 3));
    }

    #[test]
    fn release_ignores_moves() {
        let p = CompletionPolicy::ReleaseTriggered;
        assert!(!p.is_complete(Update::Changed, 0));
        assert!(!p.is_complete(Update::Confirmed, 0));
        assert!(p.is_complete(Update::Released, 0));
    }
}
