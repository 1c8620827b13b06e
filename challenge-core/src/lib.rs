//! Interaction capture and submission engine for challenge widgets.
//!
//! Raw pointer input is normalized ([`pointer`]), folded into a per-variant
//! state ([`accumulator`]), checked for completion after every mutation
//! ([`completion`]) and dispatched at most once ([`gate`]). Variants are
//! described by the static [`registry`].

pub mod accumulator;
pub mod completion;
pub mod descriptor;
pub mod error;
pub mod gate;
pub mod pointer;
pub mod registry;
pub mod session;
pub mod state;
pub mod swap;

pub use accumulator::{Accumulator, DragTarget, GestureEvent, TrackMetrics, Update};
pub use completion::CompletionPolicy;
pub use descriptor::{Ack, ChallengeDescriptor, ChoiceImages, SubmitRequest};
pub use error::{FetchError, RegistryError, SubmitError};
pub use gate::{SubmissionGate, SubmissionSink, record_ack};
pub use pointer::{BoundingBox, NormalizedPoint, Point, PointerNormalizer, Surface};
pub use registry::{VariantEntry, VariantKey};
pub use session::{Applied, ChallengeSession};
pub use state::{StateShape, StateValue};
