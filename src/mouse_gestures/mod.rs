pub mod db;
pub mod dispatch;
pub mod engine;
pub mod exclusion;
pub mod overlay;
pub mod service;

pub use db::{resolve, ActionScope, GestureAction, GestureMap};
pub use dispatch::{ActionDispatcher, BrowserActions, BrowserDispatcher, PageActions};
pub use engine::{direction_from_delta, Direction, GestureString, GestureTracker, TrackerState};
pub use exclusion::{is_excluded, ExclusionList, ExclusionRule};
pub use overlay::{Feedback, FeedbackSink};
pub use service::{
    CancelReason, ConfigSource, EventOutcome, FileConfigSource, GestureService, PageEvent,
    PointerButton, PointerTarget,
};
