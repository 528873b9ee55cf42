use crate::mouse_gestures::db::{resolve, GestureAction, GestureMap};
use crate::mouse_gestures::dispatch::ActionDispatcher;
use crate::mouse_gestures::engine::{
    GestureString, GestureTracker, Point, TrackOutcome, TrackerState,
};
use crate::mouse_gestures::exclusion::{host_of, ExclusionList};
use crate::mouse_gestures::overlay::{Feedback, FeedbackOverlay, FeedbackSink};
use crate::settings::GestureSettings;
use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::rc::Rc;

/// Where the page reads its settings from.
pub trait ConfigSource {
    fn load(&self) -> anyhow::Result<GestureSettings>;
}

impl ConfigSource for GestureSettings {
    fn load(&self) -> anyhow::Result<GestureSettings> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> anyhow::Result<GestureSettings> {
        GestureSettings::load(&self.path)
    }
}

fn load_settings(source: &dyn ConfigSource) -> GestureSettings {
    match source.load() {
        Ok(mut settings) => {
            settings.sanitize();
            settings
        }
        Err(err) => {
            tracing::warn!(?err, "failed to read gesture settings; using defaults");
            GestureSettings::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

pub const TRIGGER_BUTTON: PointerButton = PointerButton::Secondary;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerTarget {
    #[default]
    Content,
    /// Text inputs, text areas, selects and content-editable elements.
    Editable,
    /// The element under the pointer is gone from the document.
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Hidden,
    Blur,
    PageHide,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageEvent {
    PointerDown {
        button: PointerButton,
        x: f32,
        y: f32,
        #[serde(default)]
        target: PointerTarget,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp {
        button: PointerButton,
        x: f32,
        y: f32,
    },
    ContextMenu,
    Cancel {
        reason: CancelReason,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Ignored,
    Started,
    Moved(Feedback),
    /// Released without a gesture; the native context menu must be left alone.
    Tap,
    Completed {
        gesture: GestureString,
        action: GestureAction,
    },
    ContextMenu {
        suppressed: bool,
    },
    Cancelled {
        discarded: bool,
    },
}

impl EventOutcome {
    /// Whether the host should prevent the platform default for this event.
    pub fn suppresses_default(&self) -> bool {
        matches!(
            self,
            EventOutcome::Completed { .. } | EventOutcome::ContextMenu { suppressed: true }
        )
    }
}

/// Gesture recognition for one page.
///
/// Created through [`attach`](Self::attach), which refuses pages matched by an
/// exclusion rule. Settings are read once and memoized; each session keeps
/// the snapshot it started with even if [`refresh_config`](Self::refresh_config)
/// runs mid-gesture.
pub struct GestureService<D: ActionDispatcher, S: FeedbackSink> {
    page_url: String,
    source: Box<dyn ConfigSource>,
    settings: OnceCell<Rc<GestureSettings>>,
    session_settings: Option<Rc<GestureSettings>>,
    tracker: GestureTracker,
    dispatcher: D,
    overlay: FeedbackOverlay<S>,
    suppress_context_menu: bool,
}

impl<D: ActionDispatcher, S: FeedbackSink> GestureService<D, S> {
    /// Install gesture recognition on `url`, or return `None` when the page is excluded.
    pub fn attach(
        url: &str,
        source: impl ConfigSource + 'static,
        dispatcher: D,
        sink: S,
    ) -> Option<Self> {
        let settings = OnceCell::new();
        let loaded = settings
            .get_or_init(|| Rc::new(load_settings(&source)))
            .clone();

        let host = host_of(url).unwrap_or_default();
        let exclusions = ExclusionList::new(&loaded.excluded_urls);
        if let Some(rule) = exclusions.first_match(url, &host) {
            tracing::info!(url, rule = %rule.source(), "mouse gestures disabled for page");
            return None;
        }

        tracing::debug!(url, rules = exclusions.rules().len(), "mouse gestures attached");
        Some(Self {
            page_url: url.to_string(),
            source: Box::new(source),
            tracker: GestureTracker::new(loaded.tracker),
            overlay: FeedbackOverlay::new(sink, loaded.show_trail),
            settings,
            session_settings: None,
            dispatcher,
            suppress_context_menu: false,
        })
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn sink(&self) -> &S {
        self.overlay.sink()
    }

    pub fn settings(&self) -> Rc<GestureSettings> {
        self.settings
            .get_or_init(|| Rc::new(load_settings(self.source.as_ref())))
            .clone()
    }

    /// Drop the memoized settings. The next session start reads them again;
    /// a session already in progress is unaffected.
    pub fn refresh_config(&mut self) {
        self.settings = OnceCell::new();
    }

    pub fn handle_event(&mut self, event: PageEvent) -> EventOutcome {
        match event {
            PageEvent::PointerDown {
                button,
                x,
                y,
                target,
            } => self.on_pointer_down(button, Point::new(x, y), target),
            PageEvent::PointerMove { x, y } => self.on_pointer_move(Point::new(x, y)),
            PageEvent::PointerUp { button, .. } => self.on_pointer_up(button),
            PageEvent::ContextMenu => self.on_context_menu(),
            PageEvent::Cancel { reason } => self.force_idle(reason),
        }
    }

    pub fn on_pointer_down(
        &mut self,
        button: PointerButton,
        point: Point,
        target: PointerTarget,
    ) -> EventOutcome {
        if button != TRIGGER_BUTTON {
            return EventOutcome::Ignored;
        }
        match target {
            PointerTarget::Content => {}
            PointerTarget::Editable => return EventOutcome::Ignored,
            PointerTarget::Detached => {
                if self.tracker.cancel() {
                    self.overlay.clear();
                }
                self.session_settings = None;
                return EventOutcome::Ignored;
            }
        }

        let settings = self.settings();
        if *self.tracker.config() != settings.tracker {
            self.tracker = GestureTracker::new(settings.tracker);
        }
        self.overlay.set_show_trail(settings.show_trail);
        self.session_settings = Some(settings);
        self.suppress_context_menu = false;

        self.tracker.begin(point);
        self.overlay.update_trail(self.tracker.trail());
        EventOutcome::Started
    }

    pub fn on_pointer_move(&mut self, point: Point) -> EventOutcome {
        if !self.tracker.is_active() {
            return EventOutcome::Ignored;
        }
        if let Some(dir) = self.tracker.feed_point(point) {
            tracing::trace!(token = %dir.token(), "gesture direction");
        }

        let feedback = if self.tracker.is_armed() {
            let gesture = self.tracker.gesture_so_far();
            let action = resolve(&gesture, self.session_map());
            Feedback::resolved(gesture, action)
        } else {
            Feedback::arming()
        };
        self.overlay.show(&feedback);
        self.overlay.update_trail(self.tracker.trail());
        EventOutcome::Moved(feedback)
    }

    pub fn on_pointer_up(&mut self, button: PointerButton) -> EventOutcome {
        if !self.tracker.is_active() || button != TRIGGER_BUTTON {
            return EventOutcome::Ignored;
        }

        let gesture = match self.tracker.finish() {
            TrackOutcome::NoGesture => {
                self.overlay.finish_tap();
                self.end_session();
                return EventOutcome::Tap;
            }
            TrackOutcome::Gesture(gesture) => gesture,
        };

        self.suppress_context_menu = true;
        let action = resolve(&gesture, self.session_map());
        tracing::debug!(gesture = %gesture, action = %action, "mouse gesture");

        self.overlay.show(&Feedback::resolved(gesture.clone(), action));
        // Hide before dispatching: tab switches and closes may leave this page
        // before a delayed hide could run.
        self.overlay.finish_gesture(action);

        if !action.is_none() {
            if let Err(err) = self.dispatcher.dispatch(&gesture, action) {
                tracing::warn!(?err, gesture = %gesture, action = %action, "gesture dispatch failed");
            }
        }

        self.end_session();
        EventOutcome::Completed { gesture, action }
    }

    /// The native context menu fires right after the release that finished a
    /// gesture; swallow exactly that one.
    pub fn on_context_menu(&mut self) -> EventOutcome {
        let suppressed = std::mem::take(&mut self.suppress_context_menu);
        EventOutcome::ContextMenu { suppressed }
    }

    /// Return to `Idle` immediately, discarding any session and its feedback.
    pub fn force_idle(&mut self, reason: CancelReason) -> EventOutcome {
        self.overlay.clear();
        let discarded = self.tracker.cancel();
        self.session_settings = None;
        if discarded {
            tracing::debug!(?reason, "mouse gesture cancelled");
        }
        EventOutcome::Cancelled { discarded }
    }

    fn session_map(&self) -> &GestureMap {
        match self.session_settings.as_deref() {
            Some(settings) => &settings.gesture_map,
            None => empty_map(),
        }
    }

    fn end_session(&mut self) {
        self.tracker.reset();
        self.session_settings = None;
    }
}

fn empty_map() -> &'static GestureMap {
    static EMPTY: once_cell::sync::Lazy<GestureMap> = once_cell::sync::Lazy::new(GestureMap::empty);
    &EMPTY
}
