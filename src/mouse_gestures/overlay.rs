use crate::mouse_gestures::db::GestureAction;
use crate::mouse_gestures::engine::{GestureString, Point};
use std::time::Duration;

pub const TAP_HIDE_DELAY: Duration = Duration::from_millis(200);
pub const ACTION_HIDE_DELAY: Duration = Duration::from_millis(450);

/// Snapshot of tracker state handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub armed: bool,
    pub gesture: GestureString,
    pub action: Option<GestureAction>,
    pub invalid: bool,
}

impl Feedback {
    pub fn arming() -> Self {
        Self {
            armed: false,
            gesture: GestureString::default(),
            action: None,
            invalid: false,
        }
    }

    /// Project an armed gesture and its resolution. `none` is reported as
    /// invalid without a label; an empty gesture is neither.
    pub fn resolved(gesture: GestureString, action: GestureAction) -> Self {
        if gesture.is_empty() {
            return Self {
                armed: true,
                gesture,
                action: None,
                invalid: false,
            };
        }
        let invalid = action.is_none();
        Self {
            armed: true,
            gesture,
            action: (!invalid).then_some(action),
            invalid,
        }
    }

    pub fn action_label(&self) -> Option<&'static str> {
        self.action.map(GestureAction::label)
    }

    pub fn hint_text(&self) -> String {
        if !self.armed {
            return "Mouse gesture: ready…".to_string();
        }
        if self.gesture.is_empty() {
            return "Gesture: …".to_string();
        }
        let arrows = self.gesture.arrows();
        match self.action_label() {
            Some(label) => format!("Gesture: {arrows}    {label}"),
            None => format!("Invalid gesture: {arrows}"),
        }
    }
}

/// Rendering surface for the trail and hint bubble.
pub trait FeedbackSink {
    fn show(&mut self, feedback: &Feedback);
    fn draw_trail(&mut self, points: &[Point]);
    fn clear_trail(&mut self);
    /// Hide the hint after `delay`, replacing any hide already scheduled.
    fn hide(&mut self, delay: Duration);
    /// Cancel any scheduled hide and remove the hint right now.
    fn hard_hide(&mut self);
}

#[derive(Debug, Default)]
pub struct NoopFeedbackSink;

impl FeedbackSink for NoopFeedbackSink {
    fn show(&mut self, _feedback: &Feedback) {}
    fn draw_trail(&mut self, _points: &[Point]) {}
    fn clear_trail(&mut self) {}
    fn hide(&mut self, _delay: Duration) {}
    fn hard_hide(&mut self) {}
}

/// Logs every feedback update at `debug`.
#[derive(Debug, Default)]
pub struct TracingFeedbackSink;

impl FeedbackSink for TracingFeedbackSink {
    fn show(&mut self, feedback: &Feedback) {
        tracing::debug!(
            armed = feedback.armed,
            gesture = %feedback.gesture,
            invalid = feedback.invalid,
            hint = %feedback.hint_text(),
            "gesture feedback"
        );
    }

    fn draw_trail(&mut self, points: &[Point]) {
        tracing::trace!(points = points.len(), "gesture trail");
    }

    fn clear_trail(&mut self) {}

    fn hide(&mut self, delay: Duration) {
        tracing::trace!(delay_ms = delay.as_millis() as u64, "hide gesture hint");
    }

    fn hard_hide(&mut self) {
        tracing::trace!("hard hide gesture hint");
    }
}

/// Applies the trail setting and the hide-delay policy in front of a sink.
pub struct FeedbackOverlay<S: FeedbackSink> {
    sink: S,
    show_trail: bool,
    trail_visible: bool,
}

impl<S: FeedbackSink> FeedbackOverlay<S> {
    pub fn new(sink: S, show_trail: bool) -> Self {
        Self {
            sink,
            show_trail,
            trail_visible: false,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn set_show_trail(&mut self, show_trail: bool) {
        self.show_trail = show_trail;
    }

    pub fn update_trail(&mut self, points: &[Point]) {
        if self.show_trail {
            self.sink.draw_trail(points);
            self.trail_visible = true;
        }
    }

    pub fn show(&mut self, feedback: &Feedback) {
        self.sink.show(feedback);
    }

    /// Release without a gesture.
    pub fn finish_tap(&mut self) {
        self.clear_trail();
        self.sink.hide(TAP_HIDE_DELAY);
    }

    /// Release after a gesture resolved to `action`.
    pub fn finish_gesture(&mut self, action: GestureAction) {
        self.clear_trail();
        if action.hides_immediately() {
            self.sink.hard_hide();
        } else {
            self.sink.hide(ACTION_HIDE_DELAY);
        }
    }

    /// Drop everything immediately; used on cancellation.
    pub fn clear(&mut self) {
        self.clear_trail();
        self.sink.hard_hide();
    }

    fn clear_trail(&mut self) {
        if self.trail_visible {
            self.sink.clear_trail();
            self.trail_visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_text_variants() {
        assert_eq!(Feedback::arming().hint_text(), "Mouse gesture: ready…");
        assert_eq!(
            Feedback::resolved(GestureString::default(), GestureAction::None).hint_text(),
            "Gesture: …"
        );
        let ur: GestureString = "UR".parse().expect("gesture");
        assert_eq!(
            Feedback::resolved(ur.clone(), GestureAction::TabRight).hint_text(),
            "Gesture: ↑→    Switch to right tab"
        );
        let miss = Feedback::resolved(ur, GestureAction::None);
        assert!(miss.invalid);
        assert_eq!(miss.action_label(), None);
        assert_eq!(miss.hint_text(), "Invalid gesture: ↑→");
    }
}
