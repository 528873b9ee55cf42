use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MOVE_THRESHOLD_PX: f32 = 18.0;
pub const ARM_THRESHOLD_PX: f32 = 14.0;
pub const MAX_GESTURE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn token(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    pub fn from_token(token: char) -> Option<Self> {
        match token.to_ascii_uppercase() {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Direction::Up => '↑',
            Direction::Down => '↓',
            Direction::Left => '←',
            Direction::Right => '→',
        }
    }
}

/// Quantize a displacement into a cardinal direction.
///
/// Equal magnitudes resolve to the horizontal axis.
pub fn direction_from_delta(dx: f32, dy: f32) -> Direction {
    if dx.abs() >= dy.abs() {
        if dx > 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from(value: (f32, f32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureParseError {
    Empty,
    TooLong { len: usize },
    InvalidToken { index: usize, token: char },
    RepeatedToken { index: usize },
}

impl fmt::Display for GestureParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GestureParseError::Empty => write!(f, "gesture is empty"),
            GestureParseError::TooLong { len } => {
                write!(f, "gesture has {len} tokens, at most {MAX_GESTURE_LEN} allowed")
            }
            GestureParseError::InvalidToken { index, token } => {
                write!(f, "invalid gesture token {token:?} at {index}")
            }
            GestureParseError::RepeatedToken { index } => {
                write!(f, "gesture repeats the previous token at {index}")
            }
        }
    }
}

impl std::error::Error for GestureParseError {}

/// Adjacent-deduplicated run of directions, at most [`MAX_GESTURE_LEN`] long.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GestureString(Vec<Direction>);

impl GestureString {
    pub fn directions(&self) -> &[Direction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn arrows(&self) -> String {
        self.0.iter().map(|dir| dir.arrow()).collect()
    }
}

impl fmt::Display for GestureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dir in &self.0 {
            write!(f, "{}", dir.token())?;
        }
        Ok(())
    }
}

impl FromStr for GestureString {
    type Err = GestureParseError;

    /// Parses a stored map key. Input is trimmed and case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(GestureParseError::Empty);
        }
        let mut dirs = Vec::with_capacity(trimmed.len());
        for (index, token) in trimmed.chars().enumerate() {
            let dir = Direction::from_token(token)
                .ok_or(GestureParseError::InvalidToken { index, token })?;
            if dirs.last() == Some(&dir) {
                return Err(GestureParseError::RepeatedToken { index });
            }
            dirs.push(dir);
        }
        if dirs.len() > MAX_GESTURE_LEN {
            return Err(GestureParseError::TooLong { len: dirs.len() });
        }
        Ok(Self(dirs))
    }
}

impl Serialize for GestureString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GestureString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackerConfig {
    pub move_threshold_px: f32,
    pub arm_threshold_px: f32,
    pub max_gesture_len: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            move_threshold_px: MOVE_THRESHOLD_PX,
            arm_threshold_px: ARM_THRESHOLD_PX,
            max_gesture_len: MAX_GESTURE_LEN,
        }
    }
}

impl TrackerConfig {
    /// Replace out-of-range values with defaults. Returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let defaults = TrackerConfig::default();
        let mut changed = false;
        if !(self.move_threshold_px.is_finite() && self.move_threshold_px > 0.0) {
            self.move_threshold_px = defaults.move_threshold_px;
            changed = true;
        }
        if !(self.arm_threshold_px.is_finite() && self.arm_threshold_px > 0.0) {
            self.arm_threshold_px = defaults.arm_threshold_px;
            changed = true;
        }
        if !(1..=MAX_GESTURE_LEN).contains(&self.max_gesture_len) {
            self.max_gesture_len = defaults.max_gesture_len;
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Arming,
    Tracking,
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackOutcome {
    /// A tap or a release before any direction was committed.
    NoGesture,
    Gesture(GestureString),
}

#[derive(Debug)]
struct GestureSession {
    origin: Point,
    last_committed: Point,
    trail: Vec<Point>,
    directions: Vec<Direction>,
    armed: bool,
}

impl GestureSession {
    fn new(origin: Point) -> Self {
        Self {
            origin,
            last_committed: origin,
            trail: vec![origin],
            directions: Vec::new(),
            armed: false,
        }
    }
}

#[derive(Debug)]
pub struct GestureTracker {
    config: TrackerConfig,
    state: TrackerState,
    session: Option<GestureSession>,
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl GestureTracker {
    pub fn new(mut config: TrackerConfig) -> Self {
        config.sanitize();
        Self {
            config,
            state: TrackerState::Idle,
            session: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TrackerState::Arming | TrackerState::Tracking)
    }

    pub fn is_armed(&self) -> bool {
        self.session.as_ref().map(|s| s.armed).unwrap_or(false)
    }

    /// Start a new session at `point`, discarding whatever was in progress.
    pub fn begin(&mut self, point: impl Into<Point>) {
        self.session = Some(GestureSession::new(point.into()));
        self.state = TrackerState::Arming;
    }

    /// Feed one pointer sample. Returns the direction appended to the gesture, if any.
    pub fn feed_point(&mut self, point: impl Into<Point>) -> Option<Direction> {
        if !self.is_active() {
            return None;
        }
        let config = self.config;
        let session = self.session.as_mut()?;
        let point = point.into();
        session.trail.push(point);

        if !session.armed && session.origin.distance_to(point) > config.arm_threshold_px {
            session.armed = true;
            self.state = TrackerState::Tracking;
        }

        if session.last_committed.distance_to(point) < config.move_threshold_px {
            return None;
        }

        let dx = point.x - session.last_committed.x;
        let dy = point.y - session.last_committed.y;
        session.last_committed = point;

        let dir = direction_from_delta(dx, dy);
        if session.directions.last() == Some(&dir) {
            return None;
        }
        if session.directions.len() >= config.max_gesture_len {
            return None;
        }
        session.directions.push(dir);
        Some(dir)
    }

    pub fn gesture_so_far(&self) -> GestureString {
        self.session
            .as_ref()
            .map(|s| GestureString(s.directions.clone()))
            .unwrap_or_default()
    }

    pub fn trail(&self) -> &[Point] {
        self.session
            .as_ref()
            .map(|s| s.trail.as_slice())
            .unwrap_or(&[])
    }

    /// Close the session on pointer-up.
    ///
    /// The tracker stays in `Finalized` until [`reset`](Self::reset) so the
    /// caller can finish dispatching first. Calling this while idle yields
    /// `NoGesture`.
    pub fn finish(&mut self) -> TrackOutcome {
        if !self.is_active() {
            return TrackOutcome::NoGesture;
        }
        self.state = TrackerState::Finalized;
        match self.session.as_ref() {
            Some(session) if session.armed && !session.directions.is_empty() => {
                TrackOutcome::Gesture(GestureString(session.directions.clone()))
            }
            _ => TrackOutcome::NoGesture,
        }
    }

    /// Tear down any session and return to `Idle`.
    pub fn reset(&mut self) {
        self.session = None;
        self.state = TrackerState::Idle;
    }

    /// Force `Idle` from any state. Returns `true` if an in-progress session was discarded.
    pub fn cancel(&mut self) -> bool {
        let discarded = self.is_active();
        self.reset();
        discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_resolve_horizontally() {
        for m in [1.0_f32, 18.0, 250.5] {
            assert_eq!(direction_from_delta(m, m), Direction::Right);
            assert_eq!(direction_from_delta(m, -m), Direction::Right);
            assert_eq!(direction_from_delta(-m, m), Direction::Left);
            assert_eq!(direction_from_delta(-m, -m), Direction::Left);
        }
    }

    #[test]
    fn vertical_dominant_moves() {
        assert_eq!(direction_from_delta(3.0, 20.0), Direction::Down);
        assert_eq!(direction_from_delta(-3.0, -20.0), Direction::Up);
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let gesture: GestureString = " drul ".parse().expect("parse");
        assert_eq!(gesture.to_string(), "DRUL");
        assert_eq!(gesture.arrows(), "↓→↑←");
    }

    #[test]
    fn parse_rejects_bad_keys() {
        assert_eq!("".parse::<GestureString>(), Err(GestureParseError::Empty));
        assert_eq!(
            "UX".parse::<GestureString>(),
            Err(GestureParseError::InvalidToken {
                index: 1,
                token: 'X'
            })
        );
        assert_eq!(
            "LRLRLRLRL".parse::<GestureString>(),
            Err(GestureParseError::TooLong { len: 9 })
        );
        assert_eq!(
            "UU".parse::<GestureString>(),
            Err(GestureParseError::RepeatedToken { index: 1 })
        );
    }

    #[test]
    fn state_walks_through_all_phases() {
        let mut tracker = GestureTracker::default();
        assert_eq!(tracker.state(), TrackerState::Idle);
        tracker.begin((0.0, 0.0));
        assert_eq!(tracker.state(), TrackerState::Arming);
        tracker.feed_point((10.0, 0.0));
        assert_eq!(tracker.state(), TrackerState::Arming);
        tracker.feed_point((20.0, 0.0));
        assert_eq!(tracker.state(), TrackerState::Tracking);
        assert_eq!(
            tracker.finish(),
            TrackOutcome::Gesture("R".parse().expect("parse"))
        );
        assert_eq!(tracker.state(), TrackerState::Finalized);
        tracker.reset();
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert!(tracker.trail().is_empty());
    }

    #[test]
    fn arm_threshold_is_strict() {
        let mut tracker = GestureTracker::default();
        tracker.begin((0.0, 0.0));
        tracker.feed_point((14.0, 0.0));
        assert!(!tracker.is_armed());
        tracker.feed_point((14.5, 0.0));
        assert!(tracker.is_armed());
    }

    #[test]
    fn sanitize_restores_defaults() {
        let mut config = TrackerConfig {
            move_threshold_px: f32::NAN,
            arm_threshold_px: -1.0,
            max_gesture_len: 0,
        };
        assert!(config.sanitize());
        assert_eq!(config, TrackerConfig::default());
    }
}
