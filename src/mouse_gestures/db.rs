use crate::mouse_gestures::engine::GestureString;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Where an action runs: inside the page, or in the privileged browser context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    PageLocal,
    Privileged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureAction {
    None,
    ScrollDown,
    ScrollUp,
    ScrollTop,
    ScrollBottom,
    Back,
    Forward,
    Reload,
    CloseTab,
    ReopenTab,
    TabLeft,
    TabRight,
    CloseWindow,
}

impl GestureAction {
    pub const ALL: [GestureAction; 13] = [
        GestureAction::None,
        GestureAction::ScrollDown,
        GestureAction::ScrollUp,
        GestureAction::ScrollTop,
        GestureAction::ScrollBottom,
        GestureAction::Back,
        GestureAction::Forward,
        GestureAction::Reload,
        GestureAction::CloseTab,
        GestureAction::ReopenTab,
        GestureAction::TabLeft,
        GestureAction::TabRight,
        GestureAction::CloseWindow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GestureAction::None => "none",
            GestureAction::ScrollDown => "scrollDown",
            GestureAction::ScrollUp => "scrollUp",
            GestureAction::ScrollTop => "scrollTop",
            GestureAction::ScrollBottom => "scrollBottom",
            GestureAction::Back => "back",
            GestureAction::Forward => "forward",
            GestureAction::Reload => "reload",
            GestureAction::CloseTab => "closeTab",
            GestureAction::ReopenTab => "reopenTab",
            GestureAction::TabLeft => "tabLeft",
            GestureAction::TabRight => "tabRight",
            GestureAction::CloseWindow => "closeWindow",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GestureAction::None => "No action",
            GestureAction::ScrollDown => "Scroll down",
            GestureAction::ScrollUp => "Scroll up",
            GestureAction::ScrollTop => "Scroll to top",
            GestureAction::ScrollBottom => "Scroll to bottom",
            GestureAction::Back => "Back",
            GestureAction::Forward => "Forward",
            GestureAction::Reload => "Reload tab",
            GestureAction::CloseTab => "Close current tab",
            GestureAction::ReopenTab => "Reopen closed tab",
            GestureAction::TabLeft => "Switch to left tab",
            GestureAction::TabRight => "Switch to right tab",
            GestureAction::CloseWindow => "Close current window",
        }
    }

    pub fn scope(self) -> ActionScope {
        match self {
            GestureAction::ScrollDown
            | GestureAction::ScrollUp
            | GestureAction::ScrollTop
            | GestureAction::ScrollBottom => ActionScope::PageLocal,
            _ => ActionScope::Privileged,
        }
    }

    /// Actions that switch away from or close the page. Their feedback has to be
    /// removed immediately; a delayed hide may never run in a background tab.
    pub fn hides_immediately(self) -> bool {
        matches!(
            self,
            GestureAction::TabLeft
                | GestureAction::TabRight
                | GestureAction::CloseTab
                | GestureAction::ReopenTab
                | GestureAction::CloseWindow
        )
    }

    pub fn is_none(self) -> bool {
        self == GestureAction::None
    }
}

impl fmt::Display for GestureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown gesture action {:?}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for GestureAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        GestureAction::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == trimmed)
            .ok_or_else(|| UnknownAction(trimmed.to_string()))
    }
}

pub const DEFAULT_BINDINGS: [(&str, GestureAction); 12] = [
    ("D", GestureAction::ScrollDown),
    ("U", GestureAction::ScrollUp),
    ("DU", GestureAction::ScrollTop),
    ("UD", GestureAction::ScrollBottom),
    ("DR", GestureAction::CloseTab),
    ("DL", GestureAction::ReopenTab),
    ("UL", GestureAction::TabLeft),
    ("UR", GestureAction::TabRight),
    ("R", GestureAction::Forward),
    ("L", GestureAction::Back),
    ("RL", GestureAction::Reload),
    ("DRUL", GestureAction::CloseWindow),
];

/// Gesture string to action lookup table.
///
/// Stored as a plain `{"UR": "tabRight"}` JSON object. Entries with keys
/// outside `[LRUD]{1,8}` or unknown action names are dropped on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct GestureMap {
    bindings: HashMap<GestureString, GestureAction>,
}

impl Default for GestureMap {
    fn default() -> Self {
        let bindings = DEFAULT_BINDINGS
            .iter()
            .filter_map(|(key, action)| key.parse().ok().map(|g| (g, *action)))
            .collect();
        Self { bindings }
    }
}

impl GestureMap {
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Build a map from raw storage entries, dropping anything malformed.
    ///
    /// An empty action string maps to `none`, matching what the settings
    /// importer writes for blank rows.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut map = Self::empty();
        for (key, value) in entries {
            let key = key.as_ref();
            let gesture: GestureString = match key.parse() {
                Ok(gesture) => gesture,
                Err(err) => {
                    tracing::warn!(key, %err, "dropping gesture map entry");
                    continue;
                }
            };
            let value = value.as_ref().trim();
            let action = if value.is_empty() {
                GestureAction::None
            } else {
                match value.parse() {
                    Ok(action) => action,
                    Err(err) => {
                        tracing::warn!(key, %err, "dropping gesture map entry");
                        continue;
                    }
                }
            };
            map.bindings.insert(gesture, action);
        }
        map
    }

    pub fn insert(&mut self, gesture: GestureString, action: GestureAction) -> Option<GestureAction> {
        self.bindings.insert(gesture, action)
    }

    pub fn remove(&mut self, gesture: &GestureString) -> Option<GestureAction> {
        self.bindings.remove(gesture)
    }

    pub fn get(&self, gesture: &GestureString) -> Option<GestureAction> {
        self.bindings.get(gesture).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Entries ordered by gesture, for display and stable serialization.
    pub fn entries(&self) -> Vec<(GestureString, GestureAction)> {
        let mut entries: Vec<_> = self
            .bindings
            .iter()
            .map(|(gesture, action)| (gesture.clone(), *action))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn resolve(&self, gesture: &GestureString) -> GestureAction {
        resolve(gesture, self)
    }
}

impl From<BTreeMap<String, String>> for GestureMap {
    fn from(raw: BTreeMap<String, String>) -> Self {
        Self::from_entries(raw)
    }
}

impl From<GestureMap> for BTreeMap<String, String> {
    fn from(map: GestureMap) -> Self {
        map.bindings
            .into_iter()
            .map(|(gesture, action)| (gesture.to_string(), action.as_str().to_string()))
            .collect()
    }
}

/// Look up a finalized gesture. A miss is not an error: it resolves to `none`.
pub fn resolve(gesture: &GestureString, map: &GestureMap) -> GestureAction {
    map.get(gesture).unwrap_or(GestureAction::None)
}
