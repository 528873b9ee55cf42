use crate::mouse_gestures::db::{ActionScope, GestureAction};
use crate::mouse_gestures::engine::GestureString;
use serde::Serialize;

pub const MIN_SCROLL_STEP: f32 = 120.0;
pub const SCROLL_STEP_RATIO: f32 = 0.7;

/// Executes a resolved gesture action.
pub trait ActionDispatcher {
    fn dispatch(&mut self, gesture: &GestureString, action: GestureAction) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub inner_height: f32,
    pub document_height: f32,
    pub body_height: f32,
}

impl Viewport {
    pub fn scroll_height(&self) -> f32 {
        self.document_height.max(self.body_height).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollCommand {
    By(f32),
    To(f32),
}

pub fn scroll_step(inner_height: f32) -> f32 {
    MIN_SCROLL_STEP.max((inner_height * SCROLL_STEP_RATIO).floor())
}

/// Scroll command for a page-local action, `None` for anything else.
pub fn scroll_command(action: GestureAction, viewport: &Viewport) -> Option<ScrollCommand> {
    let step = scroll_step(viewport.inner_height);
    match action {
        GestureAction::ScrollDown => Some(ScrollCommand::By(step)),
        GestureAction::ScrollUp => Some(ScrollCommand::By(-step)),
        GestureAction::ScrollTop => Some(ScrollCommand::To(0.0)),
        GestureAction::ScrollBottom => Some(ScrollCommand::To(
            (viewport.scroll_height() - viewport.inner_height).max(0.0),
        )),
        _ => None,
    }
}

/// Page side of dispatch: smooth scrolling inside the document.
pub trait PageActions {
    fn viewport(&self) -> anyhow::Result<Viewport>;
    fn scroll(&mut self, command: ScrollCommand) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabPosition {
    /// Index of the tab the gesture came from, if it is still in the strip.
    pub sender: Option<usize>,
    pub active: Option<usize>,
    pub count: usize,
}

/// Neighbouring tab with wraparound. `step` is -1 for left, +1 for right.
pub fn neighbor_tab_index(position: TabPosition, step: isize) -> Option<usize> {
    if position.count == 0 {
        return None;
    }
    let len = position.count as isize;
    let current = position.sender.or(position.active).unwrap_or(0) as isize;
    Some((current + step).rem_euclid(len) as usize)
}

/// Privileged side of dispatch: tab, history and window operations.
pub trait BrowserActions {
    fn go_back(&mut self) -> anyhow::Result<()>;
    fn go_forward(&mut self) -> anyhow::Result<()>;
    fn reload(&mut self) -> anyhow::Result<()>;
    fn close_tab(&mut self) -> anyhow::Result<()>;
    fn reopen_closed_tab(&mut self) -> anyhow::Result<()>;
    fn tab_position(&self) -> anyhow::Result<TabPosition>;
    fn activate_tab(&mut self, index: usize) -> anyhow::Result<()>;
    /// Ask the user to confirm closing the window. `Ok(false)` means declined.
    fn confirm_close_window(&mut self) -> anyhow::Result<bool>;
    fn close_window(&mut self) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub ok: bool,
    pub action: GestureAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run a privileged action against the browser.
///
/// Page-local actions and `none` are accepted and ignored. Failures are
/// captured in the report rather than returned.
pub fn execute_privileged(
    browser: &mut dyn BrowserActions,
    action: GestureAction,
    confirm_close_window: bool,
) -> DispatchReport {
    let result = run_privileged(browser, action, confirm_close_window);
    match result {
        Ok(()) => DispatchReport {
            ok: true,
            action,
            error: None,
        },
        Err(err) => DispatchReport {
            ok: false,
            action,
            error: Some(err.to_string()),
        },
    }
}

fn run_privileged(
    browser: &mut dyn BrowserActions,
    action: GestureAction,
    confirm_close_window: bool,
) -> anyhow::Result<()> {
    match action {
        GestureAction::Back => browser.go_back(),
        GestureAction::Forward => browser.go_forward(),
        GestureAction::Reload => browser.reload(),
        GestureAction::CloseTab => browser.close_tab(),
        GestureAction::ReopenTab => browser.reopen_closed_tab(),
        GestureAction::TabLeft | GestureAction::TabRight => {
            let step = if action == GestureAction::TabLeft { -1 } else { 1 };
            let position = browser.tab_position()?;
            match neighbor_tab_index(position, step) {
                Some(index) => browser.activate_tab(index),
                None => Ok(()),
            }
        }
        GestureAction::CloseWindow => {
            if confirm_close_window {
                // Without an answer we keep the window open.
                match browser.confirm_close_window() {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!("close window declined");
                        return Ok(());
                    }
                    Err(err) => {
                        tracing::debug!(?err, "close window confirmation unavailable");
                        return Ok(());
                    }
                }
            }
            browser.close_window()
        }
        GestureAction::ScrollDown
        | GestureAction::ScrollUp
        | GestureAction::ScrollTop
        | GestureAction::ScrollBottom
        | GestureAction::None => Ok(()),
    }
}

/// Routes scroll actions to the page and everything else to the browser.
pub struct BrowserDispatcher<P, B> {
    page: P,
    browser: B,
    confirm_close_window: bool,
}

impl<P: PageActions, B: BrowserActions> BrowserDispatcher<P, B> {
    pub fn new(page: P, browser: B, confirm_close_window: bool) -> Self {
        Self {
            page,
            browser,
            confirm_close_window,
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn set_confirm_close_window(&mut self, confirm: bool) {
        self.confirm_close_window = confirm;
    }
}

impl<P: PageActions, B: BrowserActions> ActionDispatcher for BrowserDispatcher<P, B> {
    fn dispatch(&mut self, gesture: &GestureString, action: GestureAction) -> anyhow::Result<()> {
        match action.scope() {
            ActionScope::PageLocal => {
                let viewport = self.page.viewport()?;
                if let Some(command) = scroll_command(action, &viewport) {
                    self.page.scroll(command)?;
                }
                Ok(())
            }
            ActionScope::Privileged => {
                let report = execute_privileged(&mut self.browser, action, self.confirm_close_window);
                match report.error {
                    None => Ok(()),
                    Some(error) => Err(anyhow::anyhow!(
                        "gesture {gesture} action {action} failed: {error}"
                    )),
                }
            }
        }
    }
}
