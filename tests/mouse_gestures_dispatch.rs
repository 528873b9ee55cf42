use mouse_gesture::mouse_gestures::dispatch::{
    execute_privileged, ActionDispatcher, BrowserActions, BrowserDispatcher, PageActions,
    ScrollCommand, TabPosition, Viewport,
};
use mouse_gesture::mouse_gestures::{GestureAction, GestureString};

#[derive(Default)]
struct MockPage {
    scrolls: Vec<ScrollCommand>,
}

impl PageActions for MockPage {
    fn viewport(&self) -> anyhow::Result<Viewport> {
        Ok(Viewport {
            inner_height: 900.0,
            document_height: 3000.0,
            body_height: 2800.0,
        })
    }

    fn scroll(&mut self, command: ScrollCommand) -> anyhow::Result<()> {
        self.scrolls.push(command);
        Ok(())
    }
}

#[derive(Default)]
struct MockBrowser {
    calls: Vec<String>,
    position: TabPosition,
    confirm: Option<bool>,
    fail_reload: bool,
}

impl MockBrowser {
    fn record(&mut self, call: &str) -> anyhow::Result<()> {
        self.calls.push(call.to_string());
        Ok(())
    }
}

impl BrowserActions for MockBrowser {
    fn go_back(&mut self) -> anyhow::Result<()> {
        self.record("back")
    }

    fn go_forward(&mut self) -> anyhow::Result<()> {
        self.record("forward")
    }

    fn reload(&mut self) -> anyhow::Result<()> {
        if self.fail_reload {
            anyhow::bail!("tab is gone");
        }
        self.record("reload")
    }

    fn close_tab(&mut self) -> anyhow::Result<()> {
        self.record("close_tab")
    }

    fn reopen_closed_tab(&mut self) -> anyhow::Result<()> {
        self.record("reopen")
    }

    fn tab_position(&self) -> anyhow::Result<TabPosition> {
        Ok(self.position)
    }

    fn activate_tab(&mut self, index: usize) -> anyhow::Result<()> {
        self.record(&format!("activate {index}"))
    }

    fn confirm_close_window(&mut self) -> anyhow::Result<bool> {
        self.calls.push("confirm".into());
        self.confirm
            .ok_or_else(|| anyhow::anyhow!("no prompt available"))
    }

    fn close_window(&mut self) -> anyhow::Result<()> {
        self.record("close_window")
    }
}

fn gesture(s: &str) -> GestureString {
    s.parse().unwrap()
}

#[test]
fn scroll_actions_stay_on_the_page() {
    let mut dispatcher = BrowserDispatcher::new(MockPage::default(), MockBrowser::default(), true);
    dispatcher.dispatch(&gesture("D"), GestureAction::ScrollDown).unwrap();
    dispatcher.dispatch(&gesture("U"), GestureAction::ScrollUp).unwrap();
    dispatcher.dispatch(&gesture("DU"), GestureAction::ScrollTop).unwrap();
    dispatcher.dispatch(&gesture("UD"), GestureAction::ScrollBottom).unwrap();

    assert_eq!(
        dispatcher.page().scrolls,
        vec![
            ScrollCommand::By(630.0),
            ScrollCommand::By(-630.0),
            ScrollCommand::To(0.0),
            ScrollCommand::To(2100.0),
        ]
    );
    assert!(dispatcher.browser().calls.is_empty());
}

#[test]
fn history_and_tab_actions_go_to_browser() {
    let mut dispatcher = BrowserDispatcher::new(MockPage::default(), MockBrowser::default(), true);
    for (g, action) in [
        ("L", GestureAction::Back),
        ("R", GestureAction::Forward),
        ("RL", GestureAction::Reload),
        ("DR", GestureAction::CloseTab),
        ("DL", GestureAction::ReopenTab),
    ] {
        dispatcher.dispatch(&gesture(g), action).unwrap();
    }
    assert_eq!(
        dispatcher.browser().calls,
        vec!["back", "forward", "reload", "close_tab", "reopen"]
    );
    assert!(dispatcher.page().scrolls.is_empty());
}

#[test]
fn tab_switching_wraps_around() {
    let mut browser = MockBrowser {
        position: TabPosition {
            sender: Some(0),
            active: Some(2),
            count: 3,
        },
        ..MockBrowser::default()
    };
    assert!(execute_privileged(&mut browser, GestureAction::TabLeft, true).ok);
    browser.position.sender = Some(2);
    assert!(execute_privileged(&mut browser, GestureAction::TabRight, true).ok);
    assert_eq!(browser.calls, vec!["activate 2", "activate 0"]);
}

#[test]
fn tab_switch_without_tabs_is_a_no_op() {
    let mut browser = MockBrowser::default();
    let report = execute_privileged(&mut browser, GestureAction::TabRight, true);
    assert!(report.ok);
    assert!(browser.calls.is_empty());
}

#[test]
fn close_window_honours_confirmation() {
    let mut declined = MockBrowser {
        confirm: Some(false),
        ..MockBrowser::default()
    };
    assert!(execute_privileged(&mut declined, GestureAction::CloseWindow, true).ok);
    assert_eq!(declined.calls, vec!["confirm"]);

    let mut unavailable = MockBrowser::default();
    assert!(execute_privileged(&mut unavailable, GestureAction::CloseWindow, true).ok);
    assert_eq!(unavailable.calls, vec!["confirm"]);

    let mut accepted = MockBrowser {
        confirm: Some(true),
        ..MockBrowser::default()
    };
    assert!(execute_privileged(&mut accepted, GestureAction::CloseWindow, true).ok);
    assert_eq!(accepted.calls, vec!["confirm", "close_window"]);

    let mut unconfirmed = MockBrowser::default();
    assert!(execute_privileged(&mut unconfirmed, GestureAction::CloseWindow, false).ok);
    assert_eq!(unconfirmed.calls, vec!["close_window"]);
}

#[test]
fn failures_are_reported() {
    let mut browser = MockBrowser {
        fail_reload: true,
        ..MockBrowser::default()
    };
    let report = execute_privileged(&mut browser, GestureAction::Reload, true);
    assert!(!report.ok);
    assert_eq!(report.action, GestureAction::Reload);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ok"], false);
    assert_eq!(json["action"], "reload");
    assert_eq!(json["error"], "tab is gone");

    let ok = execute_privileged(&mut MockBrowser::default(), GestureAction::Back, true);
    let json = serde_json::to_value(&ok).unwrap();
    assert!(json.get("error").is_none());

    let mut dispatcher = BrowserDispatcher::new(MockPage::default(), browser, true);
    let err = dispatcher
        .dispatch(&gesture("RL"), GestureAction::Reload)
        .unwrap_err();
    assert!(err.to_string().contains("tab is gone"));
}

#[test]
fn none_and_page_actions_are_ignored_by_privileged_path() {
    let mut browser = MockBrowser::default();
    assert!(execute_privileged(&mut browser, GestureAction::None, true).ok);
    assert!(execute_privileged(&mut browser, GestureAction::ScrollDown, true).ok);
    assert!(browser.calls.is_empty());
}
