use mouse_gesture::logging;
use mouse_gesture::mouse_gestures::overlay::TracingFeedbackSink;
use mouse_gesture::mouse_gestures::{
    ActionDispatcher, EventOutcome, FileConfigSource, GestureAction, GestureService,
    GestureString, PageEvent,
};
use mouse_gesture::settings::{GestureSettings, SETTINGS_FILE};
use serde::Deserialize;
use std::path::PathBuf;

/// Recorded pointer input for one page.
#[derive(Debug, Deserialize)]
struct Trace {
    url: String,
    events: Vec<PageEvent>,
}

/// Prints every dispatched action instead of driving a browser.
#[derive(Debug, Default)]
struct PrintDispatcher;

impl ActionDispatcher for PrintDispatcher {
    fn dispatch(&mut self, gesture: &GestureString, action: GestureAction) -> anyhow::Result<()> {
        println!("{gesture}\t{action}\t{}", action.label());
        Ok(())
    }
}

fn default_settings_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("mouse_gesture").join(SETTINGS_FILE))
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE))
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let trace_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: mouse_gesture <trace.json> [settings.json]"))?;
    let settings_path = args.next().map(PathBuf::from).unwrap_or_else(default_settings_path);

    let settings = GestureSettings::load_or_default(&settings_path);
    logging::init(settings.debug_logging);

    let trace: Trace = serde_json::from_str(&std::fs::read_to_string(&trace_path)?)?;
    let Some(mut service) = GestureService::attach(
        &trace.url,
        FileConfigSource::new(settings_path),
        PrintDispatcher,
        TracingFeedbackSink,
    ) else {
        println!("excluded\t{}", trace.url);
        return Ok(());
    };

    for event in trace.events {
        match service.handle_event(event) {
            EventOutcome::Tap => tracing::info!("tap; context menu passes through"),
            EventOutcome::Completed { gesture, action } if action.is_none() => {
                tracing::info!(gesture = %gesture, "invalid gesture")
            }
            outcome => tracing::debug!(?outcome, "event handled"),
        }
    }
    Ok(())
}
