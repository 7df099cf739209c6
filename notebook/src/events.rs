use std::fmt;

use serde_json::Value;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Notebook,
    Search,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventCategory::Notebook => "Notebook",
            EventCategory::Search => "Search",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAction {
    Click,
    Submit,
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EventAction::Click => "Click",
            EventAction::Submit => "Submit",
        })
    }
}

/// Fire-and-forget telemetry sink. Implementations must not block or panic.
///
/// View events follow the `View$Page` naming scheme, other events `$Noun$Verb`.
pub trait EventLogger: Send + Sync {
    fn log_view_event(&self, name: &str);

    fn log_event(
        &self,
        category: EventCategory,
        action: EventAction,
        label: &str,
        props: Option<&Value>,
    );
}

/// Emits every event as a `tracing` record under the `notebook::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventLogger;

impl EventLogger for TracingEventLogger {
    fn log_view_event(&self, name: &str) {
        info!(target: "notebook::events", view = name, "view event");
    }

    fn log_event(
        &self,
        category: EventCategory,
        action: EventAction,
        label: &str,
        props: Option<&Value>,
    ) {
        match props {
            Some(props) => info!(
                target: "notebook::events",
                %category, %action, label, %props, "event"
            ),
            None => info!(target: "notebook::events", %category, %action, label, "event"),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventLogger;

impl EventLogger for NoopEventLogger {
    fn log_view_event(&self, _name: &str) {}

    fn log_event(&self, _: EventCategory, _: EventAction, _: &str, _: Option<&Value>) {}
}
