//! Terminal rendering of view events.

use colored::Colorize;

use voxmate_core::events::{EventSink, Severity, ViewEvent};
use voxmate_core::status::IndicatorState;

use crate::helpers;

/// Prints notifications and the loading placeholder to stderr.
#[derive(Clone, Copy, Debug)]
pub struct ConsoleSink {
    /// Show the "thinking" placeholder. Off when logs are on, since log
    /// lines would interleave with it.
    spinner: bool,
    /// Echo indicator transitions.
    show_status: bool,
}

impl ConsoleSink {
    pub fn new(spinner: bool, show_status: bool) -> Self {
        ConsoleSink {
            spinner,
            show_status,
        }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: ViewEvent) {
        match &event {
            ViewEvent::LoadingShown if self.spinner => helpers::print_thinking(),
            ViewEvent::LoadingHidden if self.spinner => helpers::clear_thinking(),
            ViewEvent::StatusChanged { .. } if !self.show_status => {}
            _ => {
                if let Some(line) = format_event(&event) {
                    eprintln!("{line}");
                }
            }
        }
    }
}

/// One terminal line for an event, or `None` for events with no text form.
pub fn format_event(event: &ViewEvent) -> Option<String> {
    match event {
        ViewEvent::Notification { message, severity } => Some(match severity {
            Severity::Info => format!("ℹ {message}").blue().to_string(),
            Severity::Success => format!("✓ {message}").green().to_string(),
            Severity::Warning => format!("⚠ {message}").yellow().to_string(),
            Severity::Error => format!("✗ {message}").red().to_string(),
        }),
        ViewEvent::StatusChanged { service, state } => {
            let label = format!("[{service}] {state}");
            Some(match state {
                IndicatorState::Error => label.red().to_string(),
                IndicatorState::Active => label.green().to_string(),
                _ => label.dimmed().to_string(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmate_core::status::Service;

    #[test]
    fn test_notification_text() {
        colored::control::set_override(false);
        let line = format_event(&ViewEvent::notify("Request failed", Severity::Error)).unwrap();
        assert_eq!(line, "✗ Request failed");
    }

    #[test]
    fn test_status_text() {
        colored::control::set_override(false);
        let line = format_event(&ViewEvent::StatusChanged {
            service: Service::Tts,
            state: IndicatorState::Processing,
        })
        .unwrap();
        assert_eq!(line, "[tts] processing");
    }

    #[test]
    fn test_refresh_events_are_silent() {
        assert!(format_event(&ViewEvent::HistoryChanged).is_none());
        assert!(format_event(&ViewEvent::TranscriptChanged).is_none());
        assert!(format_event(&ViewEvent::LoadingShown).is_none());
    }
}
