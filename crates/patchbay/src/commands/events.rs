//! Live event stream.

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;

use patchbay_core::{BackendEvent, Session};

use crate::cli::{EventsArgs, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    session: &Session,
    args: EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    // Subscribe before connecting so nothing emitted during startup is lost.
    let mut rx = session.events();
    session.connect().await?;

    let color = output::should_color();
    let mut seen = 0usize;

    loop {
        if args.count.is_some_and(|limit| seen >= limit) {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            msg = rx.recv() => match msg {
                Ok(event) if wanted(args.names.as_deref(), &event) => {
                    seen += 1;
                    let line = format_event(global.output, &event, color)?;
                    output::print_output(&line, global.quiet);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn wanted(names: Option<&[String]>, event: &BackendEvent) -> bool {
    names.is_none_or(|names| names.iter().any(|n| n == &event.name))
}

fn format_event(
    format: OutputFormat,
    event: &BackendEvent,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(event, true),
        OutputFormat::Plain => Ok(event.name.clone()),
        OutputFormat::Table | OutputFormat::Yaml => {
            let time = chrono::Local::now().format("%H:%M:%S");
            let name = if color {
                event.name.cyan().to_string()
            } else {
                event.name.clone()
            };
            Ok(format!("{time}  {name}  {}", event.payload))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(name: &str) -> BackendEvent {
        BackendEvent {
            name: name.into(),
            payload: json!({ "id": "o-1" }),
        }
    }

    #[test]
    fn filter_matches_names() {
        let names = vec!["output_remove".to_owned()];
        assert!(wanted(None, &event("mixer_update")));
        assert!(wanted(Some(&names), &event("output_remove")));
        assert!(!wanted(Some(&names), &event("output_create")));
    }

    #[test]
    fn json_events_are_single_line() {
        let line = format_event(OutputFormat::Json, &event("output_remove"), false).unwrap();
        assert_eq!(line, r#"{"name":"output_remove","payload":{"id":"o-1"}}"#);
    }

    #[test]
    fn table_events_show_name_and_payload() {
        let line = format_event(OutputFormat::Table, &event("output_create"), false).unwrap();
        assert!(line.ends_with(r#"output_create  {"id":"o-1"}"#));
    }
}
