//! Terminal host
//!
//! Stands in for the page: each stdin line becomes one or more widget events.

use crate::widget::drag::PointerPosition;
use crate::widget::{ExternalCommand, WidgetEvent};

#[derive(Debug)]
pub enum HostCommand {
    Events(Vec<WidgetEvent>),
    PrintHtml,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Type a question and press Enter to send it.
  :minimize                 click the minimize button
  :toggle | :expand | :collapse
  {\"action\": \"toggle\"}      external command as JSON
  :drag X1 Y1 X2 Y2         drag the header from one point to another
  :html                     print the widget markup
  :quit";

pub fn parse_line(line: &str) -> HostCommand {
    let trimmed = line.trim();

    if trimmed.starts_with('{') {
        return match ExternalCommand::parse(trimmed) {
            Ok(command) => HostCommand::Events(vec![WidgetEvent::External(command)]),
            Err(e) => HostCommand::Invalid(format!("bad external command: {e}")),
        };
    }

    let Some(command) = trimmed.strip_prefix(':') else {
        return HostCommand::Events(vec![
            WidgetEvent::InputChanged(line.to_string()),
            WidgetEvent::EnterPressed { shift: false },
        ]);
    };

    let mut parts = command.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "q" => HostCommand::Quit,
        "html" => HostCommand::PrintHtml,
        "minimize" => HostCommand::Events(vec![WidgetEvent::MinimizeClicked]),
        "toggle" => external(ExternalCommand::Toggle),
        "expand" => external(ExternalCommand::Expand),
        "collapse" => external(ExternalCommand::Collapse),
        "drag" => {
            let coords: Result<Vec<f64>, _> = parts.map(str::parse::<f64>).collect();
            match coords.as_deref() {
                Ok([x1, y1, x2, y2]) => HostCommand::Events(vec![
                    WidgetEvent::HeaderPointerDown(PointerPosition::new(*x1, *y1)),
                    WidgetEvent::DocumentPointerMove(PointerPosition::new(*x2, *y2)),
                    WidgetEvent::DocumentPointerUp,
                ]),
                _ => HostCommand::Invalid("usage: :drag X1 Y1 X2 Y2".into()),
            }
        }
        other => HostCommand::Invalid(format!("unknown command `:{other}`")),
    }
}

fn external(command: ExternalCommand) -> HostCommand {
    HostCommand::Events(vec![WidgetEvent::External(command)])
}
