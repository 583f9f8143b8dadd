use serde::Serialize;

use crate::kernel::format::format_duration;
use crate::kernel::state::{SessionRecord, TimerSnapshot, TimerStatus};

pub const PAUSE_BUTTON: &str = "pause_timer";
pub const RESUME_BUTTON: &str = "resume_timer";
pub const REFRESH_BUTTON: &str = "refresh";

/// Inbox-app panel response: `{"canvas": {"content": {"components": [...]}}}`.
#[derive(Debug, Clone, Serialize)]
pub struct Canvas {
    pub canvas: CanvasBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasBody {
    pub content: CanvasContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasContent {
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Text {
        id: String,
        text: String,
        style: TextStyle,
    },
    Button {
        id: String,
        label: String,
        action: ButtonAction,
    },
    Divider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Header,
    Paragraph,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ButtonAction {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

fn text(id: &str, text: String, style: TextStyle) -> Component {
    Component::Text { id: id.to_string(), text, style }
}

fn button(id: &str, label: &str) -> Component {
    Component::Button {
        id: id.to_string(),
        label: label.to_string(),
        action: ButtonAction { kind: "submit" },
    }
}

/// Builds the panel for one operator/conversation. `timer` is `None` when nothing is live.
pub fn render(timer: Option<&TimerSnapshot>, recent: &[SessionRecord]) -> Canvas {
    let mut components = vec![text("title", "Viewing time".to_string(), TextStyle::Header)];

    match timer {
        Some(t) => {
            let label = match t.status {
                TimerStatus::Running => "Running",
                TimerStatus::Paused => "Paused",
                TimerStatus::Stopped => "Stopped",
            };
            components.push(text("status", format!("Status: {}", label), TextStyle::Paragraph));
            components.push(text("elapsed", format_duration(t.elapsed), TextStyle::Header));
            match t.status {
                TimerStatus::Running => components.push(button(PAUSE_BUTTON, "Pause")),
                TimerStatus::Paused => components.push(button(RESUME_BUTTON, "Resume")),
                TimerStatus::Stopped => {}
            }
        }
        None => components.push(text("status", "No active timer".to_string(), TextStyle::Muted)),
    }
    components.push(button(REFRESH_BUTTON, "Refresh"));

    if !recent.is_empty() {
        components.push(Component::Divider);
        components.push(text("history_title", "Recent sessions".to_string(), TextStyle::Paragraph));
        // Newest first.
        for (i, record) in recent.iter().rev().enumerate() {
            components.push(text(
                &format!("session_{}", i),
                format_duration(record.final_duration),
                TextStyle::Muted,
            ));
        }
    }

    Canvas {
        canvas: CanvasBody {
            content: CanvasContent { components },
        },
    }
}
