//! Plain-text rendering of the controller state.

use std::fmt::Write;

use crate::controller::{Mode, Severity, View};

pub fn render(title: &str, view: &View<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", title);

    if let Some(notice) = view.notice {
        let tag = match notice.severity {
            Severity::Error => "error",
            Severity::Fatal => "unavailable",
        };
        let _ = writeln!(out, "!! {}: {}", tag, notice.message);
    }

    if view.disabled {
        let _ = writeln!(out, "(changes are disabled)");
    } else {
        let _ = writeln!(out, "add form: name=\"{}\" age=\"{}\"", view.add_name, view.add_age);
    }

    if view.friends.is_empty() {
        let _ = writeln!(out, "  (no friends yet)");
    }
    for friend in view.friends {
        match view.mode {
            Mode::Editing { id, name, age } if *id == friend.id => {
                let _ = writeln!(
                    out,
                    "  [{}] editing: name=\"{}\" age=\"{}\"  (update | cancel)",
                    friend.id, name, age
                );
            }
            _ => {
                let _ = writeln!(out, "  [{}] {} ({})", friend.id, friend.name, friend.age);
            }
        }
    }
    out
}
