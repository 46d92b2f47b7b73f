use colored::Colorize;
use std::fmt;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
}

fn label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Info => "INFO",
        MessageKind::Success => "OK",
        MessageKind::Warning => "WARNING",
        MessageKind::Error => "ERROR",
    }
}

pub fn format_message(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = format!("{}: {}", label(kind), message);
    match kind {
        MessageKind::Info => text,
        MessageKind::Success => text.bright_green().to_string(),
        MessageKind::Warning => text.bright_yellow().to_string(),
        MessageKind::Error => text.bright_red().to_string(),
    }
}

pub fn info(message: impl fmt::Display) {
    println!("{}", format_message(MessageKind::Info, message));
}

pub fn error(message: impl fmt::Display) {
    eprintln!("{}", format_message(MessageKind::Error, message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_prefix_messages() {
        colored::control::set_override(false);
        assert_eq!(format_message(MessageKind::Error, "boom"), "ERROR: boom");
        assert_eq!(format_message(MessageKind::Info, "hi"), "INFO: hi");
    }
}
