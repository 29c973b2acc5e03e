use colored::Colorize;
use std::fmt;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Section => format!("=== {} ===", text.trim())
            .as_str()
            .cyan()
            .bold()
            .to_string(),
        MessageKind::Info => text,
        MessageKind::Success => format!("[✓] {text}").as_str().green().to_string(),
        MessageKind::Warning => format!("[!] {text}").as_str().yellow().to_string(),
        MessageKind::Error => format!("[x] {text}").as_str().red().to_string(),
    }
}

pub fn info(message: impl fmt::Display) {
    println!("{}", apply_style(MessageKind::Info, message));
}

pub fn success(message: impl fmt::Display) {
    println!("{}", apply_style(MessageKind::Success, message));
}

pub fn warning(message: impl fmt::Display) {
    println!("{}", apply_style(MessageKind::Warning, message));
}

pub fn error(message: impl fmt::Display) {
    eprintln!("{}", apply_style(MessageKind::Error, message));
}

pub fn section(message: impl fmt::Display) {
    println!("{}", apply_style(MessageKind::Section, message));
}
