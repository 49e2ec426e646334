//! Themed message helpers.
//!
//! Colour is applied only when the caller says the writer supports it; the
//! plain text is identical either way.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Returns `text` coloured with the theme's style for `entry`.
pub fn styled(text: &str, entry: ThemeEntry, theme: &ThemeMap, supports_color: bool) -> String {
    if !supports_color {
        return text.to_string();
    }
    match theme.get(&entry).and_then(|style| style.fg.as_ref()) {
        Some(color) => text.color(color.to_ansi_color()).to_string(),
        None => text.to_string(),
    }
}

/// Writes one themed line.
pub fn print_message<W: Write + ?Sized>(
    writer: &mut W,
    msg: &str,
    entry: ThemeEntry,
    theme: &ThemeMap,
    supports_color: bool,
) -> io::Result<()> {
    writeln!(writer, "{}", styled(msg, entry, theme, supports_color))
}

pub fn print_info_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, msg, ThemeEntry::Info, theme, supports_color)
}

pub fn print_warn_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, &format!("Warning: {}", msg), ThemeEntry::Warn, theme, supports_color)
}

pub fn print_error_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, &format!("Error: {}", msg), ThemeEntry::Error, theme, supports_color)
}

pub fn print_success_message<W: Write + ?Sized>(writer: &mut W, msg: &str, theme: &ThemeMap, supports_color: bool) -> io::Result<()> {
    print_message(writer, msg, ThemeEntry::Success, theme, supports_color)
}
