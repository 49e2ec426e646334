// vtprobe-core/src/classifier.rs
//! Hazard classification of generated sequences.
//!
//! Classification is a fixed table of rules, each evaluated independently,
//! so a sequence may receive zero, one or several labels. Shape rules look at
//! the bytes; origin rules look at the generator metadata. Adding a hazard
//! class means adding a [`HazardLabel`] variant and a row in [`RULES`], plus
//! a generator case if nothing produces the triggering shape yet.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::catalog::INVISIBLE_TEXT_SGR;
use crate::sequence::{Origin, Sequence};

/// Cursor-movement parameters at or above this value risk overflowing a
/// naive parser's row/column arithmetic.
pub const OVERFLOW_THRESHOLD: u64 = 1_000_000_000;

/// Repeat counts at or above this value are treated as a DoS probe.
pub const REPEAT_DOS_THRESHOLD: u64 = 1_000_000;

/// A terminal-security hazard class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HazardLabel {
    TerminalBell,
    InjectionVector,
    AlternateScreen,
    InvisibleText,
    Clipboard,
    Hyperlink,
    Notification,
    ProprietaryCommand,
    FileTransfer,
    /// Carries the payload's catalog index.
    KnownAttackVector(usize),
    MultiVector,
    IntegerOverflow,
    ParserConfusion,
    CharacterMultiplication,
}

impl fmt::Display for HazardLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HazardLabel::TerminalBell => f.write_str("DoS via terminal bell"),
            HazardLabel::InjectionVector => f.write_str("injection vector"),
            HazardLabel::AlternateScreen => f.write_str("alternate-screen-buffer manipulation"),
            HazardLabel::InvisibleText => f.write_str("invisible-text attack"),
            HazardLabel::Clipboard => f.write_str("clipboard manipulation"),
            HazardLabel::Hyperlink => f.write_str("hyperlink manipulation"),
            HazardLabel::Notification => f.write_str("notification manipulation"),
            HazardLabel::ProprietaryCommand => f.write_str("proprietary terminal command exposure"),
            HazardLabel::FileTransfer => f.write_str("file-transfer protocol exploitation"),
            HazardLabel::KnownAttackVector(index) => write!(f, "known attack vector #{}", index),
            HazardLabel::MultiVector => f.write_str("multi-vector attack combination"),
            HazardLabel::IntegerOverflow => f.write_str("integer-overflow risk"),
            HazardLabel::ParserConfusion => f.write_str("parser-confusion risk"),
            HazardLabel::CharacterMultiplication => f.write_str("DoS via character multiplication"),
        }
    }
}

impl Serialize for HazardLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What a rule inspects.
#[derive(Clone, Copy)]
pub enum Matcher {
    /// The raw bytes of one escape sequence.
    Shape(fn(&str) -> Option<HazardLabel>),
    /// The generator metadata.
    Origin(fn(&Origin) -> Option<HazardLabel>),
}

/// One row of the hazard table.
#[derive(Clone, Copy)]
pub struct HazardRule {
    pub name: &'static str,
    pub matcher: Matcher,
}

impl fmt::Debug for HazardRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HazardRule").field("name", &self.name).finish()
    }
}

/// The hazard table, in evaluation (and label output) order.
pub const RULES: &[HazardRule] = &[
    HazardRule { name: "bell", matcher: Matcher::Shape(bell_byte) },
    HazardRule { name: "escape", matcher: Matcher::Shape(escape_byte) },
    HazardRule { name: "alternate-screen", matcher: Matcher::Shape(alternate_screen) },
    HazardRule { name: "invisible-text", matcher: Matcher::Shape(invisible_text) },
    HazardRule { name: "osc-command", matcher: Matcher::Shape(osc_command) },
    HazardRule { name: "hyperlink-spoof", matcher: Matcher::Shape(hyperlink_spoof) },
    HazardRule { name: "known-payload", matcher: Matcher::Origin(known_payload) },
    HazardRule { name: "combined-attack", matcher: Matcher::Origin(combined_attack) },
    HazardRule { name: "cursor-overflow", matcher: Matcher::Shape(cursor_overflow) },
    HazardRule { name: "malformed", matcher: Matcher::Origin(malformed) },
    HazardRule { name: "repeat-flood", matcher: Matcher::Shape(repeat_flood) },
];

lazy_static! {
    static ref PRIVATE_MODE: Regex = Regex::new(r"^\x1b\[\?(\d+)([hl])$").unwrap();
    static ref OSC_SEQUENCE: Regex = Regex::new(r"^\x1b\](\d+)(?:;[^\x07\x1b]*)?(?:\x07|\x1b\\)$").unwrap();
    static ref OSC8_LINK: Regex =
        Regex::new(r"^\x1b\]8;[^;\x07\x1b]*;([^\x07\x1b]+)\x07(.+?)\x1b\]8;;\x07$").unwrap();
    static ref CURSOR_MOVE: Regex = Regex::new(r"^\x1b\[(\d+)[A-G]$").unwrap();
    static ref REPEAT_CHAR: Regex = Regex::new(r"^(?s:.)?\x1b\[(\d+)b$").unwrap();
    /// One escape sequence (CSI, OSC, or a two-byte escape), or a run of text.
    static ref COMPONENT: Regex = Regex::new(
        r"\x1b\[[0-9;?]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-_]|[^\x1b]+"
    ).unwrap();
}

/// Digit runs the regexes captured; anything too large for `u64` saturates.
fn parse_param(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

fn bell_byte(bytes: &str) -> Option<HazardLabel> {
    (bytes == "\x07").then_some(HazardLabel::TerminalBell)
}

fn escape_byte(bytes: &str) -> Option<HazardLabel> {
    (bytes == "\x1b").then_some(HazardLabel::InjectionVector)
}

fn alternate_screen(bytes: &str) -> Option<HazardLabel> {
    let caps = PRIVATE_MODE.captures(bytes)?;
    matches!(&caps[1], "1047" | "1049").then_some(HazardLabel::AlternateScreen)
}

fn invisible_text(bytes: &str) -> Option<HazardLabel> {
    let body = bytes.strip_prefix("\x1b[")?.strip_suffix('m')?;
    (body == INVISIBLE_TEXT_SGR).then_some(HazardLabel::InvisibleText)
}

fn osc_command(bytes: &str) -> Option<HazardLabel> {
    let caps = OSC_SEQUENCE.captures(bytes)?;
    match parse_param(&caps[1]) {
        52 => Some(HazardLabel::Clipboard),
        8 => Some(HazardLabel::Hyperlink),
        777 => Some(HazardLabel::Notification),
        1337 => Some(HazardLabel::ProprietaryCommand),
        5113 => Some(HazardLabel::FileTransfer),
        _ => None,
    }
}

/// An OSC 8 link whose visible text is itself a URL, but not the target.
fn hyperlink_spoof(bytes: &str) -> Option<HazardLabel> {
    let caps = OSC8_LINK.captures(bytes)?;
    let target = caps[1].trim();
    let visible = strip_ansi_escapes::strip_str(bytes);
    let visible = visible.trim();
    let looks_like_url = visible.contains("://") || visible.starts_with("www.");
    (looks_like_url && visible != target).then_some(HazardLabel::Hyperlink)
}

fn known_payload(origin: &Origin) -> Option<HazardLabel> {
    match origin {
        Origin::KnownPayload { index } => Some(HazardLabel::KnownAttackVector(*index)),
        _ => None,
    }
}

fn combined_attack(origin: &Origin) -> Option<HazardLabel> {
    matches!(origin, Origin::CombinedAttack).then_some(HazardLabel::MultiVector)
}

fn cursor_overflow(bytes: &str) -> Option<HazardLabel> {
    let caps = CURSOR_MOVE.captures(bytes)?;
    (parse_param(&caps[1]) >= OVERFLOW_THRESHOLD).then_some(HazardLabel::IntegerOverflow)
}

fn malformed(origin: &Origin) -> Option<HazardLabel> {
    matches!(origin, Origin::Malformed { .. }).then_some(HazardLabel::ParserConfusion)
}

fn repeat_flood(bytes: &str) -> Option<HazardLabel> {
    let caps = REPEAT_CHAR.captures(bytes)?;
    (parse_param(&caps[1]) >= REPEAT_DOS_THRESHOLD).then_some(HazardLabel::CharacterMultiplication)
}

/// Splits a compound payload into its escape sequences and text runs.
pub fn split_components(bytes: &str) -> Vec<&str> {
    COMPONENT.find_iter(bytes).map(|m| m.as_str()).collect()
}

fn push_unique(labels: &mut Vec<HazardLabel>, label: HazardLabel) {
    if !labels.contains(&label) {
        labels.push(label);
    }
}

/// Applies every rule to a sequence and returns the labels it earns.
///
/// Shape rules see the whole sequence, except for the combined attack: there
/// they see each component, so the combination also carries the labels of
/// the parts it is built from. Labels are unique and in table order.
pub fn classify(sequence: &Sequence) -> Vec<HazardLabel> {
    let shapes: Vec<&str> = match sequence.origin {
        Origin::CombinedAttack => split_components(&sequence.bytes),
        _ => vec![sequence.bytes.as_str()],
    };

    let mut labels = Vec::new();
    for rule in RULES {
        match rule.matcher {
            Matcher::Shape(check) => {
                for &shape in &shapes {
                    if let Some(label) = check(shape) {
                        push_unique(&mut labels, label);
                    }
                }
            }
            Matcher::Origin(check) => {
                if let Some(label) = check(&sequence.origin) {
                    push_unique(&mut labels, label);
                }
            }
        }
    }

    if !labels.is_empty() {
        trace!("Classified '{}' as {:?}", sequence.escaped(), labels);
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::generator;
    use crate::sequence::Category;

    fn seq(bytes: &str, origin: Origin) -> Sequence {
        Sequence::new(bytes, "test", Category::EdgeCases, origin)
    }

    #[test]
    fn control_bytes() {
        assert_eq!(classify(&seq("\x07", Origin::ControlChar { code: 7 })), vec![HazardLabel::TerminalBell]);
        assert_eq!(classify(&seq("\x1b", Origin::ControlChar { code: 0x1b })), vec![HazardLabel::InjectionVector]);
        assert!(classify(&seq("\x0a", Origin::ControlChar { code: 0x0a })).is_empty());
    }

    #[test]
    fn alternate_screen_only_for_1047_and_1049() {
        let origin = Origin::PrivateMode { command: 'h', mode: 1049 };
        assert_eq!(classify(&seq("\x1b[?1049h", origin.clone())), vec![HazardLabel::AlternateScreen]);
        assert_eq!(classify(&seq("\x1b[?1047l", origin.clone())), vec![HazardLabel::AlternateScreen]);
        assert!(classify(&seq("\x1b[?1048h", origin.clone())).is_empty());
        assert!(classify(&seq("\x1b[?25l", origin)).is_empty());
    }

    #[test]
    fn osc_command_table() {
        let cases = [
            (52, HazardLabel::Clipboard),
            (8, HazardLabel::Hyperlink),
            (777, HazardLabel::Notification),
            (1337, HazardLabel::ProprietaryCommand),
            (5113, HazardLabel::FileTransfer),
        ];
        for (n, label) in cases {
            let bare = format!("\x1b]{}\x07", n);
            let with_payload = format!("\x1b]{};payload\x07", n);
            assert_eq!(classify(&seq(&bare, Origin::OscBare { command: n })), vec![label]);
            assert_eq!(classify(&seq(&with_payload, Origin::OscPayload { command: n })), vec![label]);
        }
        assert!(classify(&seq("\x1b]2;title\x07", Origin::OscPayload { command: 2 })).is_empty());
    }

    #[test]
    fn hyperlink_spoof_requires_mismatched_url() {
        let spoof = generator::hyperlink_spoof();
        assert_eq!(classify(&spoof), vec![HazardLabel::Hyperlink]);

        let honest = "\x1b]8;;https://bank.example/\x07https://bank.example/\x1b]8;;\x07";
        assert_eq!(hyperlink_spoof(honest), None);
        let plain_text = "\x1b]8;;https://bank.example/\x07click here\x1b]8;;\x07";
        assert_eq!(hyperlink_spoof(plain_text), None);
    }

    #[test]
    fn invisible_text_exact_pattern() {
        let origin = Origin::SgrParam { code: INVISIBLE_TEXT_SGR.to_string() };
        assert_eq!(classify(&seq("\x1b[38;5;231;49m", origin.clone())), vec![HazardLabel::InvisibleText]);
        assert!(classify(&seq("\x1b[38;5;231m", origin)).is_empty());
    }

    #[test]
    fn overflow_and_repeat_thresholds() {
        let o = Origin::CursorOverflow { param: 0 };
        assert_eq!(classify(&seq("\x1b[1000000000A", o.clone())), vec![HazardLabel::IntegerOverflow]);
        assert!(classify(&seq("\x1b[999999999A", o.clone())).is_empty());
        assert_eq!(
            classify(&seq("\x1b[99999999999999999999999C", o)),
            vec![HazardLabel::IntegerOverflow]
        );

        let r = Origin::RepeatFlood { count: 0 };
        assert_eq!(classify(&seq("A\x1b[1000000b", r.clone())), vec![HazardLabel::CharacterMultiplication]);
        assert!(classify(&seq("A\x1b[999999b", r)).is_empty());
    }

    #[test]
    fn every_malformed_entry_is_labelled() {
        for seq in generator::edge_cases() {
            if matches!(seq.origin, Origin::Malformed { .. }) {
                assert!(classify(&seq).contains(&HazardLabel::ParserConfusion), "{}", seq.escaped());
            }
        }
    }

    #[test]
    fn combined_attack_carries_component_labels() {
        let labels = classify(&generator::combined_attack());
        assert!(labels.contains(&HazardLabel::MultiVector));
        assert!(labels.contains(&HazardLabel::InvisibleText));
        assert!(labels.contains(&HazardLabel::Clipboard));
    }

    #[test]
    fn known_payloads_are_tagged_with_index() {
        let catalog = Catalog::standard();
        for seq in generator::malicious_payloads(&catalog) {
            if let Origin::KnownPayload { index } = seq.origin {
                assert!(classify(&seq).contains(&HazardLabel::KnownAttackVector(index)));
            }
        }
    }

    #[test]
    fn classification_is_deterministic() {
        let catalog = Catalog::standard();
        for seq in generator::osc_sweep(&catalog) {
            assert_eq!(classify(&seq), classify(&seq));
        }
    }

    #[test]
    fn split_components_of_combined_attack() {
        let attack = generator::combined_attack();
        let parts = split_components(&attack.bytes);
        assert_eq!(parts[0], "\x1b[38;5;231;49m");
        assert!(parts[1].starts_with("\x1b]52;"));
        assert_eq!(parts[2], "\x1b[2J");
        assert_eq!(parts.last().copied(), Some("\x1b[0m"));
    }

    #[test]
    fn label_text() {
        assert_eq!(HazardLabel::KnownAttackVector(3).to_string(), "known attack vector #3");
        assert_eq!(HazardLabel::TerminalBell.to_string(), "DoS via terminal bell");
    }
}
