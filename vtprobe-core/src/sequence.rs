// vtprobe-core/src/sequence.rs
//! Generated sequences and the metadata that travels with them.
//!
//! A [`Sequence`] is the unit everything else works on: the generator
//! creates it, the classifier inspects it, the recorder logs it. It is never
//! mutated after creation and carries no identity beyond its content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Escape (0x1B).
pub const ESC: char = '\x1b';
/// Bell (0x07), also the OSC terminator used throughout the generator.
pub const BEL: char = '\x07';
/// Control Sequence Introducer, `ESC [`.
pub const CSI: &str = "\x1b[";
/// Operating System Command introducer, `ESC ]`.
pub const OSC: &str = "\x1b]";

/// The category a sequence was generated from.
///
/// Declaration order is the fixed order in which the orchestrator runs the
/// phases, and the order categories appear in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    ControlChars,
    Csi,
    Sgr,
    Osc,
    MaliciousPayloads,
    EdgeCases,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::ControlChars,
        Category::Csi,
        Category::Sgr,
        Category::Osc,
        Category::MaliciousPayloads,
        Category::EdgeCases,
    ];

    /// Stable machine name, also accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ControlChars => "control-chars",
            Category::Csi => "csi",
            Category::Sgr => "sgr",
            Category::Osc => "osc",
            Category::MaliciousPayloads => "malicious-payloads",
            Category::EdgeCases => "edge-cases",
        }
    }

    /// Human-readable title used in console output and reports.
    pub fn title(&self) -> &'static str {
        match self {
            Category::ControlChars => "Control characters",
            Category::Csi => "CSI sequences",
            Category::Sgr => "SGR sequences",
            Category::Osc => "OSC sequences",
            Category::MaliciousPayloads => "Malicious payloads",
            Category::EdgeCases => "Edge cases",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(pub String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown category '{}'; expected one of: control-chars, csi, sgr, osc, malicious-payloads, edge-cases.",
            self.0
        )
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace('_', "-");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Which generator case produced a sequence, with the parameters it used.
///
/// This is the classifier's metadata: some hazard rules look at the bytes,
/// others at the origin (a malformed entry is only "malformed" because the
/// catalog says so).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    ControlChar { code: u8 },
    CsiBare { command: char },
    CsiParams { command: char, params: Vec<u32> },
    PrivateMode { command: char, mode: u32 },
    SgrParam { code: String },
    SgrPalette { background: bool, index: u8 },
    SgrRgb { r: u8, g: u8, b: u8 },
    OscBare { command: u32 },
    OscPayload { command: u32 },
    HyperlinkSpoof { target: String, visible: String },
    KnownPayload { index: usize },
    CombinedAttack,
    CursorOverflow { param: u64 },
    Malformed { index: usize },
    RepeatFlood { count: u64 },
}

/// A generated byte sequence together with its description and provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    pub bytes: String,
    pub description: String,
    pub category: Category,
    pub origin: Origin,
}

impl Sequence {
    pub fn new(
        bytes: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        origin: Origin,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            description: description.into(),
            category,
            origin,
        }
    }

    /// Printable rendering of the bytes, safe to write into a log file.
    pub fn escaped(&self) -> String {
        escape_sequence(&self.bytes)
    }
}

/// Renders control characters as `\xNN` (and a literal backslash as `\\`)
/// so a sequence can be shown without being interpreted by a terminal.
pub fn escape_sequence(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 2);
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xff {
                    out.push_str(&format!("\\x{:02x}", code));
                } else {
                    out.push_str(&format!("\\u{{{:x}}}", code));
                }
            }
            c => out.push(c),
        }
    }
    out
}
