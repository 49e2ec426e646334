// vtprobe-core/src/generator.rs
//! Sequence generation, one sweep per catalog category.
//!
//! Every function here is total: no I/O, no errors, and the output depends
//! only on the catalog, the limits and the random source handed in. Callers
//! that need exact output pass a seeded `StdRng`.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use rand::Rng;

use crate::catalog::{Catalog, INVISIBLE_TEXT_SGR};
use crate::config::GeneratorLimits;
use crate::sequence::{Category, Origin, Sequence, BEL, CSI, OSC};

/// Literal carried by the payload form of every OSC command.
pub const OSC_TEST_PAYLOAD: &str = "vtprobe-test-payload";

/// Link target and visible text of the hyperlink-spoof case. The visible
/// text is a URL that does not match the target.
pub const HYPERLINK_TARGET: &str = "https://attacker.example/login";
pub const HYPERLINK_VISIBLE: &str = "https://bank.example/login";

/// Cursor-up parameter used by the overflow probe (`u32::MAX`).
pub const CURSOR_OVERFLOW_PARAM: u64 = 4_294_967_295;

/// Repeat count used by the character-multiplication probe.
pub const REPEAT_FLOOD_COUNT: u64 = 1_000_000;

/// Malformed sequences and their descriptions, in catalog order.
pub const MALFORMED_SEQUENCES: &[(&str, &str)] = &[
    ("\x1b[", "unterminated CSI"),
    ("\x1b]0;unterminated title", "unterminated OSC"),
    ("\x1b[1;2;3", "missing final byte with multiple numeric fields"),
    ("\x1b[;;;m", "multiple empty parameter fields"),
    ("\x1b[-1A", "negative parameter"),
];

/// Literal text embedded in the combined attack payload.
const COMBINED_ATTACK_TEXT: &str = "Everything is fine. Press enter to continue.";

/// Clipboard write used by the combined attack (`echo pwned`, base64).
const COMBINED_ATTACK_CLIPBOARD: &str = "\x1b]52;c;ZWNobyBwd25lZA==\x07";

/// Runs the sweep for one category.
pub fn generate<R: Rng + ?Sized>(
    category: Category,
    catalog: &Catalog,
    limits: &GeneratorLimits,
    rng: &mut R,
) -> Vec<Sequence> {
    let sequences = match category {
        Category::ControlChars => control_char_sweep(catalog),
        Category::Csi => csi_sweep(catalog, limits, rng),
        Category::Sgr => sgr_sweep(catalog, limits, rng),
        Category::Osc => osc_sweep(catalog),
        Category::MaliciousPayloads => malicious_payloads(catalog),
        Category::EdgeCases => edge_cases(),
    };
    debug!("Generated {} sequences for category '{}'.", sequences.len(), category);
    sequences
}

/// Number of sequences [`generate`] produces for a category.
pub fn expected_count(category: Category, catalog: &Catalog, limits: &GeneratorLimits) -> usize {
    match category {
        Category::ControlChars => catalog.control_chars.len(),
        Category::Csi => {
            catalog.csi_commands.len()
                * (1 + limits.single_param_variants + limits.double_param_variants)
                + catalog.private_modes.len() * catalog.mode_setting_commands()
        }
        Category::Sgr => catalog.sgr_params.len() + 2 * catalog.palette.len() + limits.rgb_variants,
        Category::Osc => {
            let hyperlink = usize::from(catalog.osc_commands.iter().any(|o| o.number == 8));
            2 * catalog.osc_commands.len() + hyperlink
        }
        Category::MaliciousPayloads => catalog.payloads.len() + 1,
        Category::EdgeCases => 2 + MALFORMED_SEQUENCES.len(),
    }
}

/// One single-byte sequence per control character.
pub fn control_char_sweep(catalog: &Catalog) -> Vec<Sequence> {
    catalog
        .control_chars
        .iter()
        .map(|cc| {
            Sequence::new(
                char::from(cc.code).to_string(),
                format!("Control character {} (0x{:02X})", cc.name, cc.code),
                Category::ControlChars,
                Origin::ControlChar { code: cc.code },
            )
        })
        .collect()
}

/// Bare, one-parameter and two-parameter variants of every CSI command,
/// plus the private-mode form for mode-setting commands.
pub fn csi_sweep<R: Rng + ?Sized>(
    catalog: &Catalog,
    limits: &GeneratorLimits,
    rng: &mut R,
) -> Vec<Sequence> {
    let mut out = Vec::new();
    for cmd in &catalog.csi_commands {
        let f = cmd.final_byte;
        out.push(Sequence::new(
            format!("{CSI}{f}"),
            format!("CSI {} ({}) without parameters", f, cmd.name),
            Category::Csi,
            Origin::CsiBare { command: f },
        ));

        for _ in 0..limits.single_param_variants {
            let p = rng.random_range(0..limits.single_param_max);
            out.push(Sequence::new(
                format!("{CSI}{p}{f}"),
                format!("CSI {} ({}) with parameter {}", f, cmd.name, p),
                Category::Csi,
                Origin::CsiParams { command: f, params: vec![p] },
            ));
        }

        for _ in 0..limits.double_param_variants {
            let p1 = rng.random_range(0..limits.double_param_max);
            let p2 = rng.random_range(0..limits.double_param_max);
            out.push(Sequence::new(
                format!("{CSI}{p1};{p2}{f}"),
                format!("CSI {} ({}) with parameters {};{}", f, cmd.name, p1, p2),
                Category::Csi,
                Origin::CsiParams { command: f, params: vec![p1, p2] },
            ));
        }

        if cmd.mode_setting {
            for mode in &catalog.private_modes {
                out.push(Sequence::new(
                    format!("{CSI}?{}{f}", mode.number),
                    format!("DEC private mode {} ({}) via CSI ?{}{}", mode.number, mode.name, mode.number, f),
                    Category::Csi,
                    Origin::PrivateMode { command: f, mode: mode.number },
                ));
            }
        }
    }
    out
}

/// Catalog SGR parameters, sampled 256-colour palette in both planes, and
/// random 24-bit foregrounds.
pub fn sgr_sweep<R: Rng + ?Sized>(
    catalog: &Catalog,
    limits: &GeneratorLimits,
    rng: &mut R,
) -> Vec<Sequence> {
    let mut out = Vec::new();
    for param in &catalog.sgr_params {
        out.push(Sequence::new(
            format!("{CSI}{}m", param.code),
            format!("SGR {} ({})", param.code, param.name),
            Category::Sgr,
            Origin::SgrParam { code: param.code.to_string() },
        ));
    }

    for &index in &catalog.palette {
        out.push(Sequence::new(
            format!("{CSI}38;5;{index}m"),
            format!("256-colour foreground {}", index),
            Category::Sgr,
            Origin::SgrPalette { background: false, index },
        ));
        out.push(Sequence::new(
            format!("{CSI}48;5;{index}m"),
            format!("256-colour background {}", index),
            Category::Sgr,
            Origin::SgrPalette { background: true, index },
        ));
    }

    for _ in 0..limits.rgb_variants {
        let (r, g, b): (u8, u8, u8) = (rng.random(), rng.random(), rng.random());
        out.push(Sequence::new(
            format!("{CSI}38;2;{r};{g};{b}m"),
            format!("24-bit foreground rgb({}, {}, {})", r, g, b),
            Category::Sgr,
            Origin::SgrRgb { r, g, b },
        ));
    }
    out
}

/// Bare and payload-carrying forms of every OSC command, plus the dedicated
/// hyperlink-spoof case when OSC 8 is in the catalog.
pub fn osc_sweep(catalog: &Catalog) -> Vec<Sequence> {
    let mut out = Vec::new();
    for cmd in &catalog.osc_commands {
        let n = cmd.number;
        out.push(Sequence::new(
            format!("{OSC}{n}{BEL}"),
            format!("OSC {} ({})", n, cmd.name),
            Category::Osc,
            Origin::OscBare { command: n },
        ));
        out.push(Sequence::new(
            format!("{OSC}{n};{OSC_TEST_PAYLOAD}{BEL}"),
            format!("OSC {} ({}) with payload", n, cmd.name),
            Category::Osc,
            Origin::OscPayload { command: n },
        ));
        if n == 8 {
            out.push(hyperlink_spoof());
        }
    }
    out
}

/// An OSC 8 link whose visible text is a different URL than its target.
pub fn hyperlink_spoof() -> Sequence {
    Sequence::new(
        format!("{OSC}8;;{HYPERLINK_TARGET}{BEL}{HYPERLINK_VISIBLE}{OSC}8;;{BEL}"),
        format!("Hyperlink to {} displayed as {}", HYPERLINK_TARGET, HYPERLINK_VISIBLE),
        Category::Osc,
        Origin::HyperlinkSpoof {
            target: HYPERLINK_TARGET.to_string(),
            visible: HYPERLINK_VISIBLE.to_string(),
        },
    )
}

/// Every catalog payload verbatim, then the combined attack.
pub fn malicious_payloads(catalog: &Catalog) -> Vec<Sequence> {
    let mut out: Vec<Sequence> = catalog
        .payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            Sequence::new(
                payload.bytes.clone(),
                format!("Known payload #{}: {}", index, payload.name),
                Category::MaliciousPayloads,
                Origin::KnownPayload { index },
            )
        })
        .collect();
    out.push(combined_attack());
    out
}

/// Invisible text, clipboard write, screen clear, literal text, reset.
pub fn combined_attack() -> Sequence {
    Sequence::new(
        format!(
            "{CSI}{INVISIBLE_TEXT_SGR}m{COMBINED_ATTACK_CLIPBOARD}{CSI}2J{COMBINED_ATTACK_TEXT}{CSI}0m"
        ),
        "Combined attack: invisible text + clipboard write + screen clear",
        Category::MaliciousPayloads,
        Origin::CombinedAttack,
    )
}

/// Overflow-sized cursor movement, malformed sequences, repeat flood.
pub fn edge_cases() -> Vec<Sequence> {
    let mut out = Vec::with_capacity(2 + MALFORMED_SEQUENCES.len());
    out.push(Sequence::new(
        format!("{CSI}{CURSOR_OVERFLOW_PARAM}A"),
        format!("Cursor up by {} (integer overflow probe)", CURSOR_OVERFLOW_PARAM),
        Category::EdgeCases,
        Origin::CursorOverflow { param: CURSOR_OVERFLOW_PARAM },
    ));
    for (index, (bytes, what)) in MALFORMED_SEQUENCES.iter().enumerate() {
        out.push(Sequence::new(
            *bytes,
            format!("Malformed sequence: {}", what),
            Category::EdgeCases,
            Origin::Malformed { index },
        ));
    }
    out.push(Sequence::new(
        format!("A{CSI}{REPEAT_FLOOD_COUNT}b"),
        format!("Repeat preceding character {} times", REPEAT_FLOOD_COUNT),
        Category::EdgeCases,
        Origin::RepeatFlood { count: REPEAT_FLOOD_COUNT },
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CsiCommand;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_command_catalog(final_byte: char, mode_setting: bool) -> Catalog {
        Catalog {
            csi_commands: vec![CsiCommand { final_byte, name: "test", mode_setting }],
            ..Catalog::default()
        }
    }

    #[test]
    fn control_sweep_is_one_byte_per_entry() {
        let catalog = Catalog::standard();
        let seqs = control_char_sweep(&catalog);
        assert_eq!(seqs.len(), 33);
        assert!(seqs.iter().all(|s| s.bytes.len() == 1));
    }

    #[test]
    fn csi_single_command_yields_sixteen() {
        let catalog = single_command_catalog('A', false);
        let mut rng = StdRng::seed_from_u64(7);
        let seqs = csi_sweep(&catalog, &GeneratorLimits::default(), &mut rng);
        assert_eq!(seqs.len(), 16);
        assert_eq!(seqs[0].bytes, "\x1b[A");
        assert!(matches!(seqs[0].origin, Origin::CsiBare { command: 'A' }));
    }

    #[test]
    fn csi_random_parameters_stay_in_range() {
        let catalog = single_command_catalog('B', false);
        let mut rng = StdRng::seed_from_u64(99);
        for seq in csi_sweep(&catalog, &GeneratorLimits::default(), &mut rng) {
            if let Origin::CsiParams { params, .. } = &seq.origin {
                match params.len() {
                    1 => assert!(params[0] < 1000),
                    2 => assert!(params.iter().all(|p| *p < 100)),
                    n => panic!("unexpected parameter count {}", n),
                }
            }
        }
    }

    #[test]
    fn csi_sweep_is_reproducible_with_fixed_seed() {
        let catalog = Catalog::standard();
        let limits = GeneratorLimits::default();
        let a = csi_sweep(&catalog, &limits, &mut StdRng::seed_from_u64(42));
        let b = csi_sweep(&catalog, &limits, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn mode_setting_command_sweeps_private_modes() {
        let mut catalog = single_command_catalog('h', true);
        catalog.private_modes = Catalog::standard().private_modes;
        let mut rng = StdRng::seed_from_u64(1);
        let seqs = csi_sweep(&catalog, &GeneratorLimits::default(), &mut rng);
        assert_eq!(seqs.len(), 16 + catalog.private_modes.len());
        assert!(seqs.iter().any(|s| s.bytes == "\x1b[?1049h"));
    }

    #[test]
    fn sgr_sweep_counts_and_palette_forms() {
        let catalog = Catalog::standard();
        let limits = GeneratorLimits::default();
        let seqs = sgr_sweep(&catalog, &limits, &mut StdRng::seed_from_u64(3));
        assert_eq!(seqs.len(), catalog.sgr_params.len() + 52 + 5);
        assert!(seqs.iter().any(|s| s.bytes == "\x1b[38;5;250m"));
        assert!(seqs.iter().any(|s| s.bytes == "\x1b[48;5;0m"));
        assert_eq!(seqs.iter().filter(|s| s.bytes.starts_with("\x1b[38;2;")).count(), 5);
    }

    #[test]
    fn osc_sweep_adds_hyperlink_case_once() {
        let catalog = Catalog::standard();
        let seqs = osc_sweep(&catalog);
        assert_eq!(seqs.len(), 2 * catalog.osc_commands.len() + 1);
        let spoofs = seqs
            .iter()
            .filter(|s| matches!(s.origin, Origin::HyperlinkSpoof { .. }))
            .count();
        assert_eq!(spoofs, 1);
        assert!(seqs.iter().any(|s| s.bytes == "\x1b]52\x07"));
        assert!(seqs.iter().any(|s| s.bytes == format!("\x1b]52;{}\x07", OSC_TEST_PAYLOAD)));
    }

    #[test]
    fn combined_attack_component_order() {
        let bytes = combined_attack().bytes;
        let invisible = bytes.find("38;5;231;49m").unwrap();
        let clipboard = bytes.find("\x1b]52;").unwrap();
        let clear = bytes.find("\x1b[2J").unwrap();
        let text = bytes.find(COMBINED_ATTACK_TEXT).unwrap();
        let reset = bytes.rfind("\x1b[0m").unwrap();
        assert!(invisible < clipboard && clipboard < clear && clear < text && text < reset);
    }

    #[test]
    fn edge_cases_cover_fixed_list() {
        let seqs = edge_cases();
        assert_eq!(seqs.len(), 7);
        assert_eq!(seqs[0].bytes, "\x1b[4294967295A");
        assert_eq!(seqs.last().unwrap().bytes, "A\x1b[1000000b");
    }

    #[test]
    fn expected_count_matches_generation() {
        let catalog = Catalog::standard();
        let limits = GeneratorLimits::default();
        let mut rng = StdRng::seed_from_u64(11);
        for category in Category::ALL {
            let produced = generate(category, &catalog, &limits, &mut rng).len();
            assert_eq!(produced, expected_count(category, &catalog, &limits), "{}", category);
        }
    }
}
