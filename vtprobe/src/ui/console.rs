//! Console progress output for a probe run.

use std::io::{self, Write};

use is_terminal::IsTerminal;
use vtprobe_core::{Category, RunObserver, VulnerabilityRecord};

use crate::ui::output_format::styled;
use crate::ui::theme::{ThemeEntry, ThemeMap};

/// Prints one progress line per phase and one marker line per finding.
///
/// Sequences are always shown in escaped form, so nothing generated by the
/// probe reaches the terminal raw.
pub struct ConsoleObserver {
    writer: Box<dyn Write>,
    theme: ThemeMap,
    supports_color: bool,
}

impl ConsoleObserver {
    pub fn new(writer: Box<dyn Write>, theme: ThemeMap, supports_color: bool) -> Self {
        Self { writer, theme, supports_color }
    }

    /// Writes to stderr, coloured when stderr is a terminal.
    pub fn stderr(theme: ThemeMap) -> Self {
        let supports_color = io::stderr().is_terminal();
        Self::new(Box::new(io::stderr()), theme, supports_color)
    }

    fn paint(&self, text: &str, entry: ThemeEntry) -> String {
        styled(text, entry, &self.theme, self.supports_color)
    }

    fn emit(&mut self, line: String) {
        let _ = writeln!(self.writer, "{}", line);
    }
}

impl RunObserver for ConsoleObserver {
    fn phase_started(&mut self, category: Category, planned: usize) {
        let line = format!(
            "{} {} {}",
            self.paint("Testing", ThemeEntry::Info),
            self.paint(&category.title().to_lowercase(), ThemeEntry::CategoryName),
            self.paint(&format!("({} sequences)...", planned), ThemeEntry::Info),
        );
        self.emit(line);
    }

    fn phase_skipped(&mut self, category: Category) {
        let line = self.paint(
            &format!("Skipping {} (not selected).", category.title().to_lowercase()),
            ThemeEntry::Warn,
        );
        self.emit(line);
    }

    fn vulnerability_found(&mut self, record: &VulnerabilityRecord) {
        let line = format!(
            "{} {} - {}",
            self.paint("[!] Vulnerability found:", ThemeEntry::Vulnerability),
            record.label,
            record.sequence.escaped()
        );
        self.emit(line);
    }

    fn phase_finished(&mut self, category: Category, tests: usize, vulnerabilities: usize) {
        let line = format!(
            "    {}: {} tests, {} vulnerabilities",
            self.paint(category.title(), ThemeEntry::CategoryName),
            self.paint(&tests.to_string(), ThemeEntry::Count),
            self.paint(&vulnerabilities.to_string(), ThemeEntry::Count),
        );
        self.emit(line);
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::ThemeStyle;
    use std::cell::RefCell;
    use std::rc::Rc;
    use vtprobe_core::{HazardLabel, Origin, Sequence};

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn finding_lines_are_escaped() {
        let buf = SharedBuf::default();
        let mut observer = ConsoleObserver::new(Box::new(buf.clone()), ThemeStyle::default_theme_map(), false);
        let record = VulnerabilityRecord {
            timestamp: chrono::Utc::now(),
            sequence: Sequence::new("\x07", "bell", Category::ControlChars, Origin::ControlChar { code: 7 }),
            label: HazardLabel::TerminalBell,
        };
        observer.phase_started(Category::ControlChars, 33);
        observer.vulnerability_found(&record);
        observer.phase_finished(Category::ControlChars, 33, 1);

        let out = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert!(out.contains("Testing control characters (33 sequences)..."));
        assert!(out.contains("[!] Vulnerability found: DoS via terminal bell - \\x07"));
        assert!(out.contains("Control characters: 33 tests, 1 vulnerabilities"));
        assert!(!out.contains('\x07'));
    }
}
