//! Terminal control sequence stripping
//!
//! Output read back from a pseudoterminal is full of SGR colors, cursor
//! movement, bracketed-paste toggles and OSC titles. Everything that is not
//! printable text is dropped here using a `vte` parser, which understands the
//! full escape grammar rather than a handful of regex shapes.

use vte::{Parser, Perform};

/// Collects printable characters, ignoring every control sequence
struct TextCollector {
    text: String,
}

impl Perform for TextCollector {
    fn print(&mut self, c: char) {
        self.text.push(c);
    }

    fn execute(&mut self, byte: u8) {
        // Tabs are content; other C0 controls (BEL, BS, CR) are not
        if byte == b'\t' {
            self.text.push('\t');
        }
    }
}

/// Remove all ANSI/VT control sequences and C0 controls (except tab) from a line
pub fn strip_control_sequences(line: &str) -> String {
    if !line.chars().any(|c| c.is_control() && c != '\t') {
        return line.to_string();
    }

    let mut parser = Parser::new();
    let mut collector = TextCollector {
        text: String::with_capacity(line.len()),
    };
    parser.advance(&mut collector, line.as_bytes());
    collector.text
}

/// Whether a line is empty once control sequences and whitespace are removed
pub fn is_blank(line: &str) -> bool {
    strip_control_sequences(line).trim().is_empty()
}
