//! Human-readable TLV dump
//!
//! Each node renders as one line: tag octets, length octets, then
//! `[CLASS FORM number]`. Primitive nodes follow with their content octets;
//! constructed nodes open a ` {` block, render their children one
//! indentation level deeper, and close with `}`.
//!
//! ```text
//! 31 0c [UNIVERSAL CONSTRUCTED 17] {
//!   04 00 [UNIVERSAL PRIMITIVE 4]
//!   0a 01 [UNIVERSAL PRIMITIVE 10] 00
//! }
//! ```
//!
//! A fault renders as a `<parse error: ...>` line at the point where
//! decoding stopped; everything decoded before it is still shown.

use crate::ber::tlv::{self, TlvNode, TlvTree, WalkerConfig};
use crate::error::Asn1Error;
use asn1rt_core::ByteWindow;
use std::ops::{Deref, DerefMut};

/// Receiver of rendered output
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticSink {
    fn write_token(&mut self, token: &str);

    fn write_hex_octet(&mut self, octet: u8);

    /// Indent every following line by `width` more columns
    fn open_indent(&mut self, width: usize);

    /// Undo the most recent `open_indent`
    fn close_indent(&mut self);

    fn end_line(&mut self);
}

/// Open indentation level, closed when the scope is dropped
///
/// Opening and closing cannot get out of step, including on early return.
pub struct IndentScope<'s, S: DiagnosticSink + ?Sized> {
    sink: &'s mut S,
}

impl<'s, S: DiagnosticSink + ?Sized> IndentScope<'s, S> {
    pub fn open(sink: &'s mut S, width: usize) -> Self {
        sink.open_indent(width);
        Self { sink }
    }
}

impl<S: DiagnosticSink + ?Sized> Deref for IndentScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.sink
    }
}

impl<S: DiagnosticSink + ?Sized> DerefMut for IndentScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.sink
    }
}

impl<S: DiagnosticSink + ?Sized> Drop for IndentScope<'_, S> {
    fn drop(&mut self) {
        self.sink.close_indent();
    }
}

/// Text sink that indents at the start of each line
#[derive(Debug)]
pub struct IndentWriter {
    out: String,
    widths: Vec<usize>,
    indent: usize,
    at_line_start: bool,
}

impl IndentWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            widths: Vec::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn start_line(&mut self) {
        if self.at_line_start {
            self.out.extend(std::iter::repeat_n(' ', self.indent));
            self.at_line_start = false;
        }
    }
}

impl Default for IndentWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for IndentWriter {
    fn write_token(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        self.start_line();
        self.out.push_str(token);
    }

    fn write_hex_octet(&mut self, octet: u8) {
        self.start_line();
        self.out.push_str(&format!("{:02x}", octet));
    }

    fn open_indent(&mut self, width: usize) {
        self.widths.push(width);
        self.indent += width;
    }

    fn close_indent(&mut self) {
        if let Some(width) = self.widths.pop() {
            self.indent -= width;
        }
    }

    fn end_line(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }
}

/// Render a walked tree into `sink`
pub fn render_tree<S: DiagnosticSink + ?Sized>(tree: &TlvTree<'_>, sink: &mut S, config: &WalkerConfig) {
    for node in tree.nodes() {
        render_node(node, sink, config);
    }
    if let Some(fault) = tree.fault() {
        render_fault(fault, sink);
    }
}

/// Render one node and its subtree into `sink`
pub fn render_node<S: DiagnosticSink + ?Sized>(node: &TlvNode<'_>, sink: &mut S, config: &WalkerConfig) {
    write_octets(node.tag_octets(), sink);
    sink.write_token(" ");
    write_octets(node.length_octets(), sink);
    sink.write_token(" ");
    sink.write_token(&format!("[{} {} {}]", node.class(), node.form(), node.number()));

    if node.form().is_constructed() {
        sink.write_token(" {");
        sink.end_line();
        {
            let mut scope = IndentScope::open(sink, config.indent_width);
            for child in node.children() {
                render_node(child, &mut *scope, config);
            }
            if let Some(fault) = node.fault() {
                render_fault(fault, &mut *scope);
            }
        }
        sink.write_token("}");
    } else {
        for octet in node.content().iter() {
            sink.write_token(" ");
            sink.write_hex_octet(octet);
        }
    }
    sink.end_line();
}

fn write_octets<S: DiagnosticSink + ?Sized>(octets: ByteWindow<'_>, sink: &mut S) {
    for (i, octet) in octets.iter().enumerate() {
        if i > 0 {
            sink.write_token(" ");
        }
        sink.write_hex_octet(octet);
    }
}

fn render_fault<S: DiagnosticSink + ?Sized>(fault: &Asn1Error, sink: &mut S) {
    sink.write_token(&format!("<parse error: {}>", fault));
    sink.end_line();
}

/// Dump `bytes` with the default configuration
pub fn dump(bytes: &[u8]) -> String {
    dump_with(bytes, &WalkerConfig::default())
}

pub fn dump_with(bytes: &[u8], config: &WalkerConfig) -> String {
    let tree = tlv::walk_window(ByteWindow::new(bytes), config);
    let mut writer = IndentWriter::new();
    render_tree(&tree, &mut writer, config);
    writer.into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_dump_constructed_set() {
        let data = [
            0x31, 0x0c, 0x04, 0x00, 0x04, 0x00, 0x04, 0x00, 0x0a, 0x01, 0x00, 0x01, 0x01, 0x00,
        ];
        let expected = "\
31 0c [UNIVERSAL CONSTRUCTED 17] {
  04 00 [UNIVERSAL PRIMITIVE 4]
  04 00 [UNIVERSAL PRIMITIVE 4]
  04 00 [UNIVERSAL PRIMITIVE 4]
  0a 01 [UNIVERSAL PRIMITIVE 10] 00
  01 01 [UNIVERSAL PRIMITIVE 1] 00
}
";
        assert_eq!(dump(&data), expected);
    }

    #[test]
    fn test_dump_nested_and_high_tag() {
        let data = [0x30, 0x05, 0xbf, 0x1f, 0x02, 0x05, 0x00];
        let expected = "\
30 05 [UNIVERSAL CONSTRUCTED 16] {
  bf 1f 02 [CONTEXT CONSTRUCTED 31] {
    05 00 [UNIVERSAL PRIMITIVE 5]
  }
}
";
        assert_eq!(dump(&data), expected);
    }

    #[test]
    fn test_dump_custom_indent() {
        let config = WalkerConfig {
            indent_width: 4,
            ..WalkerConfig::default()
        };
        let out = dump_with(&[0x30, 0x02, 0x05, 0x00], &config);
        assert_eq!(out, "30 02 [UNIVERSAL CONSTRUCTED 16] {\n    05 00 [UNIVERSAL PRIMITIVE 5]\n}\n");
    }

    #[test]
    fn test_dump_empty_input() {
        assert_eq!(dump(&[]), "");
    }

    #[test]
    fn test_dump_shows_partial_tree_and_fault() {
        let data = [0x30, 0x05, 0x05, 0x00, 0x04, 0x03, 0xaa];
        let out = dump(&data);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "30 05 [UNIVERSAL CONSTRUCTED 16] {");
        assert_eq!(lines[1], "  05 00 [UNIVERSAL PRIMITIVE 5]");
        assert!(lines[2].starts_with("  <parse error: "));
        assert!(lines[2].contains("content"));
        assert_eq!(lines[3], "}");
    }

    #[test]
    fn test_dump_top_level_fault() {
        let out = dump(&[0x05, 0x00, 0x02]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "05 00 [UNIVERSAL PRIMITIVE 5]");
        assert!(lines[1].starts_with("<parse error: "));
        assert!(lines[1].contains("length"));
    }

    #[test]
    fn test_indent_scope_closes_on_drop() {
        let mut writer = IndentWriter::new();
        {
            let mut scope = IndentScope::open(&mut writer, 3);
            scope.write_token("a");
            scope.end_line();
        }
        writer.write_token("b");
        writer.end_line();
        assert_eq!(writer.as_str(), "   a\nb\n");
    }

    #[test]
    fn test_render_pairs_indent_calls() {
        let data = [0x30, 0x04, 0x30, 0x02, 0x05, 0x00];
        let tree = tlv::walk(&data);

        let events = Arc::new(Mutex::new(Vec::new()));
        let mut sink = MockDiagnosticSink::new();
        sink.expect_write_hex_octet().returning(|_| ());
        sink.expect_write_token().returning(|_| ());
        let log = Arc::clone(&events);
        sink.expect_open_indent()
            .withf(|width| *width == 2)
            .times(2)
            .returning(move |_| log.lock().unwrap().push("open"));
        let log = Arc::clone(&events);
        sink.expect_close_indent()
            .times(2)
            .returning(move || log.lock().unwrap().push("close"));
        let log = Arc::clone(&events);
        sink.expect_end_line()
            .times(5)
            .returning(move || log.lock().unwrap().push("line"));

        render_tree(&tree, &mut sink, &WalkerConfig::default());

        assert_eq!(
            *events.lock().unwrap(),
            vec!["line", "open", "line", "open", "line", "close", "line", "close", "line"]
        );
    }

    #[test]
    fn test_primitive_writes_no_indent() {
        let tree = tlv::walk(&[0x01, 0x01, 0xff]);
        let mut sink = MockDiagnosticSink::new();
        sink.expect_write_token().returning(|_| ());
        sink.expect_write_hex_octet().times(3).returning(|_| ());
        sink.expect_end_line().times(1).returning(|| ());
        sink.expect_open_indent().never();
        sink.expect_close_indent().never();

        render_tree(&tree, &mut sink, &WalkerConfig::default());
    }
}
