//! Layout-preserving reconstruction of a reordered entry sequence.
//!
//! Entry texts are copied verbatim and only relocated. The layout mode comes from the
//! container: a single-line container stays on one line, a multi-line container is
//! re-emitted one entry per line.

use crate::edit::TextEdit;
use crate::entry::EntrySequence;
use crate::source::{SourceBuffer, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    SingleLine,
    MultiLine,
}

impl Layout {
    pub fn of(buffer: &SourceBuffer, container: SourceSpan) -> Self {
        if buffer.is_single_line(container) {
            Layout::SingleLine
        } else {
            Layout::MultiLine
        }
    }
}

/// Builds the edit that puts `seq` into `order` (a permutation from
/// [`crate::order::OrderingPolicy::canonical_order`]).
pub fn rewrite(buffer: &SourceBuffer, seq: &EntrySequence<'_>, order: &[usize]) -> TextEdit {
    if seq.interleaved {
        return fill_slots(buffer, seq, order);
    }
    match (Layout::of(buffer, seq.container), seq.braces) {
        (Layout::SingleLine, _) => TextEdit::replace(seq.range(), join_single_line(seq, order)),
        (Layout::MultiLine, Some(braces)) => {
            let base = buffer.indentation_of(seq.container.start);
            let indent = entry_indent(buffer, seq);
            let last = &seq.entries[seq.len() - 1];
            let trailing_comma = buffer
                .slice(SourceSpan::new(last.span.end, braces.close.start))
                .trim_start()
                .starts_with(',');

            let eol = line_ending(buffer, seq.container);
            let mut out = String::new();
            out.push_str(buffer.slice(braces.open));
            out.push_str(eol);
            for (i, &j) in order.iter().enumerate() {
                out.push_str(&indent);
                out.push_str(seq.entries[j].text);
                if i + 1 < order.len() || trailing_comma {
                    out.push(',');
                }
                out.push_str(eol);
            }
            out.push_str(base);
            out.push_str(buffer.slice(braces.close));
            TextEdit::replace(braces.open.join(braces.close), out)
        }
        (Layout::MultiLine, None) => {
            let first = &seq.entries[0];
            let indent = " ".repeat(buffer.column_of(first.span.start));
            let lines: Vec<String> = order
                .iter()
                .enumerate()
                .map(|(i, &j)| {
                    if i == 0 {
                        seq.entries[j].text.to_string()
                    } else {
                        format!("{indent}{}", seq.entries[j].text)
                    }
                })
                .collect();
            let separator = format!(",{}", line_ending(buffer, seq.container));
            TextEdit::replace(seq.range(), lines.join(separator.as_str()))
        }
    }
}

fn join_single_line(seq: &EntrySequence<'_>, order: &[usize]) -> String {
    order
        .iter()
        .map(|&j| seq.entries[j].text)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Line breaks inside a rebuilt container follow the ones it already has.
fn line_ending(buffer: &SourceBuffer, container: SourceSpan) -> &'static str {
    if buffer.slice(container).contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

/// Indentation for entries of a bracketed multi-line rebuild: the first entry's own
/// line indentation when it starts a line, otherwise its column.
fn entry_indent(buffer: &SourceBuffer, seq: &EntrySequence<'_>) -> String {
    let start = seq.entries[0].span.start;
    let indent = buffer.indentation_of(start);
    if indent.len() == buffer.column_of(start) {
        indent.to_string()
    } else {
        " ".repeat(buffer.column_of(start))
    }
}

/// Writes entries into the participating slots in canonical order and keeps every
/// gap, including non-participating siblings, byte for byte.
fn fill_slots(buffer: &SourceBuffer, seq: &EntrySequence<'_>, order: &[usize]) -> TextEdit {
    let range = seq.range();
    let mut out = String::new();
    let mut cursor = range.start;
    for (slot, &j) in seq.entries.iter().zip(order) {
        out.push_str(buffer.slice(SourceSpan::new(cursor, slot.span.start)));
        out.push_str(seq.entries[j].text);
        cursor = slot.span.end;
    }
    TextEdit::replace(range, out)
}

#[cfg(test)]
mod tests {
    use super::{rewrite, Layout};
    use crate::ast::{Delimiters, NodeId};
    use crate::edit::apply_edits;
    use crate::entry::{Entry, EntryKind, EntrySequence};
    use crate::order::OrderingPolicy;
    use crate::source::{SourceBuffer, SourceSpan};

    fn entries<'a>(buffer: &'a SourceBuffer, items: &[(&'a str, &'a str)]) -> Vec<Entry<'a>> {
        let text = buffer.text();
        let mut from = 0;
        items
            .iter()
            .map(|&(key, needle)| {
                let start = from + text[from..].find(needle).expect("needle in text");
                from = start + needle.len();
                let span = SourceSpan::new(start, from);
                Entry {
                    node: NodeId(0),
                    kind: EntryKind::Pair,
                    key,
                    text: buffer.slice(span),
                    span,
                    shorthand: false,
                    line: buffer.line_of(start),
                }
            })
            .collect()
    }

    fn braces(text: &str) -> Delimiters {
        let open = text.find('{').expect("open brace");
        let close = text.rfind('}').expect("close brace");
        Delimiters {
            open: SourceSpan::new(open, open + 1),
            close: SourceSpan::new(close, close + 1),
        }
    }

    fn apply(buffer: &SourceBuffer, seq: &EntrySequence<'_>) -> String {
        let order = OrderingPolicy::alphabetical().canonical_order(&seq.entries);
        let edit = rewrite(buffer, seq, &order);
        apply_edits(buffer.text(), &[edit]).expect("apply edit")
    }

    #[test]
    fn single_line_braced_keeps_padding() {
        let buffer = SourceBuffer::new("x = { b: 1, a: 2 }\n");
        let seq = EntrySequence {
            entries: entries(&buffer, &[("b", "b: 1"), ("a", "a: 2")]),
            container: SourceSpan::new(4, 18),
            braces: Some(braces(buffer.text())),
            interleaved: false,
        };
        assert_eq!(Layout::of(&buffer, seq.container), Layout::SingleLine);
        assert_eq!(apply(&buffer, &seq), "x = { a: 2, b: 1 }\n");
    }

    #[test]
    fn multi_line_braced_keeps_trailing_comma() {
        let text = "{c: 3,\n a: 1,\n b: 2,\n}";
        let buffer = SourceBuffer::new(text);
        let seq = EntrySequence {
            entries: entries(&buffer, &[("c", "c: 3"), ("a", "a: 1"), ("b", "b: 2")]),
            container: SourceSpan::new(0, text.len()),
            braces: Some(braces(text)),
            interleaved: false,
        };
        assert_eq!(apply(&buffer, &seq), "{\n a: 1,\n b: 2,\n c: 3,\n}");
    }

    #[test]
    fn multi_line_braced_without_trailing_comma() {
        let text = "  opts = {\n    z: 1,\n    y: 2\n  }\n";
        let buffer = SourceBuffer::new(text);
        let open = text.find('{').expect("open");
        let close = text.rfind('}').expect("close");
        let seq = EntrySequence {
            entries: entries(&buffer, &[("z", "z: 1"), ("y", "y: 2")]),
            container: SourceSpan::new(open, close + 1),
            braces: Some(braces(text)),
            interleaved: false,
        };
        assert_eq!(apply(&buffer, &seq), "  opts = {\n    y: 2,\n    z: 1\n  }\n");
    }

    #[test]
    fn multi_line_implicit_aligns_to_first_entry() {
        let text = "attribute :name,\n          zebra: true,\n          alpha: false\n";
        let buffer = SourceBuffer::new(text);
        let list = entries(&buffer, &[("zebra", "zebra: true"), ("alpha", "alpha: false")]);
        let container = list[0].span.join(list[1].span);
        let seq = EntrySequence {
            entries: list,
            container,
            braces: None,
            interleaved: false,
        };
        assert_eq!(
            apply(&buffer, &seq),
            "attribute :name,\n          alpha: false,\n          zebra: true\n"
        );
    }

    #[test]
    fn multi_line_rebuilds_keep_crlf_line_endings() {
        let text = "x = {\r\n  b: 1,\r\n  a: 2,\r\n}\r\n";
        let buffer = SourceBuffer::new(text);
        let open = text.find('{').expect("open");
        let close = text.rfind('}').expect("close");
        let seq = EntrySequence {
            entries: entries(&buffer, &[("b", "b: 1"), ("a", "a: 2")]),
            container: SourceSpan::new(open, close + 1),
            braces: Some(braces(text)),
            interleaved: false,
        };
        assert_eq!(apply(&buffer, &seq), "x = {\r\n  a: 2,\r\n  b: 1,\r\n}\r\n");

        let text = "attribute :name,\r\n          zebra: true,\r\n          alpha: false\r\n";
        let buffer = SourceBuffer::new(text);
        let list = entries(&buffer, &[("zebra", "zebra: true"), ("alpha", "alpha: false")]);
        let container = list[0].span.join(list[1].span);
        let seq = EntrySequence {
            entries: list,
            container,
            braces: None,
            interleaved: false,
        };
        assert_eq!(
            apply(&buffer, &seq),
            "attribute :name,\r\n          alpha: false,\r\n          zebra: true\r\n"
        );
    }

    #[test]
    fn interleaved_slots_keep_gaps() {
        let text = "delegate :b, other,\n  :a, to: :x";
        let buffer = SourceBuffer::new(text);
        let list = entries(&buffer, &[("b", ":b"), ("a", ":a")]);
        let container = list[0].span.join(list[1].span);
        let seq = EntrySequence {
            entries: list,
            container,
            braces: None,
            interleaved: true,
        };
        assert_eq!(apply(&buffer, &seq), "delegate :a, other,\n  :b, to: :x");
    }
}
