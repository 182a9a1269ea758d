use serde::{Deserialize, Serialize};

use crate::source::SourceSpan;

/// Replace the bytes `[start, end)` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl TextEdit {
    pub fn replace(span: SourceSpan, replacement: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            replacement: replacement.into(),
        }
    }

    pub fn span(&self) -> SourceSpan {
        SourceSpan::new(self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub struct EditError {
    pub message: String,
}

impl std::fmt::Display for EditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for EditError {}

/// Applies a batch of edits atomically. The batch is rejected as a whole when an
/// edit falls outside `text`, splits a UTF-8 sequence, or overlaps another edit.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Result<String, EditError> {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.start, e.end));

    for e in &ordered {
        check_bounds(text, e)?;
    }
    for pair in ordered.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.span().overlaps(b.span()) {
            return Err(EditError {
                message: format!(
                    "overlapping edits: [{}, {}) and [{}, {})",
                    a.start, a.end, b.start, b.end
                ),
            });
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for e in ordered {
        out.push_str(&text[cursor..e.start]);
        out.push_str(&e.replacement);
        cursor = e.end;
    }
    out.push_str(&text[cursor..]);
    Ok(out)
}

fn check_bounds(text: &str, e: &TextEdit) -> Result<(), EditError> {
    if e.start > e.end || e.end > text.len() {
        return Err(EditError {
            message: format!(
                "edit out of bounds: [{}, {}) in a {}-byte buffer",
                e.start,
                e.end,
                text.len()
            ),
        });
    }
    if !text.is_char_boundary(e.start) || !text.is_char_boundary(e.end) {
        return Err(EditError {
            message: format!("edit splits a UTF-8 sequence: [{}, {})", e.start, e.end),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_edits, TextEdit};

    fn edit(start: usize, end: usize, replacement: &str) -> TextEdit {
        TextEdit {
            start,
            end,
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn applies_in_offset_order_regardless_of_input_order() {
        let out = apply_edits("foo(b: b, a: a)", &[edit(10, 14, "a:"), edit(4, 8, "b:")])
            .expect("apply edits");
        assert_eq!(out, "foo(b:, a:)");
    }

    #[test]
    fn adjacent_edits_are_not_overlapping() {
        let out = apply_edits("abcd", &[edit(0, 2, "X"), edit(2, 4, "Y")]).expect("apply edits");
        assert_eq!(out, "XY");
    }

    #[test]
    fn rejects_overlap_and_out_of_bounds() {
        let err = apply_edits("abcdef", &[edit(0, 3, "x"), edit(2, 4, "y")])
            .expect_err("overlap must fail");
        assert!(err.message.contains("overlapping"), "unexpected error: {err}");

        let err = apply_edits("abc", &[edit(1, 9, "x")]).expect_err("bounds must fail");
        assert!(err.message.contains("out of bounds"), "unexpected error: {err}");

        let err = apply_edits("é", &[edit(1, 2, "x")]).expect_err("boundary must fail");
        assert!(err.message.contains("UTF-8"), "unexpected error: {err}");
    }

    #[test]
    fn empty_batch_is_identity() {
        assert_eq!(apply_edits("{a: 1}", &[]).expect("apply edits"), "{a: 1}");
    }
}
