use std::collections::BTreeMap;

use canon_contracts::CANON_REPORT_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edit::TextEdit;
use crate::source::{SourceBuffer, SourceSpan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Read,
    Config,
    Lint,
    Rewrite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Location {
    Text {
        span: Span,
        #[serde(skip_serializing_if = "Option::is_none")]
        snippet: Option<String>,
    },
}

impl Location {
    pub fn from_source(buffer: &SourceBuffer, span: SourceSpan) -> Self {
        let snippet = buffer.source_line(buffer.first_line(span)).to_string();
        Location::Text {
            span: Span {
                start: buffer.position(span.start),
                end: buffer.position(span.end),
                file: None,
            },
            snippet: Some(snippet),
        }
    }

    pub fn start_offset(&self) -> u64 {
        match self {
            Location::Text { span, .. } => span.start.offset.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quickfix {
    pub kind: QuickfixKind,
    pub edits: Vec<TextEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickfixKind {
    TextEdit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quickfix: Option<Quickfix>,
}

impl Diagnostic {
    /// A diagnostic with no location, used for failures outside any source file.
    pub fn error(code: &str, stage: Stage, message: impl Into<String>) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity: Severity::Error,
            stage,
            message: message.into(),
            loc: None,
            notes: Vec::new(),
            data: BTreeMap::new(),
            quickfix: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub schema_version: String,
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl Report {
    pub fn ok() -> Self {
        Self {
            schema_version: CANON_REPORT_SCHEMA_VERSION.to_string(),
            ok: true,
            diagnostics: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_diagnostics(mut self, mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            let ao = a.loc.as_ref().map(Location::start_offset).unwrap_or(0);
            let bo = b.loc.as_ref().map(Location::start_offset).unwrap_or(0);
            ao.cmp(&bo)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.ok = diagnostics.is_empty();
        self.diagnostics = diagnostics;
        self
    }
}
