//! Canonical ordering rules for Ruby-style sources.
//!
//! The engine reads a narrow node view ([`ast::Ast`]) built by a front end, and returns
//! a [`diagnostics::Report`] whose quickfixes never overlap. It never writes to a
//! buffer itself; [`edit::apply_edits`] and [`autocorrect::autocorrect`] are provided
//! for callers that want to.

pub mod ast;
pub mod autocorrect;
pub mod config;
pub mod diagnostics;
pub mod edit;
pub mod entry;
pub mod guard;
pub mod lint;
pub mod order;
pub mod rewrite;
pub mod rules;
pub mod source;
