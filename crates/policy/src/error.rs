use serde::Serialize;
use thiserror::Error;

/// The condition that invalidated a policy text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A specifier appeared before any section header.
    SpecifierBeforeSection,
    /// Indentation grew by more than one level versus the previous specifier.
    IndentTooDeep,
    /// An indented specifier's path was absolute or home-relative.
    ChildPathNotRelative,
    /// An unindented specifier's path was neither absolute nor home-relative.
    RootPathNotAbsolute,
    /// A `~username` form was used; only the login user's home is supported.
    UnsupportedHomeReference,
    /// Normalization would pop above the filesystem root.
    PathEscapesRoot,
    /// A glob brace group was not closed, or braces were nested.
    UnterminatedBrace,
    /// Bracketed text that is not one of the known section names.
    UnrecognizedSection,
    /// A line starting with `+`/`-` that otherwise fails the specifier grammar.
    MalformedSpecifier,
    /// A non-blank line matching none of the recognized shapes.
    UnrecognizedLine,
}

/// A parse failure, pinned to the line that caused it.
///
/// The first error aborts the parse and invalidates the entire policy;
/// callers must treat the session as having no file access. `line` is
/// zero-based and may point at one of the two implicit default-deny lines
/// appended after the user's text.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("policy config error at line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(line: usize, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            message: message.into(),
        }
    }
}
