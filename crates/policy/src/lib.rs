//! Path-access policy engine for the fsgate remote-filesystem gateway.
//!
//! A session fetches a server-managed policy text describing which paths on
//! the remote host may be read and/or written. This crate parses that text
//! into an immutable [`PolicySet`] and answers, per candidate path, whether
//! the path is readable and/or writable. It performs no I/O itself.
//!
//! # Policy format
//!
//! The policy text is line-oriented. Section headers in brackets select one
//! of five permission classes; the specifiers that follow name paths or
//! subtrees governed by that class:
//!
//! ```text
//! [readonly]
//! + ~
//!
//! [readwrite]
//! + /srv/www
//!  + logs
//! ```
//!
//! Valid sections are `noaccess`, `readonly`, `writeonly`, `readwrite`, and
//! `override` (case-insensitive). A specifier is an optionally indented `+`
//! or `-` followed by a path. Indentation is counted in characters and may
//! grow by at most one level per line; an indented specifier's path is
//! relative to the most recent specifier one level up, while an unindented
//! specifier's path must be absolute (`/...`) or home-relative (`~/...`).
//!
//! Paths may use glob tokens: `?` for one character, `*` within a single
//! path component, `{a,b}` alternation, and `...` for any number of
//! components. A rule naming a directory also governs everything beneath it.
//!
//! Every config is implicitly extended with
//!
//! ```text
//! [noaccess]
//! +~/.*
//! ```
//!
//! because dotfile directories in the home directory typically hold
//! credentials. Specifiers under an `[override]` section are re-appended
//! after that implicit rule with their signs flipped, which is the supported
//! way to carve an exception into it.
//!
//! Evaluation is last-match-wins in document order, starting from
//! no-access, so only an explicit grant in the policy text can expose a
//! path. Any malformed line invalidates the whole policy; a session with an
//! invalid policy denies everything.

mod error;
pub mod glob;
mod line;
mod parser;
mod rules;

pub use error::{ConfigError, ErrorKind};
pub use line::{classify, ConfigSection, LineKind, Sign, SpecifierData};
pub use parser::parse;
pub use rules::{CompiledRule, Permissions, PolicySet};
