use once_cell::sync::Lazy;
use regex::Regex;

/// Permission class named by a section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    NoAccess,
    ReadOnly,
    WriteOnly,
    ReadWrite,
    Override,
}

/// Whether a specifier includes its subtree in the section or leaves it
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Include,
    Exclude,
}

impl Sign {
    pub fn flipped(self) -> Self {
        match self {
            Self::Include => Self::Exclude,
            Self::Exclude => Self::Include,
        }
    }
}

/// One specifier line, before path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecifierData {
    pub sign: Sign,
    /// Leading whitespace run, counted in characters.
    pub indent: usize,
    /// The raw path text, still relative or home-relative.
    pub path: String,
}

/// Classification of a single config line. Total: every input maps to
/// exactly one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    SectionHeader(ConfigSection),
    Specifier(SpecifierData),
    SectionError,
    SpecifierError,
    MiscError,
}

// Section-name table, ordered descending by name. Lookups scan in table
// order, so the most-specific name would win if names ever overlapped.
const SECTION_NAMES: &[(&str, ConfigSection)] = &[
    ("writeonly", ConfigSection::WriteOnly),
    ("readwrite", ConfigSection::ReadWrite),
    ("readonly", ConfigSection::ReadOnly),
    ("override", ConfigSection::Override),
    ("noaccess", ConfigSection::NoAccess),
];

static RE_BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*$").unwrap());
static RE_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[\s*([A-Za-z]+)\s*\]\s*$").unwrap());
static RE_SPECIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\s*)([+-])\s*(.*\S)\s*$").unwrap());

fn lookup_section(name: &str) -> Option<ConfigSection> {
    SECTION_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, section)| *section)
}

/// Classifies one line of policy text. Pure; no ordering dependency between
/// lines at this stage.
pub fn classify(line: &str) -> LineKind {
    if RE_BLANK.is_match(line) {
        return LineKind::Blank;
    }

    if let Some(caps) = RE_SECTION.captures(line) {
        let name = caps[1].to_ascii_lowercase();
        return match lookup_section(&name) {
            Some(section) => LineKind::SectionHeader(section),
            None => LineKind::SectionError,
        };
    }

    if let Some(caps) = RE_SPECIFIER.captures(line) {
        let sign = if &caps[2] == "+" {
            Sign::Include
        } else {
            Sign::Exclude
        };
        return LineKind::Specifier(SpecifierData {
            sign,
            indent: caps[1].chars().count(),
            path: caps[3].to_string(),
        });
    }

    // Not a valid line; pick the error kind from the leading token.
    let rest = line.trim_start();
    if rest.starts_with('[') {
        LineKind::SectionError
    } else if rest.starts_with('+') || rest.starts_with('-') {
        LineKind::SpecifierError
    } else {
        LineKind::MiscError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   \t "), LineKind::Blank);
    }

    #[test]
    fn section_headers_are_case_insensitive() {
        assert_eq!(
            classify("[noaccess]"),
            LineKind::SectionHeader(ConfigSection::NoAccess)
        );
        assert_eq!(
            classify("  [ ReadOnly ]  "),
            LineKind::SectionHeader(ConfigSection::ReadOnly)
        );
        assert_eq!(
            classify("[OVERRIDE]"),
            LineKind::SectionHeader(ConfigSection::Override)
        );
    }

    #[test]
    fn unknown_or_malformed_sections() {
        assert_eq!(classify("[secret]"), LineKind::SectionError);
        assert_eq!(classify("[readonly"), LineKind::SectionError);
        assert_eq!(classify("  [read only]"), LineKind::SectionError);
    }

    #[test]
    fn specifiers_capture_sign_indent_and_path() {
        assert_eq!(
            classify("+ /usr/src"),
            LineKind::Specifier(SpecifierData {
                sign: Sign::Include,
                indent: 0,
                path: "/usr/src".into(),
            })
        );
        assert_eq!(
            classify("\t\t- local/bin  "),
            LineKind::Specifier(SpecifierData {
                sign: Sign::Exclude,
                indent: 2,
                path: "local/bin".into(),
            })
        );
    }

    #[test]
    fn specifier_without_path_is_an_error() {
        assert_eq!(classify("+"), LineKind::SpecifierError);
        assert_eq!(classify("  -   "), LineKind::SpecifierError);
    }

    #[test]
    fn anything_else_is_a_misc_error() {
        assert_eq!(classify("readonly"), LineKind::MiscError);
        assert_eq!(classify("# comment"), LineKind::MiscError);
    }
}
