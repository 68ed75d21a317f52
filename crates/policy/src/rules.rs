use crate::glob::PathPattern;
use crate::line::{ConfigSection, Sign};

/// One entry of a compiled policy: a section header or a fully resolved
/// specifier. Order is load-bearing; evaluation is last-match-wins.
#[derive(Debug, Clone)]
pub enum CompiledRule {
    SectionHeader(ConfigSection),
    Specifier { sign: Sign, pattern: PathPattern },
}

/// Read/write decision for one candidate path. Starts fully denied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
}

fn section_grant(section: ConfigSection) -> Permissions {
    match section {
        ConfigSection::NoAccess => Permissions {
            read: false,
            write: false,
        },
        ConfigSection::ReadOnly => Permissions {
            read: true,
            write: false,
        },
        ConfigSection::WriteOnly => Permissions {
            read: false,
            write: true,
        },
        ConfigSection::ReadWrite => Permissions {
            read: true,
            write: true,
        },
        // The parser strips override sections during merging; deny if one
        // ever reaches evaluation.
        ConfigSection::Override => Permissions::default(),
    }
}

/// An immutable, build-once policy: the ordered rule list produced by a
/// successful parse. Evaluation only reads, so a `PolicySet` can be shared
/// across concurrent callers without locking.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    rules: Vec<CompiledRule>,
}

impl PolicySet {
    pub(crate) fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Evaluates the policy for one candidate path.
    ///
    /// Scans the rules in order; the section header in force when a
    /// specifier matches decides what the match does. An Include match
    /// overwrites the permissions with the section's grant; an Exclude
    /// match restores the permissions that were in force when the section
    /// began, so the section leaves that subtree untouched. If nothing
    /// matches, the path stays fully denied.
    pub fn permissions(&self, path: &str) -> Permissions {
        let mut perms = Permissions::default();
        let mut at_section_start = Permissions::default();
        let mut section = None;

        for rule in &self.rules {
            match rule {
                CompiledRule::SectionHeader(next) => {
                    section = Some(*next);
                    at_section_start = perms;
                }
                CompiledRule::Specifier { sign, pattern } if pattern.matches(path) => {
                    // The parser guarantees a header precedes every
                    // specifier.
                    let Some(section) = section else { continue };
                    perms = match sign {
                        Sign::Include => section_grant(section),
                        Sign::Exclude => at_section_start,
                    };
                }
                CompiledRule::Specifier { .. } => {}
            }
        }

        perms
    }

    pub fn is_readable(&self, path: &str) -> bool {
        self.permissions(path).read
    }

    pub fn is_writable(&self, path: &str) -> bool {
        self.permissions(path).write
    }
}
