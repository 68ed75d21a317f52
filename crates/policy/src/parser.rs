use crate::error::{ConfigError, ErrorKind};
use crate::glob;
use crate::line::{classify, ConfigSection, LineKind};
use crate::rules::{CompiledRule, PolicySet};

// Background policy appended to every config: dotfile directories under
// the remote home typically hold credentials (keys in .ssh and the like),
// so they are denied unless an [override] section punches a hole.
const IMPLICIT_LINES: [&str; 2] = ["[noaccess]", "+~/.*"];

/// Parses a full policy text against the remote user's home directory.
///
/// Called once per session, after the transport has supplied both the
/// policy text and the home string substituted for a leading `~`. The
/// first malformed line aborts the parse; there is no partial policy.
pub fn parse(text: &str, remote_home: &str) -> Result<PolicySet, ConfigError> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    lines.extend(IMPLICIT_LINES);

    // Current indentation context; a section header resets it.
    let mut column = 0usize;
    let mut saw_section = false;
    // Slot i holds the resolved (pre-normalization) path of the most
    // recent specifier at indent level i.
    let mut parent_paths: Vec<String> = Vec::new();
    let mut raw: Vec<CompiledRule> = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        match classify(line) {
            LineKind::Blank => continue,

            LineKind::SectionHeader(section) => {
                saw_section = true;
                column = 0;
                raw.push(CompiledRule::SectionHeader(section));
            }

            LineKind::Specifier(spec) => {
                if !saw_section {
                    return Err(ConfigError::new(
                        index,
                        ErrorKind::SpecifierBeforeSection,
                        format!(
                            "the first non-blank line must be a section heading, \
                             not a specifier: {line}"
                        ),
                    ));
                }
                if spec.indent > column + 1 {
                    return Err(ConfigError::new(
                        index,
                        ErrorKind::IndentTooDeep,
                        format!("indent too deep, more than one greater than the previous: {line}"),
                    ));
                }
                column = spec.indent;

                let resolved = if column > 0 {
                    if spec.path.starts_with('/') || spec.path.starts_with('~') {
                        return Err(ConfigError::new(
                            index,
                            ErrorKind::ChildPathNotRelative,
                            format!("child specifier must have a relative path: {line}"),
                        ));
                    }
                    let parent = parent_paths.get(column - 1).ok_or_else(|| {
                        ConfigError::new(
                            index,
                            ErrorKind::IndentTooDeep,
                            format!("indented specifier has no parent path: {line}"),
                        )
                    })?;
                    format!("{parent}/{}", spec.path)
                } else if let Some(rest) = spec.path.strip_prefix('~') {
                    if !rest.is_empty() && !rest.starts_with('/') {
                        // Only the login user's home is known to the session;
                        // ~username would need a remote lookup.
                        return Err(ConfigError::new(
                            index,
                            ErrorKind::UnsupportedHomeReference,
                            format!("~username is not supported, only ~/: {line}"),
                        ));
                    }
                    format!("{remote_home}{rest}")
                } else {
                    if !spec.path.starts_with('/') {
                        return Err(ConfigError::new(
                            index,
                            ErrorKind::RootPathNotAbsolute,
                            format!("root specifier must have an absolute path: {line}"),
                        ));
                    }
                    spec.path.clone()
                };

                // Children at the next level resolve against the join as
                // written, not the normalized form.
                parent_paths.truncate(column);
                parent_paths.push(resolved.clone());

                let normalized = normalize(&resolved, index, line)?;
                let pattern = glob::compile(&normalized, index)?;
                raw.push(CompiledRule::Specifier {
                    sign: spec.sign,
                    pattern,
                });
            }

            LineKind::SectionError => {
                return Err(ConfigError::new(
                    index,
                    ErrorKind::UnrecognizedSection,
                    format!("unrecognized config section: {line}"),
                ));
            }
            LineKind::SpecifierError => {
                return Err(ConfigError::new(
                    index,
                    ErrorKind::MalformedSpecifier,
                    format!("error in specifier: {line}"),
                ));
            }
            LineKind::MiscError => {
                return Err(ConfigError::new(
                    index,
                    ErrorKind::UnrecognizedLine,
                    format!("unrecognized config line: {line}"),
                ));
            }
        }
    }

    Ok(PolicySet::new(merge_overrides(raw)))
}

/// Drops `.` components and resolves `..` against the accumulated prefix.
/// The input is absolute by the time it gets here.
fn normalize(path: &str, index: usize, line: &str) -> Result<String, ConfigError> {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if parts.pop().is_none() {
                    return Err(ConfigError::new(
                        index,
                        ErrorKind::PathEscapesRoot,
                        format!("badly formed path, cannot resolve the parent of root: {line}"),
                    ));
                }
            }
            component => parts.push(component),
        }
    }

    // A specifier must name something below the root; a bare `/` would
    // compile into a rule covering the entire filesystem.
    if parts.is_empty() {
        return Err(ConfigError::new(
            index,
            ErrorKind::PathEscapesRoot,
            format!("path resolves to the filesystem root: {line}"),
        ));
    }

    Ok(format!("/{}", parts.join("/")))
}

/// Relocates `[override]` specifiers, sign-flipped, to the end of the rule
/// list. The compiled policy ends with the implicit `[noaccess]` pair, so
/// an override that follows it can reopen exactly the paths it names.
fn merge_overrides(rules: Vec<CompiledRule>) -> Vec<CompiledRule> {
    let mut merged = Vec::with_capacity(rules.len());
    let mut overrides = Vec::new();
    let mut in_override = false;

    for rule in rules {
        match rule {
            CompiledRule::SectionHeader(section) => {
                in_override = section == ConfigSection::Override;
                if !in_override {
                    merged.push(CompiledRule::SectionHeader(section));
                }
            }
            CompiledRule::Specifier { sign, pattern } if in_override => {
                overrides.push(CompiledRule::Specifier {
                    sign: sign.flipped(),
                    pattern,
                });
            }
            rule => merged.push(rule),
        }
    }

    merged.extend(overrides);
    merged
}
