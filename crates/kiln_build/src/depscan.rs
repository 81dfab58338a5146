//! Dependency extraction through the compiler's `-MM` mode.
//!
//! The compiler prints a make rule for the unit:
//!
//! ```text
//! obj.o: src/a.c src/a.h \
//!   inc/util/list.h
//! ```
//!
//! The first prerequisite is the source itself, the rest is the transitive
//! closure of quoted includes. Dependency sets are recomputed on every run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::context::BuildContext;
use crate::discover::CompilationUnit;
use crate::error::BuildError;
use crate::toolchain::{ToolCommand, Toolchain};

/// The inputs a compilation unit's object file depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySet {
    /// The unit's own source file, as reported by the compiler.
    pub source: PathBuf,
    /// Every header reachable from the source, without duplicates.
    pub headers: Vec<PathBuf>,
}

impl DependencySet {
    /// Source followed by all headers.
    pub fn inputs(&self) -> Vec<&Path> {
        std::iter::once(self.source.as_path())
            .chain(self.headers.iter().map(PathBuf::as_path))
            .collect()
    }
}

/// Asks the compiler for the header closure of `unit`.
///
/// Runs `<cc> -MM <source> <cflags> <includes>` with captured output. A
/// non-zero exit is a [`BuildError::ToolInvocation`]; unparseable output is
/// a [`BuildError::DependencyParse`].
pub fn extract_dependencies(
    toolchain: &Toolchain<'_>,
    ctx: &BuildContext,
    unit: &CompilationUnit,
    cflags: &[String],
) -> Result<DependencySet, BuildError> {
    let command = ToolCommand::new(&ctx.toolchain.cc)
        .arg("-MM")
        .path_arg(&unit.source)
        .args(cflags.iter().cloned())
        .args(ctx.include_flags.iter().cloned());
    let output = toolchain.query(&command)?;
    let deps = parse_dependency_rule(&unit.source, &output.stdout)?;
    tracing::debug!(
        source = %unit.source.display(),
        headers = deps.headers.len(),
        "resolved dependency set"
    );
    Ok(deps)
}

/// Parses a make rule as printed by `-MM`.
///
/// Joins backslash line continuations, splits at the first `:` that is
/// followed by whitespace (so a `C:\` drive prefix in the target is not taken
/// for the separator), and honours `\ ` escapes inside paths. `file` only
/// labels errors.
pub fn parse_dependency_rule(file: &Path, output: &str) -> Result<DependencySet, BuildError> {
    let parse_error = |reason: &str| BuildError::DependencyParse {
        file: file.to_path_buf(),
        reason: reason.to_string(),
    };

    let joined = output.replace("\\\r\n", " ").replace("\\\n", " ");
    let separator = find_separator(&joined).ok_or_else(|| parse_error("missing ':' separator"))?;

    let mut prerequisites = split_prerequisites(&joined[separator + 1..]).into_iter();
    let source = prerequisites
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| parse_error("empty dependency list"))?;

    let mut seen = HashSet::new();
    seen.insert(source.clone());
    let headers = prerequisites
        .map(PathBuf::from)
        .filter(|header| seen.insert(header.clone()))
        .collect();

    Ok(DependencySet { source, headers })
}

/// Byte offset of the first `:` followed by whitespace or end of input.
fn find_separator(rule: &str) -> Option<usize> {
    let bytes = rule.as_bytes();
    bytes.iter().enumerate().find_map(|(i, &b)| {
        let at_boundary = bytes.get(i + 1).map_or(true, |next| next.is_ascii_whitespace());
        (b == b':' && at_boundary).then_some(i)
    })
}

/// Splits the right-hand side of a rule into paths.
fn split_prerequisites(rhs: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = rhs.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&' ') => {
                current.push(' ');
                chars.next();
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(output: &str) -> Result<DependencySet, BuildError> {
        parse_dependency_rule(Path::new("src/a.c"), output)
    }

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn single_line_rule() {
        let deps = parse("a.o: src/a.c src/a.h inc/util.h\n").unwrap();
        assert_eq!(deps.source, PathBuf::from("src/a.c"));
        assert_eq!(deps.headers, paths(&["src/a.h", "inc/util.h"]));
    }

    #[test]
    fn wrapped_rule_with_continuations() {
        let output = "a.o: src/a.c src/a.h \\\n  inc/LTK/containers.h \\\n  inc/LTK/threading.h\n";
        let deps = parse(output).unwrap();
        assert_eq!(
            deps.headers,
            paths(&["src/a.h", "inc/LTK/containers.h", "inc/LTK/threading.h"])
        );
    }

    #[test]
    fn crlf_continuations() {
        let output = "a.o: src/a.c \\\r\n  src/a.h \\\r\n  src/b.h\r\n";
        let deps = parse(output).unwrap();
        assert_eq!(deps.headers, paths(&["src/a.h", "src/b.h"]));
    }

    #[test]
    fn source_without_headers() {
        let deps = parse("b.o: src/b.c\n").unwrap();
        assert_eq!(deps.source, PathBuf::from("src/b.c"));
        assert!(deps.headers.is_empty());
        assert_eq!(deps.inputs(), vec![Path::new("src/b.c")]);
    }

    #[test]
    fn duplicates_are_removed_preserving_order() {
        let deps = parse("a.o: src/a.c x.h y.h x.h src/a.c z.h y.h").unwrap();
        assert_eq!(deps.headers, paths(&["x.h", "y.h", "z.h"]));
    }

    #[test]
    fn drive_letter_in_target_is_not_separator() {
        let deps = parse("C:\\build\\a.o: C:\\p\\src\\a.c C:\\p\\src\\a.h").unwrap();
        assert_eq!(deps.source, PathBuf::from("C:\\p\\src\\a.c"));
        assert_eq!(deps.headers, paths(&["C:\\p\\src\\a.h"]));
    }

    #[test]
    fn escaped_spaces_stay_in_path() {
        let deps = parse("a.o: src/a.c my\\ headers/a.h").unwrap();
        assert_eq!(deps.headers, paths(&["my headers/a.h"]));
    }

    #[test]
    fn no_colon_at_all_errors() {
        let err = parse("garbage output").unwrap_err();
        assert!(
            matches!(err, BuildError::DependencyParse { ref reason, .. } if reason.contains("separator"))
        );
    }

    #[test]
    fn empty_output_errors() {
        let err = parse("").unwrap_err();
        assert!(matches!(err, BuildError::DependencyParse { .. }));
    }

    #[test]
    fn empty_right_hand_side_errors() {
        let err = parse("a.o:   \\\n  \n").unwrap_err();
        assert!(
            matches!(err, BuildError::DependencyParse { ref reason, .. } if reason.contains("empty"))
        );
    }
}
