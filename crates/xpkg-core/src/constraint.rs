//! Version constraint parsing
//!
//! Package constraints are written in the range syntax common to the
//! Crossplane ecosystem: comparators may carry a leading `v`, may be
//! separated by spaces or commas, and alternatives are joined with `||`.
//! A bare version means an exact match. Each alternative is normalized
//! into a [`semver::VersionReq`].

use semver::{Version, VersionReq};

/// A parsed version constraint: a set of alternatives, any of which may match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    alternatives: Vec<VersionReq>,
}

impl Constraint {
    /// Parse a constraint expression
    pub fn parse(expr: &str) -> Result<Self, semver::Error> {
        let alternatives = expr
            .split("||")
            .map(|alt| VersionReq::parse(&normalize(alt)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }

    pub fn alternatives(&self) -> &[VersionReq] {
        &self.alternatives
    }
}

/// Parse a version that may carry a leading `v`
pub fn parse_version(version: &str) -> Result<Version, semver::Error> {
    Version::parse(strip_v(version.trim()))
}

const OPERATORS: &[&str] = &[">=", "<=", "!=", ">", "<", "=", "~>", "~", "^"];

fn normalize(alt: &str) -> String {
    let tokens: Vec<&str> = alt
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    // `a - b` hyphen range
    if let [low, "-", high] = tokens.as_slice() {
        return format!(">={}, <={}", strip_v(low), strip_v(high));
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in tokens {
        if OPERATORS.contains(&token) {
            pending_op = Some(token);
            continue;
        }
        let (op, version) = match pending_op.take() {
            Some(op) => (op, token),
            None => split_operator(token),
        };
        comparators.push(comparator(op, strip_v(version)));
    }

    if let Some(op) = pending_op {
        // Dangling operator; leave it for semver to reject
        comparators.push(op.to_string());
    }

    comparators.join(", ")
}

fn split_operator(token: &str) -> (&str, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (*op, rest);
        }
    }
    ("", token)
}

fn comparator(op: &str, version: &str) -> String {
    match op {
        "~>" => format!("~{}", version),
        "" if is_wildcard(version) => version.to_string(),
        "" => format!("={}", version),
        _ => format!("{}{}", op, version),
    }
}

fn is_wildcard(version: &str) -> bool {
    version
        .split('.')
        .any(|part| matches!(part, "*" | "x" | "X"))
}

fn strip_v(version: &str) -> &str {
    match version.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => version,
    }
}
