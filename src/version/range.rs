//! Version range expressions
//!
//! Shorthand expressions are rewritten step by step into plain comparator
//! clauses and then parsed into a [`CanonicalRange`]:
//! - `*` becomes `x`
//! - `1.2.3 - 1.4.0` becomes `>=1.2.3 <=1.4.0`
//! - `~1.2.3` becomes `>=1.2.3 <1.3.0`
//! - `^1.2.3` becomes `>=1.2.3 <2.0.0`
//! - `18` becomes `18.x.x`, `>=18.1` becomes `>=18.1.x`
//!
//! Clauses separated by whitespace are joined with AND. Disjunction (`||`)
//! is rejected.

use crate::error::ResolveError;
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};
use std::fmt;
use std::sync::LazyLock;

static HYPHEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9xX]+(?:\.[^\s]+)?)\s+-\s+([0-9xX]+(?:\.[^\s]+)?)").unwrap()
});
static PARTIAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(!=|>=|<=|=|>|<)?([0-9xX]+(?:\.[0-9xX]+)?)$").unwrap());
static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(!=|>=|<=|=|>|<)?(.+)$").unwrap());

/// Comparison operator of a single clause
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Op {
    fn parse(prefix: Option<&str>) -> Self {
        match prefix {
            Some("!=") => Op::Ne,
            Some(">=") => Op::Gte,
            Some("<=") => Op::Lte,
            Some(">") => Op::Gt,
            Some("<") => Op::Lt,
            _ => Op::Eq,
        }
    }
}

/// A single normalized predicate over a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparator {
    /// Matches every version
    Any,
    Exact(Version),
    NotEqual(Version),
    Greater(Version),
    GreaterOrEqual(Version),
    Less(Version),
    LessOrEqual(Version),
    /// `low <= v < high`
    Within { low: Version, high: Version },
    /// `v < low || v >= high`
    Outside { low: Version, high: Version },
}

impl Comparator {
    /// Check whether a version satisfies this comparator
    pub fn matches(&self, version: &Version) -> bool {
        match self {
            Comparator::Any => true,
            Comparator::Exact(v) => version == v,
            Comparator::NotEqual(v) => version != v,
            Comparator::Greater(v) => version > v,
            Comparator::GreaterOrEqual(v) => version >= v,
            Comparator::Less(v) => version < v,
            Comparator::LessOrEqual(v) => version <= v,
            Comparator::Within { low, high } => version >= low && version < high,
            Comparator::Outside { low, high } => version < low || version >= high,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Any => write!(f, "*"),
            Comparator::Exact(v) => write!(f, "={}", v),
            Comparator::NotEqual(v) => write!(f, "!={}", v),
            Comparator::Greater(v) => write!(f, ">{}", v),
            Comparator::GreaterOrEqual(v) => write!(f, ">={}", v),
            Comparator::Less(v) => write!(f, "<{}", v),
            Comparator::LessOrEqual(v) => write!(f, "<={}", v),
            Comparator::Within { low, high } => write!(f, ">={} <{}", low, high),
            Comparator::Outside { low, high } => write!(f, "<{} || >={}", low, high),
        }
    }
}

/// Normalized conjunction of comparators built from a shorthand expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRange {
    comparators: Vec<Comparator>,
}

impl CanonicalRange {
    /// Parse a shorthand range expression
    pub fn parse(expression: &str) -> Result<Self, ResolveError> {
        let expanded = expand(expression)?;
        let comparators = expanded
            .split_whitespace()
            .map(|clause| parse_clause(expression, clause))
            .collect::<Result<Vec<_>, _>>()?;

        if comparators.is_empty() {
            return Err(ResolveError::malformed(expression, "empty expression"));
        }

        Ok(Self { comparators })
    }

    /// Check whether a version satisfies every clause
    pub fn matches(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.matches(version))
    }

}

impl fmt::Display for CanonicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, comparator) in self.comparators.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", comparator)?;
        }
        Ok(())
    }
}

/// Rewrite a shorthand expression into space-separated comparator clauses
/// whose versions are all full (possibly wildcard) triples.
pub fn expand(expression: &str) -> Result<String, ResolveError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::malformed(expression, "empty expression"));
    }
    if trimmed.contains("||") {
        return Err(ResolveError::malformed(
            expression,
            "disjunctive ranges are not supported",
        ));
    }

    let starred = trimmed.replace('*', "x");
    let hyphenated = HYPHEN_RE.replace_all(&starred, ">=$1 <=$2");
    let bounded = expand_tilde_caret(expression, &hyphenated)?;
    Ok(expand_partials(&bounded))
}

fn expand_tilde_caret(expression: &str, text: &str) -> Result<String, ResolveError> {
    let mut clauses = Vec::new();

    for part in text.split_whitespace() {
        if let Some(operand) = part.strip_prefix('~') {
            // ~18.1.2 is >=18.1.2 <18.2.0
            let floor = parse_operand(expression, operand)?;
            clauses.push(format!(">={}", operand));
            clauses.push(format!("<{}.{}.0", floor.major, successor(expression, floor.minor)?));
        } else if let Some(operand) = part.strip_prefix('^') {
            // ^18.1.2 is >=18.1.2 <19.0.0
            let floor = parse_operand(expression, operand)?;
            clauses.push(format!(">={}", operand));
            clauses.push(format!("<{}.0.0", successor(expression, floor.major)?));
        } else {
            clauses.push(part.to_string());
        }
    }

    Ok(clauses.join(" "))
}

fn expand_partials(text: &str) -> String {
    text.split_whitespace()
        .map(|clause| match PARTIAL_RE.captures(clause) {
            Some(caps) => {
                let op = caps.get(1).map_or("", |m| m.as_str());
                let version = &caps[2];
                if version.contains('.') {
                    format!("{}{}.x", op, version)
                } else {
                    format!("{}{}.x.x", op, version)
                }
            }
            None => clause.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Next value of a version component; `u64::MAX` has none
fn successor(expression: &str, component: u64) -> Result<u64, ResolveError> {
    component.checked_add(1).ok_or_else(|| {
        ResolveError::malformed(expression, format!("version component {} is too large", component))
    })
}

/// Lower bound of a tilde or caret operand; missing or wildcard components count as zero
fn parse_operand(expression: &str, operand: &str) -> Result<Version, ResolveError> {
    let partial = PartialVersion::parse(expression, operand, false)?;
    let major = partial.major.ok_or_else(|| {
        ResolveError::malformed(expression, format!("'{}' needs a numeric major version", operand))
    })?;
    Ok(Version::new(
        major,
        partial.minor.unwrap_or(0),
        partial.patch.unwrap_or(0),
    ))
}

fn parse_clause(expression: &str, clause: &str) -> Result<Comparator, ResolveError> {
    let caps = CLAUSE_RE
        .captures(clause)
        .ok_or_else(|| ResolveError::malformed(expression, format!("invalid clause '{}'", clause)))?;
    let op = Op::parse(caps.get(1).map(|m| m.as_str()));
    let partial = PartialVersion::parse(expression, &caps[2], true)?;

    let (low, high) = match partial.bounds(expression)? {
        Bounds::Exact(version) => {
            return Ok(match op {
                Op::Eq => Comparator::Exact(version),
                Op::Ne => Comparator::NotEqual(version),
                Op::Gt => Comparator::Greater(version),
                Op::Gte => Comparator::GreaterOrEqual(version),
                Op::Lt => Comparator::Less(version),
                Op::Lte => Comparator::LessOrEqual(version),
            });
        }
        Bounds::Unbounded => {
            return match op {
                Op::Eq | Op::Gte | Op::Lte => Ok(Comparator::Any),
                _ => Err(ResolveError::malformed(
                    expression,
                    format!("'{}' can never match", clause),
                )),
            };
        }
        Bounds::Band { low, high } => (low, high),
    };

    // 1.2.x is the band [1.2.0, 1.3.0)
    Ok(match op {
        Op::Eq => Comparator::Within { low, high },
        Op::Ne => Comparator::Outside { low, high },
        Op::Gt => Comparator::GreaterOrEqual(high),
        Op::Gte => Comparator::GreaterOrEqual(low),
        Op::Lt => Comparator::Less(low),
        Op::Lte => Comparator::Less(high),
    })
}

enum Bounds {
    Exact(Version),
    Band { low: Version, high: Version },
    Unbounded,
}

/// Dotted version where `None` components are wildcards or absent
#[derive(Debug)]
struct PartialVersion {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    pre: Prerelease,
}

impl PartialVersion {
    /// Parse `N[.N[.N]][-pre][+build]`; `full` requires exactly three components.
    fn parse(expression: &str, text: &str, full: bool) -> Result<Self, ResolveError> {
        let malformed = |message: String| ResolveError::malformed(expression, message);

        let without_build = text.split_once('+').map_or(text, |(core, _)| core);
        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => {
                let pre = Prerelease::new(pre)
                    .map_err(|e| malformed(format!("invalid pre-release in '{}': {}", text, e)))?;
                (core, pre)
            }
            None => (without_build, Prerelease::EMPTY),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 || (full && parts.len() != 3) {
            return Err(malformed(format!("'{}' is not a major.minor.patch version", text)));
        }

        let mut components = [None; 3];
        let mut wildcard_seen = false;
        for (slot, part) in components.iter_mut().zip(&parts) {
            if part.eq_ignore_ascii_case("x") {
                wildcard_seen = true;
                continue;
            }
            if wildcard_seen {
                return Err(malformed(format!("'{}' has a number after a wildcard", text)));
            }
            let number = part
                .parse::<u64>()
                .map_err(|_| malformed(format!("invalid number '{}' in '{}'", part, text)))?;
            *slot = Some(number);
        }

        if wildcard_seen && !pre.is_empty() {
            return Err(malformed(format!("'{}' mixes a wildcard with a pre-release", text)));
        }

        let [major, minor, patch] = components;
        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }

    fn bounds(&self, expression: &str) -> Result<Bounds, ResolveError> {
        Ok(match (self.major, self.minor, self.patch) {
            (Some(major), Some(minor), Some(patch)) => Bounds::Exact(Version {
                major,
                minor,
                patch,
                pre: self.pre.clone(),
                build: BuildMetadata::EMPTY,
            }),
            (Some(major), Some(minor), None) => Bounds::Band {
                low: Version::new(major, minor, 0),
                high: Version::new(major, successor(expression, minor)?, 0),
            },
            (Some(major), None, _) => Bounds::Band {
                low: Version::new(major, 0, 0),
                high: Version::new(successor(expression, major)?, 0, 0),
            },
            (None, _, _) => Bounds::Unbounded,
        })
    }
}
