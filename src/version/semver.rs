use std::cmp::Ordering;

use semver::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareResult {
    Latest,
    Outdated,
    Newer,
    Invalid,
}

impl From<Ordering> for CompareResult {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => CompareResult::Outdated,
            Ordering::Equal => CompareResult::Latest,
            Ordering::Greater => CompareResult::Newer,
        }
    }
}

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// A leading 'v' is accepted.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let version = version.trim().trim_start_matches('v');
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Compare the installed version against the latest advertised one
///
/// SemVer strings are compared with `semver`. Anything else (four-part
/// versions, "2.0beta1") goes through a loose dotted comparison.
pub fn compare_versions(current: &str, latest: &str) -> CompareResult {
    if let (Some(current), Some(latest)) = (parse_version(current), parse_version(latest)) {
        return current.cmp(&latest).into();
    }

    match (loose_parts(current), loose_parts(latest)) {
        (Some(current), Some(latest)) => compare_loose(&current, &latest).into(),
        _ => CompareResult::Invalid,
    }
}

/// True when `candidate` is newer than `current`
pub fn is_update_available(current: &str, candidate: &str) -> bool {
    compare_versions(current, candidate) == CompareResult::Outdated
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Number(u64),
    Label(String),
}

/// Splits "1.0.0-rc1" into [1, 0, 0, rc, 1]. Separators are `.`, `-`, `_`
/// and `+`; a change between digits and letters also starts a new part.
fn loose_parts(version: &str) -> Option<Vec<Part>> {
    let version = version.trim();
    if version.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let flush = |current: &mut String, parts: &mut Vec<Part>| {
        if current.is_empty() {
            return;
        }
        let part = match current.parse::<u64>() {
            Ok(number) => Part::Number(number),
            Err(_) => Part::Label(std::mem::take(current)),
        };
        current.clear();
        parts.push(part);
    };

    for ch in version.chars() {
        if matches!(ch, '.' | '-' | '_' | '+') {
            flush(&mut current, &mut parts);
            continue;
        }
        if let Some(last) = current.chars().last()
            && last.is_ascii_digit() != ch.is_ascii_digit()
        {
            flush(&mut current, &mut parts);
        }
        current.push(ch);
    }
    flush(&mut current, &mut parts);

    if parts.iter().any(|part| matches!(part, Part::Number(_))) {
        Some(parts)
    } else {
        None
    }
}

/// Rank of a label; a plain number ranks between "RC" and "pl"
fn label_rank(label: &str) -> i32 {
    match label {
        "dev" => 0,
        "alpha" | "a" => 1,
        "beta" | "b" => 2,
        "RC" | "rc" => 3,
        "#" => 4,
        "pl" | "p" => 5,
        _ => -6,
    }
}

fn part_rank(part: &Part) -> i32 {
    match part {
        Part::Number(_) => label_rank("#"),
        Part::Label(label) => label_rank(label),
    }
}

fn compare_loose(left: &[Part], right: &[Part]) -> Ordering {
    let mut left = left.iter();
    let mut right = right.iter();

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(Part::Number(a)), Some(Part::Number(b))) => a.cmp(b),
            (Some(a), Some(b)) => part_rank(a).cmp(&part_rank(b)),
            // "1.0" < "1.0.1", but "1.0" > "1.0rc1"
            (Some(Part::Number(_)), None) => Ordering::Greater,
            (Some(a), None) => part_rank(a).cmp(&label_rank("#")),
            (None, Some(Part::Number(_))) => Ordering::Less,
            (None, Some(b)) => label_rank("#").cmp(&part_rank(b)),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}
