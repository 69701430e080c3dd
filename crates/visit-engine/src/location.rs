//! Hierarchical prisoner locations and prefix matching.
//!
//! A prison location is a path of up to four levels (wing, landing, cell
//! block, cell), written as a dashed string such as `"A-1-100-1"`. A stored
//! group entry may give only the leading levels — `"A"` covers the whole wing,
//! `"A-1-100"` covers every cell under that landing.
//!
//! Transitional housing codes (court, temporary absence, reception, early
//! conditional release, cell swap) are not real cells. A prisoner currently
//! held at one of them is matched first against groups that target the
//! transitional code itself, then against their last known permanent cell.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of levels in a fully-specified location path.
pub const PATH_DEPTH: usize = 4;

/// A location path of 1–4 levels. Levels are packed: once a level is absent,
/// every deeper level is absent too.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocationPath {
    levels: [Option<String>; PATH_DEPTH],
}

impl LocationPath {
    /// Parse a dashed location string into a path.
    ///
    /// Returns `None` for the empty string and for strings with more than
    /// four segments or an empty segment — a malformed location resolves to
    /// no location at all, never to a partial one.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let segments: Vec<&str> = trimmed.split('-').collect();
        if segments.len() > PATH_DEPTH || segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        let mut levels: [Option<String>; PATH_DEPTH] = Default::default();
        for (i, segment) in segments.iter().enumerate() {
            levels[i] = Some((*segment).to_string());
        }
        Some(Self { levels })
    }

    /// Build a single-level path from a bare code (used for transitional
    /// housing codes such as `"TAP"`).
    pub fn single(code: &str) -> Self {
        let mut levels: [Option<String>; PATH_DEPTH] = Default::default();
        levels[0] = Some(code.to_string());
        Self { levels }
    }

    /// The level code at `index`, if present.
    pub fn level(&self, index: usize) -> Option<&str> {
        self.levels.get(index).and_then(|l| l.as_deref())
    }

    /// Prefix match: every level this path specifies must equal the
    /// candidate's level at the same depth. Exits at the first absent level,
    /// so `"A"` matches any candidate in wing A.
    pub fn matches(&self, candidate: &LocationPath) -> bool {
        for i in 0..PATH_DEPTH {
            match self.levels[i].as_deref() {
                Some(code) => {
                    if candidate.levels[i].as_deref() != Some(code) {
                        return false;
                    }
                }
                None => break,
            }
        }
        true
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.levels.iter().flatten().map(String::as_str).collect();
        write!(f, "{}", joined.join("-"))
    }
}

impl Serialize for LocationPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for LocationPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        LocationPath::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("malformed location path: {raw:?}")))
    }
}

/// Housing codes that mark a prisoner as away from any permanent cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionalType {
    Court,
    TemporaryAbsence,
    Reception,
    EarlyConditionalRelease,
    CellSwap,
}

impl TransitionalType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "COURT" => Some(Self::Court),
            "TAP" => Some(Self::TemporaryAbsence),
            "RECP" => Some(Self::Reception),
            "ECL" => Some(Self::EarlyConditionalRelease),
            "CSWAP" => Some(Self::CellSwap),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Court => "COURT",
            Self::TemporaryAbsence => "TAP",
            Self::Reception => "RECP",
            Self::EarlyConditionalRelease => "ECL",
            Self::CellSwap => "CSWAP",
        }
    }
}

/// Resolve a prisoner's raw location strings into the ordered list of paths
/// they are matched against.
///
/// - A permanent cell location yields exactly that path.
/// - A transitional location yields the transitional code first (so groups
///   that explicitly target it win), then the last known permanent cell.
/// - A missing or malformed current location yields no candidates: templates
///   with a location restriction will not match, unrestricted ones still do.
pub fn candidate_paths(current: Option<&str>, last_permanent: Option<&str>) -> Vec<LocationPath> {
    let Some(raw) = current else {
        return Vec::new();
    };
    let Some(path) = LocationPath::parse(raw) else {
        return Vec::new();
    };

    let transitional = path
        .level(0)
        .and_then(TransitionalType::from_code)
        .is_some();
    if !transitional {
        return vec![path];
    }

    let mut candidates = vec![path];
    if let Some(cell) = last_permanent.and_then(LocationPath::parse) {
        candidates.push(cell);
    }
    candidates
}
