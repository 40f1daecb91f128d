use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)+)").expect("version pattern compiles"));

/// Oldest engine release that supports `exec`.
pub const MINIMUM_EXEC_VERSION: [u64; 2] = [1, 4];

/// Dotted numeric engine version. Missing trailing components compare as zero,
/// so `1.4` and `1.4.0` are equal.
#[derive(Debug, Clone)]
pub struct DockerVersion {
    components: Vec<u64>,
}

impl DockerVersion {
    pub fn new(components: &[u64]) -> Self {
        Self {
            components: components.to_vec(),
        }
    }

    pub fn minimum_for_exec() -> Self {
        Self::new(&MINIMUM_EXEC_VERSION)
    }

    /// Extracts the first dotted number from engine output such as
    /// `24.0.5`, `17.03.1-ce` or `Docker version 1.3.3, build d344625`.
    pub fn parse(text: &str) -> Option<Self> {
        let found = VERSION_PATTERN.find(text)?;
        let components = found
            .as_str()
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        Some(Self { components })
    }

    pub fn is_older_than(&self, other: &DockerVersion) -> bool {
        self < other
    }

    pub fn components(&self) -> &[u64] {
        &self.components
    }
}

impl PartialEq for DockerVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DockerVersion {}

impl PartialOrd for DockerVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DockerVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for idx in 0..len {
            let left = self.components.get(idx).copied().unwrap_or(0);
            let right = other.components.get(idx).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl fmt::Display for DockerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}
