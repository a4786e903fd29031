use serde::{Deserialize, Serialize};

/// Strategy that produced a match.
///
/// Variants are ordered by decreasing precision so that the least precise
/// method of several component matches is simply the maximum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Nothing in the tree was reachable
    #[default]
    None,
    /// Every node of the chosen signature matched the input
    Exact,
    /// Remaining nodes were numeric and scored by numeric distance
    Numeric,
    /// Remaining nodes were scored by character mismatches
    Closest,
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchMethod::None => write!(f, "none"),
            MatchMethod::Exact => write!(f, "exact"),
            MatchMethod::Numeric => write!(f, "numeric"),
            MatchMethod::Closest => write!(f, "closest"),
        }
    }
}

impl std::str::FromStr for MatchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(MatchMethod::None),
            "exact" => Ok(MatchMethod::Exact),
            "numeric" => Ok(MatchMethod::Numeric),
            "closest" => Ok(MatchMethod::Closest),
            _ => Err(format!("Invalid match method: {}", s)),
        }
    }
}
