//! Regulatory framework catalog.
//!
//! The service scores progress against a closed set of frameworks. Using an
//! enum rather than free-form strings means an unknown framework identifier
//! is rejected at the boundary instead of silently producing an empty scope.

use serde::{Deserialize, Serialize};

/// A supported regulatory framework.
///
/// Serialized in snake_case to match the API contract (`"soc2"`,
/// `"iso27001"`, `"hipaa"`, `"gdpr"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// SOC 2 (Service Organization Control 2).
    Soc2,
    /// ISO/IEC 27001.
    Iso27001,
    /// HIPAA (Health Insurance Portability and Accountability Act).
    Hipaa,
    /// GDPR (General Data Protection Regulation).
    Gdpr,
}

impl Framework {
    /// All supported frameworks.
    pub fn all() -> &'static [Framework] {
        &[Self::Soc2, Self::Iso27001, Self::Hipaa, Self::Gdpr]
    }

    /// Return the string representation of this framework.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soc2 => "soc2",
            Self::Iso27001 => "iso27001",
            Self::Hipaa => "hipaa",
            Self::Gdpr => "gdpr",
        }
    }

    /// Parse a framework identifier. Matching is case-insensitive.
    ///
    /// Returns `None` for identifiers outside the catalog — callers map
    /// this to a scope-not-found error at the API boundary.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soc2" => Some(Self::Soc2),
            "iso27001" => Some(Self::Iso27001),
            "hipaa" => Some(Self::Hipaa),
            "gdpr" => Some(Self::Gdpr),
            _ => None,
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown framework: {s}"))
    }
}
