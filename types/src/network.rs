//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies which SDUPI network a node belongs to.
///
/// Carried in every peer message header; messages for another network are dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Live,
    /// The public test network.
    Test,
    /// Local development network.
    #[default]
    Dev,
}

impl NetworkId {
    /// Default peer port for this network.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Live => 8545,
            Self::Test => 18545,
            Self::Dev => 28545,
        }
    }

    /// Fixed genesis timestamp (Unix ms) for this network.
    pub fn genesis_timestamp_ms(&self) -> u64 {
        match self {
            Self::Live => 1_704_067_200_000,
            Self::Test => 1_701_388_800_000,
            Self::Dev => 1_700_000_000_000,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "test" => Ok(Self::Test),
            "dev" => Ok(Self::Dev),
            other => Err(format!("unknown network: {other}")),
        }
    }
}
