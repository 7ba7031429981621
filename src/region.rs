//! Hetzner Object Storage locations and their S3-compatible endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ProviderError;

/// Hetzner Object Storage location.
///
/// Hetzner exposes three regional endpoints. The codes are passed through to
/// the S3 client as its region even though they are not AWS regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HetznerRegion {
    /// Falkenstein, Germany.
    Fsn1,
    /// Nuremberg, Germany.
    Nbg1,
    /// Helsinki, Finland.
    Hel1,
}

impl HetznerRegion {
    /// The lowercase region code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fsn1 => "fsn1",
            Self::Nbg1 => "nbg1",
            Self::Hel1 => "hel1",
        }
    }

    /// The HTTPS base endpoint for this location.
    pub const fn endpoint(&self) -> &'static str {
        match self {
            Self::Fsn1 => "https://fsn1.your-objectstorage.com",
            Self::Nbg1 => "https://nbg1.your-objectstorage.com",
            Self::Hel1 => "https://hel1.your-objectstorage.com",
        }
    }

    /// The endpoint hostname without the scheme, used for virtual-hosted URLs.
    pub fn endpoint_host(&self) -> &'static str {
        self.endpoint().trim_start_matches("https://")
    }
}

impl fmt::Display for HetznerRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HetznerRegion {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fsn1" => Ok(Self::Fsn1),
            "nbg1" => Ok(Self::Nbg1),
            "hel1" => Ok(Self::Hel1),
            other => Err(ProviderError::UnsupportedRegion(other.to_string())),
        }
    }
}
