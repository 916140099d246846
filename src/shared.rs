use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Autonomous system number. Path tokens are validated as numeric before
/// they become an `ASN`, so values are never compared other than by equality
/// and ordering.
pub type ASN = u32;

/// Directed relationship label of the entry `graph[a][b]`.
///
/// `CustomerToProvider` means `a` is a customer of `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Relationship {
    CustomerToProvider = 1,
    ProviderToCustomer = 2,
    PeerToPeer = 3,
    SiblingToSibling = 4,
}

impl Relationship {
    pub const ALL: [Relationship; 4] = [
        Relationship::CustomerToProvider,
        Relationship::ProviderToCustomer,
        Relationship::PeerToPeer,
        Relationship::SiblingToSibling,
    ];

    /// Label of the mirrored entry `graph[b][a]`.
    pub fn invert(&self) -> Self {
        match self {
            Relationship::CustomerToProvider => Relationship::ProviderToCustomer,
            Relationship::ProviderToCustomer => Relationship::CustomerToProvider,
            Relationship::PeerToPeer => Relationship::PeerToPeer,
            Relationship::SiblingToSibling => Relationship::SiblingToSibling,
        }
    }

    pub fn is_symmetric(&self) -> bool {
        matches!(self, Relationship::PeerToPeer | Relationship::SiblingToSibling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::CustomerToProvider => "c2p",
            Relationship::ProviderToCustomer => "p2c",
            Relationship::PeerToPeer => "p2p",
            Relationship::SiblingToSibling => "s2s",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c2p" => Ok(Relationship::CustomerToProvider),
            "p2c" => Ok(Relationship::ProviderToCustomer),
            "p2p" => Ok(Relationship::PeerToPeer),
            "s2s" => Ok(Relationship::SiblingToSibling),
            other => Err(other.to_string()),
        }
    }
}

/// Hierarchy tier, listed in peeling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum TierLabel {
    Stub = 0,
    RegionalIsp = 1,
    DenseCore = 2,
    TransitCore = 3,
    OuterCore = 4,
}

impl TierLabel {
    pub const ALL: [TierLabel; 5] = [
        TierLabel::Stub,
        TierLabel::RegionalIsp,
        TierLabel::DenseCore,
        TierLabel::TransitCore,
        TierLabel::OuterCore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TierLabel::Stub => "stub",
            TierLabel::RegionalIsp => "regional ISP",
            TierLabel::DenseCore => "dense core",
            TierLabel::TransitCore => "transit core",
            TierLabel::OuterCore => "outer core",
        }
    }
}

impl fmt::Display for TierLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TierLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TierLabel::ALL
            .iter()
            .copied()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Failures of the inference core. All of them mean an earlier stage was
/// skipped or fed a different corpus; the run is aborted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InferenceError {
    #[error("AS {asn} has no node degree; the neighbor index was not built from this corpus")]
    MissingDegree { asn: ASN },
    #[error("no relationship recorded for AS {from} -> AS {to}; annotation must run before peering")]
    MissingRelationship { from: ASN, to: ASN },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid transit count threshold {0:?}: expected a non-negative integer")]
    InvalidThreshold(String),
    #[error("invalid degree size ratio {0:?}: expected a finite number greater than 1")]
    InvalidRatio(String),
    #[error("invalid top-k {0:?}: expected a positive integer")]
    InvalidTopK(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file error: {0}")]
    Json(#[from] serde_json::Error),
}
