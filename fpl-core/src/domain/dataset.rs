//! Logical datasets and their load strategies.
//!
//! Each upstream table the pipeline lands is one `DatasetKind` variant. The
//! extraction capability of a variant lives in `crate::extract`, matched
//! exhaustively, so adding a dataset means adding a variant here and an arm
//! there.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A logical table extracted from the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Players,
    Positions,
    Teams,
    Gameweeks,
    Fixtures,
    GameweekLive,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        DatasetKind::Players,
        DatasetKind::Positions,
        DatasetKind::Teams,
        DatasetKind::Gameweeks,
        DatasetKind::Fixtures,
        DatasetKind::GameweekLive,
    ];

    /// Table name as used in config rows, landing paths and the audit ledger.
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Players => "players",
            DatasetKind::Positions => "positions",
            DatasetKind::Teams => "teams",
            DatasetKind::Gameweeks => "gameweeks",
            DatasetKind::Fixtures => "fixtures",
            DatasetKind::GameweekLive => "gameweek_live",
        }
    }

    /// Field of the bootstrap payload this dataset is sliced from, if any.
    pub fn bootstrap_field(self) -> Option<&'static str> {
        match self {
            DatasetKind::Players => Some("elements"),
            DatasetKind::Positions => Some("element_types"),
            DatasetKind::Teams => Some("teams"),
            DatasetKind::Gameweeks => Some("events"),
            DatasetKind::Fixtures | DatasetKind::GameweekLive => None,
        }
    }

    /// True when extraction cannot run without a gameweek.
    ///
    /// Full loads of these datasets are pinned to the current gameweek; every
    /// other dataset is fetched without a gameweek parameter on a full load.
    pub fn requires_sequence(self) -> bool {
        matches!(self, DatasetKind::GameweekLive)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no extractor for table '{0}'")]
pub struct UnknownDataset(pub String);

impl FromStr for DatasetKind {
    type Err = UnknownDataset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownDataset(s.to_string()))
    }
}

/// How a dataset is refreshed on each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Fresh snapshot of everything the endpoint returns.
    Full,
    /// Only gameweeks past the stored watermark.
    Incremental,
}

impl LoadStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadStrategy::Full => "full",
            LoadStrategy::Incremental => "incremental",
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown load type '{0}' (expected 'full' or 'incremental')")]
pub struct UnknownLoadStrategy(pub String);

impl FromStr for LoadStrategy {
    type Err = UnknownLoadStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(LoadStrategy::Full),
            "incremental" => Ok(LoadStrategy::Incremental),
            _ => Err(UnknownLoadStrategy(s.to_string())),
        }
    }
}
