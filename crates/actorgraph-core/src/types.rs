use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ActorId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "7d")]
    D7,
    #[serde(rename = "30d")]
    D30,
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::H24
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeWindow::H24 => "24h",
            TimeWindow::D7 => "7d",
            TimeWindow::D30 => "30d",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "24h" | "1d" => Ok(TimeWindow::H24),
            "7d" => Ok(TimeWindow::D7),
            "30d" => Ok(TimeWindow::D30),
            other => Err(format!("unknown time window: {}", other)),
        }
    }
}

/// Attribution confidence class of an actor record. Ordering matters:
/// verified evidence outranks attributed, which outranks behavioral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Verified,
    Attributed,
    Behavioral,
}

impl<'de> Deserialize<'de> for SourceTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(SourceTier::Behavioral))
    }
}

impl SourceTier {
    /// Weight used to dampen edge weights; the minimum of the two
    /// endpoint weights becomes the edge trust factor.
    pub fn trust_factor(&self) -> f64 {
        match self {
            SourceTier::Verified => 1.0,
            SourceTier::Attributed => 0.8,
            SourceTier::Behavioral => 0.5,
        }
    }
}

impl Default for SourceTier {
    fn default() -> Self {
        SourceTier::Behavioral
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceTier::Verified => "verified",
            SourceTier::Attributed => "attributed",
            SourceTier::Behavioral => "behavioral",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SourceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verified" => Ok(SourceTier::Verified),
            "attributed" => Ok(SourceTier::Attributed),
            // Unknown tiers get the lowest trust rather than an error.
            _ => Ok(SourceTier::Behavioral),
        }
    }
}

/// Serialized as its display string (`"whale"`, `"market_maker"`, the
/// raw string for `Other`); unknown strings deserialize to `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActorType {
    Whale,
    Exchange,
    MarketMaker,
    Fund,
    Bridge,
    Mixer,
    Bot,
    Other(String),
}

impl Serialize for ActorType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ActorType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse()
            .unwrap_or_else(|_| ActorType::Other(s.to_lowercase())))
    }
}

impl ActorType {
    /// Exchanges and market makers count as market venues for the
    /// direct-interaction evidence signal.
    pub fn is_market_venue(&self) -> bool {
        matches!(self, ActorType::Exchange | ActorType::MarketMaker)
    }
}

impl Default for ActorType {
    fn default() -> Self {
        ActorType::Other("unknown".to_string())
    }
}

impl fmt::Display for ActorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorType::Whale => "whale",
            ActorType::Exchange => "exchange",
            ActorType::MarketMaker => "market_maker",
            ActorType::Fund => "fund",
            ActorType::Bridge => "bridge",
            ActorType::Mixer => "mixer",
            ActorType::Bot => "bot",
            ActorType::Other(s) => s.as_str(),
        };
        write!(f, "{}", s)
    }
}

impl FromStr for ActorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whale" => Ok(ActorType::Whale),
            "exchange" => Ok(ActorType::Exchange),
            "market_maker" | "market-maker" => Ok(ActorType::MarketMaker),
            "fund" => Ok(ActorType::Fund),
            "bridge" => Ok(ActorType::Bridge),
            "mixer" => Ok(ActorType::Mixer),
            "bot" => Ok(ActorType::Bot),
            other => Ok(ActorType::Other(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Router,
    Accumulator,
    Distributor,
    Neutral,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorRole::Router => "ROUTER",
            ActorRole::Accumulator => "ACCUMULATOR",
            ActorRole::Distributor => "DISTRIBUTOR",
            ActorRole::Neutral => "NEUTRAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketRegime {
    Centralized,
    Distributed,
    Neutral,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketRegime::Centralized => "CENTRALIZED",
            MarketRegime::Distributed => "DISTRIBUTED",
            MarketRegime::Neutral => "NEUTRAL",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowDirection {
    #[serde(rename = "in-in")]
    InIn,
    #[serde(rename = "out-out")]
    OutOut,
    #[serde(rename = "in-out")]
    InOut,
    #[serde(rename = "bidirectional")]
    Bidirectional,
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowDirection::InIn => "in-in",
            FlowDirection::OutOut => "out-out",
            FlowDirection::InOut => "in-out",
            FlowDirection::Bidirectional => "bidirectional",
        };
        write!(f, "{}", s)
    }
}
