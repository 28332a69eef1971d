use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::classify::Delta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl Level {
    pub fn label(self) -> &'static str {
        match self {
            Level::High => "High",
            Level::Medium => "Medium",
            Level::Low => "Low",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "Content", alias = "CONTENT")]
    Content,
    #[serde(alias = "Entities", alias = "ENTITIES")]
    Entities,
    #[serde(alias = "Gaps", alias = "GAPS")]
    Gaps,
    #[serde(alias = "Structure", alias = "STRUCTURE")]
    Structure,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Content,
        Category::Entities,
        Category::Gaps,
        Category::Structure,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Content => "content",
            Category::Entities => "entities",
            Category::Gaps => "gaps",
            Category::Structure => "structure",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::Content => "Content Optimization",
            Category::Entities => "Entity Relationships",
            Category::Gaps => "Content Gaps",
            Category::Structure => "Structural Improvements",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Category::ALL.into_iter().find(|category| category.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Week,
    Month,
    Quarter,
}

impl Timeframe {
    pub fn key(self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Quarter => "quarter",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::Week => "Last 7 days",
            Timeframe::Month => "Last 30 days",
            Timeframe::Quarter => "Last 90 days",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        [Timeframe::Week, Timeframe::Month, Timeframe::Quarter]
            .into_iter()
            .find(|timeframe| timeframe.key() == key)
    }
}

/// Rank of a query in an assistant's answer. `Unranked` is a distinct
/// variant and never takes part in numeric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Ranked(u32),
    Unranked,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub position: Position,
    pub change: Delta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPerformance {
    pub score: f64,
    pub change: Delta,
    pub metrics: BTreeMap<String, f64>,
    pub queries: Vec<QueryResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub title: String,
    pub description: String,
    pub change: Delta,
    pub impact: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub id: u32,
    pub date: NaiveDate,
    pub title: String,
    pub summary: String,
    pub insights: Vec<Insight>,
    pub performance: ProductPerformance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub id: u32,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub priority: Level,
    pub difficulty: Level,
    pub impact_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub score: f64,
}

/// Headline numbers for the stats dashboard over one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub timeframe: Timeframe,
    pub visibility_score: f64,
    pub visibility_change: Delta,
    pub mentions: u32,
    pub mentions_change: Delta,
    pub average_position: f64,
    pub position_change: Delta,
    pub share_of_voice: f64,
    pub share_change: Delta,
    pub trend: Vec<TrendPoint>,
    pub metrics: BTreeMap<String, f64>,
    pub top_queries: Vec<QueryResult>,
}
