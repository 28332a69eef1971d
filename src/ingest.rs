//! Loading reports and recommendations from files.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::classify::Delta;
use crate::models::{
    Category, Insight, Level, Position, ProductPerformance, QueryResult, Recommendation, Report,
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid report data")]
    Json(#[from] serde_json::Error),
    #[error("invalid recommendation data")]
    Csv(#[from] csv::Error),
    #[error("{field} must be between 0 and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        max: f64,
    },
    #[error("query {query:?} has rank {rank}; ranks start at 1")]
    BadRank { query: String, rank: i64 },
    #[error("duplicate id {0}")]
    DuplicateId(u32),
    #[error("file contains no entries")]
    Empty,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawChange {
    Number(f64),
    Text(String),
}

impl From<RawChange> for Delta {
    fn from(raw: RawChange) -> Self {
        match raw {
            RawChange::Number(value) => Delta::points(value),
            RawChange::Text(text) => Delta::parse(&text),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Rank(i64),
    Label(String),
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    query: String,
    position: RawPosition,
    change: RawChange,
}

#[derive(Debug, Deserialize)]
struct RawPerformance {
    score: f64,
    change: RawChange,
    #[serde(default)]
    metrics: BTreeMap<String, f64>,
    #[serde(default)]
    queries: Vec<RawQuery>,
}

#[derive(Debug, Deserialize)]
struct RawInsight {
    title: String,
    description: String,
    change: RawChange,
    impact: Level,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    id: u32,
    date: NaiveDate,
    title: String,
    summary: String,
    #[serde(default)]
    insights: Vec<RawInsight>,
    performance: RawPerformance,
}

fn check_range(field: &str, value: f64, max: f64) -> Result<f64, IngestError> {
    if (0.0..=max).contains(&value) {
        Ok(value)
    } else {
        Err(IngestError::OutOfRange {
            field: field.to_string(),
            value,
            max,
        })
    }
}

fn position(query: &str, raw: RawPosition) -> Result<Position, IngestError> {
    let rank = match raw {
        RawPosition::Rank(rank) => rank,
        RawPosition::Label(label) => match label.trim().trim_start_matches('#').parse::<i64>() {
            Ok(rank) => rank,
            Err(_) => return Ok(Position::Unranked),
        },
    };
    u32::try_from(rank)
        .ok()
        .filter(|rank| *rank >= 1)
        .map(Position::Ranked)
        .ok_or_else(|| IngestError::BadRank {
            query: query.to_string(),
            rank,
        })
}

fn convert_report(raw: RawReport) -> Result<Report, IngestError> {
    let mut metrics = BTreeMap::new();
    for (key, value) in raw.performance.metrics {
        let value = check_range(&format!("metric {key}"), value, 100.0)?;
        metrics.insert(key, value);
    }

    let queries = raw
        .performance
        .queries
        .into_iter()
        .map(|q| {
            let position = position(&q.query, q.position)?;
            Ok(QueryResult {
                query: q.query,
                position,
                change: q.change.into(),
            })
        })
        .collect::<Result<Vec<_>, IngestError>>()?;

    Ok(Report {
        id: raw.id,
        date: raw.date,
        title: raw.title,
        summary: raw.summary,
        insights: raw
            .insights
            .into_iter()
            .map(|i| Insight {
                title: i.title,
                description: i.description,
                change: i.change.into(),
                impact: i.impact,
            })
            .collect(),
        performance: ProductPerformance {
            score: check_range("performance score", raw.performance.score, 100.0)?,
            change: raw.performance.change.into(),
            metrics,
            queries,
        },
    })
}

pub fn parse_reports(json: &str) -> Result<Vec<Report>, IngestError> {
    let raw: Vec<RawReport> = serde_json::from_str(json)?;
    if raw.is_empty() {
        return Err(IngestError::Empty);
    }

    let mut seen = HashSet::new();
    let mut reports = Vec::with_capacity(raw.len());
    for entry in raw {
        if !seen.insert(entry.id) {
            return Err(IngestError::DuplicateId(entry.id));
        }
        reports.push(convert_report(entry)?);
    }
    Ok(reports)
}

pub fn load_reports(path: &Path) -> Result<Vec<Report>, IngestError> {
    let json = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reports = parse_reports(&json)?;
    info!(path = %path.display(), count = reports.len(), "loaded reports");
    Ok(reports)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    id: u32,
    category: Category,
    title: String,
    description: String,
    priority: Level,
    difficulty: Level,
    impact_score: f64,
}

pub fn read_recommendations<R: Read>(reader: R) -> Result<Vec<Recommendation>, IngestError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut recommendations = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        if !seen.insert(row.id) {
            return Err(IngestError::DuplicateId(row.id));
        }
        recommendations.push(Recommendation {
            id: row.id,
            category: row.category,
            title: row.title,
            description: row.description,
            priority: row.priority,
            difficulty: row.difficulty,
            impact_score: check_range("impact_score", row.impact_score, 10.0)?,
        });
    }

    if recommendations.is_empty() {
        return Err(IngestError::Empty);
    }
    debug!(count = recommendations.len(), "parsed recommendations");
    Ok(recommendations)
}

pub fn load_recommendations(path: &Path) -> Result<Vec<Recommendation>, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let recommendations = read_recommendations(file)?;
    info!(path = %path.display(), count = recommendations.len(), "loaded recommendations");
    Ok(recommendations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ChangeClass;
    use std::io::Write;

    const REPORTS: &str = r#"[
        {
            "id": 1,
            "date": "2025-03-17",
            "title": "Weekly AI Visibility Report",
            "summary": "Up and to the right.",
            "insights": [
                {"title": "Gain", "description": "More citations", "change": "+12%", "impact": "High"},
                {"title": "Loss", "description": "Fewer mentions", "change": -3, "impact": "low"}
            ],
            "performance": {
                "score": 78,
                "change": 5,
                "metrics": {"visibility": 74, "entityRelations": 62},
                "queries": [
                    {"query": "best tool", "position": 2, "change": 1},
                    {"query": "niche tool", "position": "Not in top 10", "change": 0}
                ]
            }
        }
    ]"#;

    #[test]
    fn reports_normalize_changes_and_positions() {
        let reports = parse_reports(REPORTS).unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.insights[0].change.direction(), ChangeClass::Positive);
        assert_eq!(report.insights[1].change.direction(), ChangeClass::Negative);
        assert_eq!(report.performance.queries[0].position, Position::Ranked(2));
        assert_eq!(report.performance.queries[1].position, Position::Unranked);
        assert_eq!(report.performance.metrics["entityRelations"], 62.0);
    }

    #[test]
    fn zero_rank_is_rejected() {
        let json = REPORTS.replace("\"position\": 2", "\"position\": 0");
        let err = parse_reports(&json).unwrap_err();
        assert!(matches!(err, IngestError::BadRank { rank: 0, .. }));
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let json = REPORTS.replace("\"score\": 78", "\"score\": 140");
        let err = parse_reports(&json).unwrap_err();
        assert!(matches!(err, IngestError::OutOfRange { .. }));
    }

    #[test]
    fn empty_report_list_is_rejected() {
        assert!(matches!(parse_reports("[]"), Err(IngestError::Empty)));
    }

    #[test]
    fn recommendations_load_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "id,category,title,description,priority,difficulty,impact_score\n\
             1,content,Add answers,Lead with the answer,High,Low,8.5\n\
             2,Gaps,Cover setup,Write setup guides,medium,high,9.2"
        )
        .unwrap();

        let recs = load_recommendations(file.path()).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[1].category, Category::Gaps);
        assert_eq!(recs[1].difficulty, Level::High);
    }

    #[test]
    fn duplicate_recommendation_ids_are_rejected() {
        let csv = "id,category,title,description,priority,difficulty,impact_score\n\
                   1,content,A,a,High,Low,5\n\
                   1,gaps,B,b,Low,Low,5\n";
        let err = read_recommendations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::DuplicateId(1)));
    }

    #[test]
    fn impact_above_ten_is_rejected() {
        let csv = "id,category,title,description,priority,difficulty,impact_score\n\
                   1,content,A,a,High,Low,11\n";
        let err = read_recommendations(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::OutOfRange { .. }));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = load_reports(Path::new("/nonexistent/reports.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/reports.json"));
    }
}
