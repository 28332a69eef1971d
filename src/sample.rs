use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::classify::Delta;
use crate::models::{
    Category, Insight, Level, Position, ProductPerformance, QueryResult, Recommendation, Report,
    StatsSnapshot, Timeframe, TrendPoint,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

fn query(text: &str, position: Position, change: f64) -> QueryResult {
    QueryResult {
        query: text.to_string(),
        position,
        change: Delta::points(change),
    }
}

fn insight(title: &str, description: &str, change: &str, impact: Level) -> Insight {
    Insight {
        title: title.to_string(),
        description: description.to_string(),
        change: Delta::parse(change),
        impact,
    }
}

/// Weekly reports, most recent first.
pub fn reports() -> Vec<Report> {
    vec![
        Report {
            id: 3,
            date: date(2025, 3, 17),
            title: "Weekly AI Visibility Report".to_string(),
            summary: "Visibility rose across assistants after the new comparison pages were indexed."
                .to_string(),
            insights: vec![
                insight(
                    "Comparison pages picked up",
                    "Assistants now cite the product comparison hub for head-to-head queries.",
                    "+12%",
                    Level::High,
                ),
                insight(
                    "Pricing answers drifted",
                    "Two assistants quote last year's pricing tier.",
                    "-8%",
                    Level::Medium,
                ),
                insight(
                    "Brand sentiment steady",
                    "Tone of brand mentions is unchanged week over week.",
                    "0",
                    Level::Low,
                ),
            ],
            performance: ProductPerformance {
                score: 78.0,
                change: Delta::points(5.0),
                metrics: metrics(&[
                    ("visibility", 74.0),
                    ("accuracy", 81.0),
                    ("sentiment", 69.0),
                    ("entityRelations", 62.0),
                ]),
                queries: vec![
                    query("best analytics platform for startups", Position::Ranked(2), 1.0),
                    query("ai visibility tools comparison", Position::Ranked(4), 2.0),
                    query("how to track brand mentions in chatbots", Position::Ranked(7), -1.0),
                    query("enterprise seo reporting software", Position::Unranked, 0.0),
                ],
            },
        },
        Report {
            id: 2,
            date: date(2025, 3, 10),
            title: "Weekly AI Visibility Report".to_string(),
            summary: "Entity coverage improved while long-tail queries slipped.".to_string(),
            insights: vec![
                insight(
                    "Founder entity linked",
                    "Knowledge panels now connect the founder to the company.",
                    "+6%",
                    Level::Medium,
                ),
                insight(
                    "Long-tail coverage slipped",
                    "Fewer answers mention the product for niche integration queries.",
                    "-4%",
                    Level::High,
                ),
            ],
            performance: ProductPerformance {
                score: 73.0,
                change: Delta::points(-2.0),
                metrics: metrics(&[
                    ("visibility", 70.0),
                    ("accuracy", 79.0),
                    ("sentiment", 68.0),
                    ("entityRelations", 55.0),
                ]),
                queries: vec![
                    query("best analytics platform for startups", Position::Ranked(3), 0.0),
                    query("ai visibility tools comparison", Position::Ranked(6), -2.0),
                    query("how to track brand mentions in chatbots", Position::Ranked(6), 1.0),
                    query("enterprise seo reporting software", Position::Unranked, 0.0),
                ],
            },
        },
        Report {
            id: 1,
            date: date(2025, 3, 3),
            title: "Weekly AI Visibility Report".to_string(),
            summary: "Baseline week after connecting the tracked assistants.".to_string(),
            insights: vec![insight(
                "Baseline captured",
                "All tracked assistants returned answers for the query set.",
                "0",
                Level::Low,
            )],
            performance: ProductPerformance {
                score: 75.0,
                change: Delta::points(0.0),
                metrics: metrics(&[
                    ("visibility", 72.0),
                    ("accuracy", 80.0),
                    ("sentiment", 67.0),
                    ("entityRelations", 51.0),
                ]),
                queries: vec![
                    query("best analytics platform for startups", Position::Ranked(3), 0.0),
                    query("ai visibility tools comparison", Position::Ranked(4), 0.0),
                    query("how to track brand mentions in chatbots", Position::Unranked, 0.0),
                ],
            },
        },
    ]
}

fn recommendation(
    id: u32,
    category: Category,
    title: &str,
    description: &str,
    priority: Level,
    difficulty: Level,
    impact_score: f64,
) -> Recommendation {
    Recommendation {
        id,
        category,
        title: title.to_string(),
        description: description.to_string(),
        priority,
        difficulty,
        impact_score,
    }
}

pub fn recommendations() -> Vec<Recommendation> {
    vec![
        recommendation(
            1,
            Category::Content,
            "Add direct answers to product pages",
            "Open each product page with a two-sentence answer to the question it targets.",
            Level::High,
            Level::Low,
            8.5,
        ),
        recommendation(
            2,
            Category::Content,
            "Refresh pricing copy",
            "Replace retired tier names so assistants stop quoting old prices.",
            Level::High,
            Level::Low,
            7.8,
        ),
        recommendation(
            3,
            Category::Content,
            "Publish customer outcome stories",
            "Short case studies with concrete numbers are cited more often than testimonials.",
            Level::Medium,
            Level::Medium,
            6.4,
        ),
        recommendation(
            4,
            Category::Entities,
            "Link founders to the organization",
            "Add Person markup for the founders with worksFor pointing at the company.",
            Level::Medium,
            Level::Low,
            6.9,
        ),
        recommendation(
            5,
            Category::Entities,
            "Claim knowledge base profiles",
            "Make sure the company has consistent profiles on the major public knowledge bases.",
            Level::High,
            Level::Medium,
            8.1,
        ),
        recommendation(
            6,
            Category::Gaps,
            "Cover integration setup questions",
            "Assistants answer integration queries with competitor docs; write setup guides.",
            Level::High,
            Level::High,
            9.2,
        ),
        recommendation(
            7,
            Category::Gaps,
            "Answer security and compliance queries",
            "There is no public page describing data retention and certifications.",
            Level::Medium,
            Level::Medium,
            7.1,
        ),
        recommendation(
            8,
            Category::Gaps,
            "Add a glossary",
            "Define product terms so assistants stop mixing them with a competitor's vocabulary.",
            Level::Low,
            Level::Low,
            4.6,
        ),
        recommendation(
            9,
            Category::Structure,
            "Add FAQ markup",
            "Mark up existing FAQ sections so question and answer pairs are extractable.",
            Level::Medium,
            Level::Low,
            6.2,
        ),
        recommendation(
            10,
            Category::Structure,
            "Split the long features page",
            "One page per feature gives assistants a focused source to cite.",
            Level::Low,
            Level::High,
            5.3,
        ),
    ]
}

fn trend(labels: &[&str], scores: &[f64]) -> Vec<TrendPoint> {
    labels
        .iter()
        .zip(scores)
        .map(|(label, score)| TrendPoint {
            label: label.to_string(),
            score: *score,
        })
        .collect()
}

pub fn stats(timeframe: Timeframe) -> StatsSnapshot {
    let top_queries = vec![
        query("best analytics platform for startups", Position::Ranked(2), 1.0),
        query("ai visibility tools comparison", Position::Ranked(4), 2.0),
        query("how to track brand mentions in chatbots", Position::Ranked(7), -1.0),
        query("enterprise seo reporting software", Position::Unranked, 0.0),
    ];

    match timeframe {
        Timeframe::Week => StatsSnapshot {
            timeframe,
            visibility_score: 78.0,
            visibility_change: Delta::percent(5.0),
            mentions: 1_284,
            mentions_change: Delta::parse("+12%"),
            average_position: 3.2,
            position_change: Delta::points(-0.4),
            share_of_voice: 24.0,
            share_change: Delta::parse("+2%"),
            trend: trend(
                &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
                &[72.0, 73.0, 75.0, 74.0, 77.0, 78.0, 78.0],
            ),
            metrics: metrics(&[
                ("answerInclusion", 64.0),
                ("citationRate", 41.0),
                ("sentiment", 69.0),
                ("entityCoverage", 58.0),
            ]),
            top_queries,
        },
        Timeframe::Month => StatsSnapshot {
            timeframe,
            visibility_score: 74.0,
            visibility_change: Delta::parse("+3%"),
            mentions: 5_102,
            mentions_change: Delta::parse("+7%"),
            average_position: 3.6,
            position_change: Delta::points(0.2),
            share_of_voice: 22.0,
            share_change: Delta::parse("-1%"),
            trend: trend(
                &["Week 1", "Week 2", "Week 3", "Week 4"],
                &[70.0, 72.0, 73.0, 78.0],
            ),
            metrics: metrics(&[
                ("answerInclusion", 61.0),
                ("citationRate", 39.0),
                ("sentiment", 68.0),
                ("entityCoverage", 55.0),
            ]),
            top_queries,
        },
        Timeframe::Quarter => StatsSnapshot {
            timeframe,
            visibility_score: 71.0,
            visibility_change: Delta::percent(-2.0),
            mentions: 14_870,
            mentions_change: Delta::parse("+18%"),
            average_position: 3.9,
            position_change: Delta::points(0.0),
            share_of_voice: 21.0,
            share_change: Delta::parse("0"),
            trend: trend(&["January", "February", "March"], &[73.0, 69.0, 74.0]),
            metrics: metrics(&[
                ("answerInclusion", 58.0),
                ("citationRate", 36.0),
                ("sentiment", 66.0),
                ("entityCoverage", 51.0),
            ]),
            top_queries,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn reports_are_most_recent_first() {
        let reports = reports();
        assert!(reports.windows(2).all(|pair| pair[0].date > pair[1].date));
    }

    #[test]
    fn recommendation_ids_are_unique_and_every_category_is_populated() {
        let recs = recommendations();
        let ids: HashSet<u32> = recs.iter().map(|rec| rec.id).collect();
        assert_eq!(ids.len(), recs.len());
        for category in Category::ALL {
            assert!(recs.iter().any(|rec| rec.category == category));
        }
    }

    #[test]
    fn scores_stay_in_range() {
        for report in reports() {
            assert!((0.0..=100.0).contains(&report.performance.score));
            for value in report.performance.metrics.values() {
                assert!((0.0..=100.0).contains(value));
            }
        }
        for rec in recommendations() {
            assert!((0.0..=10.0).contains(&rec.impact_score));
        }
    }

    #[test]
    fn each_timeframe_has_its_own_snapshot() {
        for timeframe in [Timeframe::Week, Timeframe::Month, Timeframe::Quarter] {
            let snapshot = stats(timeframe);
            assert_eq!(snapshot.timeframe, timeframe);
            assert!(!snapshot.trend.is_empty());
        }
    }
}
