use std::fmt::Write;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::classify::{classify, rank_badge, score_band, ChangeClass, RankBadge, ScoreBand};
use crate::format;
use crate::models::{Level, QueryResult, Report};
use crate::page::Page;
use crate::selection::{ReportViewState, SelectionError};

#[derive(Debug, Clone, Serialize)]
pub struct MetricRow {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRow {
    pub query: String,
    pub position: String,
    pub badge: RankBadge,
    pub change: String,
    pub class: ChangeClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportTab {
    pub index: usize,
    pub date: NaiveDate,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightRow {
    pub title: String,
    pub description: String,
    pub change: String,
    pub class: ChangeClass,
    pub impact: Level,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportPage {
    pub view_id: Uuid,
    pub reports: Vec<ReportTab>,
    pub title: String,
    pub date: NaiveDate,
    pub summary: String,
    pub insights: Vec<InsightRow>,
    pub score: String,
    pub score_band: ScoreBand,
    pub score_change: String,
    pub score_class: ChangeClass,
    pub metrics: Vec<MetricRow>,
    pub queries: Vec<QueryRow>,
}

pub fn metric_rows<'a>(metrics: impl IntoIterator<Item = (&'a String, &'a f64)>) -> Vec<MetricRow> {
    metrics
        .into_iter()
        .map(|(key, value)| MetricRow {
            key: key.clone(),
            label: format::metric_label(key),
            value: format::percent(*value),
        })
        .collect()
}

pub fn query_rows(queries: &[QueryResult]) -> Vec<QueryRow> {
    queries
        .iter()
        .map(|q| QueryRow {
            query: q.query.clone(),
            position: format::position_text(&q.position),
            badge: rank_badge(&q.position),
            change: format::delta_text(&q.change),
            class: classify(&q.change),
        })
        .collect()
}

pub fn build_report_page(
    state: &ReportViewState,
    reports: &[Report],
) -> Result<ReportPage, SelectionError> {
    if reports.len() != state.report_count() {
        return Err(SelectionError::ReportListChanged {
            expected: state.report_count(),
            actual: reports.len(),
        });
    }
    let active = state.active();
    let report = &reports[active];
    let performance = &report.performance;

    Ok(ReportPage {
        view_id: state.view_id,
        reports: reports
            .iter()
            .enumerate()
            .map(|(index, r)| ReportTab {
                index,
                date: r.date,
                active: index == active,
            })
            .collect(),
        title: report.title.clone(),
        date: report.date,
        summary: report.summary.clone(),
        insights: report
            .insights
            .iter()
            .map(|insight| InsightRow {
                title: insight.title.clone(),
                description: insight.description.clone(),
                change: format::delta_text(&insight.change),
                class: classify(&insight.change),
                impact: insight.impact,
            })
            .collect(),
        score: format::percent(performance.score),
        score_band: score_band(performance.score),
        score_change: format::delta_text(&performance.change),
        score_class: classify(&performance.change),
        metrics: metric_rows(&performance.metrics),
        queries: query_rows(&performance.queries),
    })
}

pub fn write_query_table(output: &mut String, queries: &[QueryRow]) {
    if queries.is_empty() {
        let _ = writeln!(output, "No tracked queries for this period.");
        return;
    }
    let _ = writeln!(output, "| Query | Position | Change |");
    let _ = writeln!(output, "|---|---|---|");
    for row in queries {
        let marker = match row.badge {
            RankBadge::Top => " ★",
            RankBadge::Listed | RankBadge::Unranked => "",
        };
        let _ = writeln!(
            output,
            "| {} | {}{} | {} {} |",
            row.query,
            row.position,
            marker,
            row.class.arrow(),
            row.change
        );
    }
}

impl Page for ReportPage {
    fn markdown(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# {}", self.title);
        let _ = writeln!(output, "Week of {}", self.date);
        let _ = writeln!(output);
        let dates: Vec<String> = self
            .reports
            .iter()
            .map(|tab| {
                if tab.active {
                    format!("**[{}] {}**", tab.index, tab.date)
                } else {
                    format!("[{}] {}", tab.index, tab.date)
                }
            })
            .collect();
        let _ = writeln!(output, "Reports: {}", dates.join(" · "));
        let _ = writeln!(output);
        let _ = writeln!(output, "{}", self.summary);
        let _ = writeln!(output);

        let _ = writeln!(output, "## Key Insights");
        if self.insights.is_empty() {
            let _ = writeln!(output, "No insights recorded for this week.");
        } else {
            for insight in &self.insights {
                let _ = writeln!(
                    output,
                    "- {} {} ({}, {} impact): {}",
                    insight.class.arrow(),
                    insight.title,
                    insight.change,
                    insight.impact.label(),
                    insight.description
                );
            }
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## Product Performance");
        let _ = writeln!(
            output,
            "Overall score {} ({}), {} {} since last week",
            self.score,
            self.score_band.label(),
            self.score_class.arrow(),
            self.score_change
        );
        let _ = writeln!(output);
        for metric in &self.metrics {
            let _ = writeln!(output, "- {}: {}", metric.label, metric.value);
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## Query Rankings");
        write_query_table(&mut output, &self.queries);

        output
    }
}
