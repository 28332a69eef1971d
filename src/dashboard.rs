use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use crate::classify::{classify, score_band, ChangeClass, Delta, ScoreBand};
use crate::format;
use crate::models::{StatsSnapshot, Timeframe, TrendPoint};
use crate::page::Page;
use crate::report::{metric_rows, query_rows, write_query_table, MetricRow, QueryRow};
use crate::selection::StatsViewState;

#[derive(Debug, Clone, Serialize)]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub change: String,
    pub class: ChangeClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsPage {
    pub view_id: Uuid,
    pub timeframe: Timeframe,
    pub timeframe_label: &'static str,
    pub score_band: ScoreBand,
    pub cards: Vec<StatCard>,
    pub trend: Vec<TrendPoint>,
    pub metrics: Vec<MetricRow>,
    pub top_queries: Vec<QueryRow>,
}

fn card(key: &str, value: String, change: &Delta) -> StatCard {
    StatCard {
        label: format::metric_label(key),
        value,
        change: format::delta_text(change),
        class: classify(change),
    }
}

pub fn build_stats_page(state: &StatsViewState, snapshot: &StatsSnapshot) -> StatsPage {
    StatsPage {
        view_id: state.view_id,
        timeframe: state.timeframe,
        timeframe_label: state.timeframe.label(),
        score_band: score_band(snapshot.visibility_score),
        cards: vec![
            card(
                "visibilityScore",
                format::percent(snapshot.visibility_score),
                &snapshot.visibility_change,
            ),
            card(
                "brandMentions",
                snapshot.mentions.to_string(),
                &snapshot.mentions_change,
            ),
            card(
                "averagePosition",
                format!("{:.1}", snapshot.average_position),
                &snapshot.position_change,
            ),
            card(
                "shareOfVoice",
                format::percent(snapshot.share_of_voice),
                &snapshot.share_change,
            ),
        ],
        trend: snapshot.trend.clone(),
        metrics: metric_rows(&snapshot.metrics),
        top_queries: query_rows(&snapshot.top_queries),
    }
}

impl Page for StatsPage {
    fn markdown(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# AI Visibility Dashboard");
        let _ = writeln!(output, "{}", self.timeframe_label);
        let _ = writeln!(output);

        let _ = writeln!(output, "| Metric | Value | Change |");
        let _ = writeln!(output, "|---|---|---|");
        for card in &self.cards {
            let _ = writeln!(
                output,
                "| {} | {} | {} {} |",
                card.label,
                card.value,
                card.class.arrow(),
                card.change
            );
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "Visibility is {}.", self.score_band.label());

        let _ = writeln!(output);
        let _ = writeln!(output, "## Visibility Trend");
        for point in &self.trend {
            let bar = "█".repeat((point.score / 10.0).round().max(0.0) as usize);
            let _ = writeln!(
                output,
                "- {:<9} {} {}",
                point.label,
                bar,
                format::percent(point.score)
            );
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## Answer Quality");
        for metric in &self.metrics {
            let _ = writeln!(output, "- {}: {}", metric.label, metric.value);
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "## Top Queries");
        write_query_table(&mut output, &self.top_queries);

        output
    }
}
