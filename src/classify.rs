//! Change and score classification.
//!
//! Every change value entering the dashboard is normalized into a [`Delta`]
//! once, so display code branches on a direction instead of on whether the
//! source wrote `5` or `"+5%"`.

use serde::Serialize;

use crate::models::Position;

const STRONG_SCORE: f64 = 80.0;
const MODERATE_SCORE: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeClass {
    Positive,
    Negative,
    Neutral,
}

impl ChangeClass {
    pub fn arrow(self) -> &'static str {
        match self {
            ChangeClass::Positive => "↑",
            ChangeClass::Negative => "↓",
            ChangeClass::Neutral => "→",
        }
    }
}

pub fn classify_number(value: f64) -> ChangeClass {
    if value > 0.0 {
        ChangeClass::Positive
    } else if value < 0.0 {
        ChangeClass::Negative
    } else {
        ChangeClass::Neutral
    }
}

/// Direction comes from the leading sign alone; the rest of the text is not
/// inspected.
pub fn classify_text(text: &str) -> ChangeClass {
    if text.starts_with('+') {
        ChangeClass::Positive
    } else if text.starts_with('-') {
        ChangeClass::Negative
    } else {
        ChangeClass::Neutral
    }
}

pub fn classify(delta: &Delta) -> ChangeClass {
    delta.direction
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaUnit {
    Points,
    Percent,
}

/// A signed change. `magnitude` is absent when the source carried a sign
/// but no readable number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delta {
    direction: ChangeClass,
    magnitude: Option<f64>,
    unit: DeltaUnit,
}

impl Delta {
    pub fn points(value: f64) -> Self {
        Self::from_number(value, DeltaUnit::Points)
    }

    pub fn percent(value: f64) -> Self {
        Self::from_number(value, DeltaUnit::Percent)
    }

    fn from_number(value: f64, unit: DeltaUnit) -> Self {
        Self {
            direction: classify_number(value),
            magnitude: value.is_finite().then(|| value.abs()),
            unit,
        }
    }

    pub fn parse(text: &str) -> Self {
        let direction = classify_text(text);
        let trimmed = text.trim();
        let (body, unit) = match trimmed.strip_suffix('%') {
            Some(body) => (body, DeltaUnit::Percent),
            None => (trimmed, DeltaUnit::Points),
        };
        let body = body
            .strip_prefix('+')
            .or_else(|| body.strip_prefix('-'))
            .unwrap_or(body);
        let magnitude = body
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(f64::abs);

        Self {
            direction,
            magnitude,
            unit,
        }
    }

    pub fn direction(&self) -> ChangeClass {
        self.direction
    }

    pub fn magnitude(&self) -> Option<f64> {
        self.magnitude
    }

    pub fn unit(&self) -> DeltaUnit {
        self.unit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Strong => "strong",
            ScoreBand::Moderate => "moderate",
            ScoreBand::Weak => "weak",
        }
    }
}

pub fn score_band(score: f64) -> ScoreBand {
    if score >= STRONG_SCORE {
        ScoreBand::Strong
    } else if score >= MODERATE_SCORE {
        ScoreBand::Moderate
    } else {
        ScoreBand::Weak
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBadge {
    Top,
    Listed,
    Unranked,
}

pub fn rank_badge(position: &Position) -> RankBadge {
    match position {
        Position::Ranked(rank) if *rank <= 3 => RankBadge::Top,
        Position::Ranked(_) => RankBadge::Listed,
        Position::Unranked => RankBadge::Unranked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_classify_by_sign() {
        assert_eq!(classify_number(12.0), ChangeClass::Positive);
        assert_eq!(classify_number(0.01), ChangeClass::Positive);
        assert_eq!(classify_number(-8.0), ChangeClass::Negative);
        assert_eq!(classify_number(0.0), ChangeClass::Neutral);
        assert_eq!(classify_number(-0.0), ChangeClass::Neutral);
        assert_eq!(classify_number(f64::NAN), ChangeClass::Neutral);
    }

    #[test]
    fn text_classifies_by_leading_sign() {
        assert_eq!(classify_text("+12%"), ChangeClass::Positive);
        assert_eq!(classify_text("+abc"), ChangeClass::Positive);
        assert_eq!(classify_text("-8%"), ChangeClass::Negative);
        assert_eq!(classify_text("0"), ChangeClass::Neutral);
        assert_eq!(classify_text("12%"), ChangeClass::Neutral);
        assert_eq!(classify_text(""), ChangeClass::Neutral);
        assert_eq!(classify_text("steady"), ChangeClass::Neutral);
    }

    #[test]
    fn parsed_delta_keeps_sign_magnitude_and_unit() {
        let delta = Delta::parse("+12%");
        assert_eq!(classify(&delta), ChangeClass::Positive);
        assert_eq!(delta.magnitude(), Some(12.0));
        assert_eq!(delta.unit(), DeltaUnit::Percent);

        let delta = Delta::parse("-3.5");
        assert_eq!(classify(&delta), ChangeClass::Negative);
        assert_eq!(delta.magnitude(), Some(3.5));
        assert_eq!(delta.unit(), DeltaUnit::Points);
    }

    #[test]
    fn signed_text_without_number_keeps_direction() {
        let delta = Delta::parse("+n/a");
        assert_eq!(delta.direction(), ChangeClass::Positive);
        assert_eq!(delta.magnitude(), None);
    }

    #[test]
    fn numeric_delta_matches_number_classifier() {
        assert_eq!(Delta::points(5.0).direction(), ChangeClass::Positive);
        assert_eq!(Delta::percent(-2.0).direction(), ChangeClass::Negative);
        assert_eq!(Delta::points(0.0).direction(), ChangeClass::Neutral);
        assert_eq!(Delta::points(-2.0).magnitude(), Some(2.0));
        assert_eq!(Delta::points(f64::INFINITY).magnitude(), None);
    }

    #[test]
    fn score_bands_follow_thresholds() {
        assert_eq!(score_band(92.0), ScoreBand::Strong);
        assert_eq!(score_band(80.0), ScoreBand::Strong);
        assert_eq!(score_band(79.9), ScoreBand::Moderate);
        assert_eq!(score_band(60.0), ScoreBand::Moderate);
        assert_eq!(score_band(12.0), ScoreBand::Weak);
    }

    #[test]
    fn unranked_queries_never_get_the_top_badge() {
        assert_eq!(rank_badge(&Position::Ranked(1)), RankBadge::Top);
        assert_eq!(rank_badge(&Position::Ranked(3)), RankBadge::Top);
        assert_eq!(rank_badge(&Position::Ranked(4)), RankBadge::Listed);
        assert_eq!(rank_badge(&Position::Unranked), RankBadge::Unranked);
    }
}
