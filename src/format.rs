use crate::classify::{ChangeClass, Delta, DeltaUnit};
use crate::models::Position;

/// `entityRelations` -> `Entity Relations`.
pub fn metric_label(key: &str) -> String {
    let mut spaced = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() && !spaced.is_empty() {
            spaced.push(' ');
        }
        spaced.push(ch);
    }

    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn percent(score: f64) -> String {
    format!("{}%", score.round() as i64)
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.1}", value)
    }
}

pub fn delta_text(delta: &Delta) -> String {
    let suffix = match delta.unit() {
        DeltaUnit::Percent => "%",
        DeltaUnit::Points => "",
    };
    let sign = match delta.direction() {
        ChangeClass::Positive => "+",
        ChangeClass::Negative => "-",
        ChangeClass::Neutral => "",
    };

    match delta.magnitude() {
        Some(magnitude) => format!("{sign}{}{suffix}", number(magnitude)),
        None if sign.is_empty() => "n/a".to_string(),
        None => sign.to_string(),
    }
}

pub fn position_text(position: &Position) -> String {
    match position {
        Position::Ranked(rank) => format!("#{rank}"),
        Position::Unranked => "Not in top 10".to_string(),
    }
}

pub fn impact_text(score: f64) -> String {
    format!("{:.1}/10", score)
}
