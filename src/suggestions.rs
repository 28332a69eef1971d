use std::fmt::Write;

use serde::Serialize;
use uuid::Uuid;

use crate::format;
use crate::models::{Category, Level, Recommendation};
use crate::page::Page;
use crate::selection::SuggestionsViewState;

#[derive(Debug, Clone, Serialize)]
pub struct TabSummary {
    pub category: Category,
    pub title: &'static str,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationCard {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub priority: Level,
    pub difficulty: Level,
    pub impact: String,
    pub focused: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuggestionsPage {
    pub view_id: Uuid,
    pub tabs: Vec<TabSummary>,
    pub active_title: &'static str,
    pub cards: Vec<RecommendationCard>,
    pub focused: Option<RecommendationCard>,
}

fn card(rec: &Recommendation, focused: Option<u32>) -> RecommendationCard {
    RecommendationCard {
        id: rec.id,
        title: rec.title.clone(),
        description: rec.description.clone(),
        priority: rec.priority,
        difficulty: rec.difficulty,
        impact: format::impact_text(rec.impact_score),
        focused: focused == Some(rec.id),
    }
}

pub fn build_suggestions_page(
    state: &SuggestionsViewState,
    catalog: &[Recommendation],
) -> SuggestionsPage {
    let tabs = Category::ALL
        .into_iter()
        .map(|category| TabSummary {
            category,
            title: category.title(),
            count: catalog.iter().filter(|rec| rec.category == category).count(),
            active: category == state.tab,
        })
        .collect();

    let cards: Vec<RecommendationCard> = catalog
        .iter()
        .filter(|rec| rec.category == state.tab)
        .map(|rec| card(rec, state.focused))
        .collect();
    let focused = cards.iter().find(|card| card.focused).cloned();

    SuggestionsPage {
        view_id: state.view_id,
        tabs,
        active_title: state.tab.title(),
        cards,
        focused,
    }
}

impl Page for SuggestionsPage {
    fn markdown(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# Recommendations");
        let tabs: Vec<String> = self
            .tabs
            .iter()
            .map(|tab| {
                let label = format!("{} ({})", tab.category.key(), tab.count);
                if tab.active {
                    format!("**{label}**")
                } else {
                    label
                }
            })
            .collect();
        let _ = writeln!(output, "{}", tabs.join(" | "));
        let _ = writeln!(output);

        if let Some(focused) = &self.focused {
            let _ = writeln!(output, "## Selected: {}", focused.title);
            let _ = writeln!(output, "{}", focused.description);
            let _ = writeln!(
                output,
                "Priority {} · Difficulty {} · Impact {}",
                focused.priority.label(),
                focused.difficulty.label(),
                focused.impact
            );
            let _ = writeln!(output);
        }

        let _ = writeln!(output, "## {}", self.active_title);
        if self.cards.is_empty() {
            let _ = writeln!(output, "No recommendations in this category.");
        }
        for card in &self.cards {
            let marker = if card.focused { "> " } else { "" };
            let _ = writeln!(
                output,
                "{}- [{}] {} (priority {}, difficulty {}, impact {})",
                marker,
                card.id,
                card.title,
                card.priority.label(),
                card.difficulty.label(),
                card.impact
            );
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;
    use crate::selection::SuggestionsEvent;

    #[test]
    fn default_tab_is_content() {
        let catalog = sample::recommendations();
        let state = SuggestionsViewState::new();
        let page = build_suggestions_page(&state, &catalog);

        assert_eq!(page.active_title, "Content Optimization");
        assert!(page.cards.iter().all(|card| !card.focused));
        assert_eq!(page.tabs.iter().filter(|tab| tab.active).count(), 1);
        let total: usize = page.tabs.iter().map(|tab| tab.count).sum();
        assert_eq!(total, catalog.len());
    }

    #[test]
    fn focused_id_opens_its_category() {
        let catalog = sample::recommendations();
        let mut state = SuggestionsViewState::new();
        state.apply(SuggestionsEvent::Focus(6), &catalog).unwrap();
        let page = build_suggestions_page(&state, &catalog);

        assert_eq!(page.active_title, "Content Gaps");
        let focused = page.focused.unwrap();
        assert_eq!(focused.id, 6);
        assert_eq!(focused.impact, "9.2/10");
    }

    #[test]
    fn markdown_highlights_active_tab_and_focus() {
        let catalog = sample::recommendations();
        let mut state = SuggestionsViewState::new();
        state.apply(SuggestionsEvent::Focus(9), &catalog).unwrap();
        let text = build_suggestions_page(&state, &catalog).markdown();

        assert!(text.contains("**structure (2)**"));
        assert!(text.contains("## Selected: Add FAQ markup"));
        assert!(text.contains("> - [9] Add FAQ markup"));
    }
}
