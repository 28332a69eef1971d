use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Category, Recommendation, Timeframe};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("report index {index} is out of range (0..{len})")]
    ReportOutOfRange { index: usize, len: usize },
    #[error("there are no reports to show")]
    NoReports,
    #[error("view was opened for {expected} reports but {actual} were given")]
    ReportListChanged { expected: usize, actual: usize },
    #[error("no recommendation with id {0}")]
    UnknownRecommendation(u32),
    #[error("recommendation id {0:?} is not a number")]
    MalformedId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    SelectTimeframe(Timeframe),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsViewState {
    pub view_id: Uuid,
    pub timeframe: Timeframe,
}

impl StatsViewState {
    pub fn new() -> Self {
        Self {
            view_id: Uuid::new_v4(),
            timeframe: Timeframe::default(),
        }
    }

    pub fn apply(&mut self, event: StatsEvent) {
        match event {
            StatsEvent::SelectTimeframe(timeframe) => {
                debug!(view = %self.view_id, timeframe = timeframe.key(), "timeframe selected");
                self.timeframe = timeframe;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportEvent {
    SelectReport(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportViewState {
    pub view_id: Uuid,
    active: usize,
    len: usize,
}

impl ReportViewState {
    /// Starts on the first (most recent) report.
    pub fn new(len: usize) -> Result<Self, SelectionError> {
        if len == 0 {
            return Err(SelectionError::NoReports);
        }
        Ok(Self {
            view_id: Uuid::new_v4(),
            active: 0,
            len,
        })
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn report_count(&self) -> usize {
        self.len
    }

    pub fn apply(&mut self, event: ReportEvent) -> Result<(), SelectionError> {
        match event {
            ReportEvent::SelectReport(index) => {
                if index >= self.len {
                    return Err(SelectionError::ReportOutOfRange {
                        index,
                        len: self.len,
                    });
                }
                debug!(view = %self.view_id, index, "report selected");
                self.active = index;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionsEvent {
    SelectTab(Category),
    Focus(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionsViewState {
    pub view_id: Uuid,
    pub tab: Category,
    pub focused: Option<u32>,
}

impl SuggestionsViewState {
    pub fn new() -> Self {
        Self {
            view_id: Uuid::new_v4(),
            tab: Category::Content,
            focused: None,
        }
    }

    pub fn apply(
        &mut self,
        event: SuggestionsEvent,
        catalog: &[Recommendation],
    ) -> Result<(), SelectionError> {
        match event {
            SuggestionsEvent::SelectTab(tab) => {
                let keeps_focus = self
                    .focused
                    .and_then(|id| catalog.iter().find(|rec| rec.id == id))
                    .is_some_and(|rec| rec.category == tab);
                if !keeps_focus {
                    self.focused = None;
                }
                self.tab = tab;
            }
            SuggestionsEvent::Focus(id) => {
                let rec = catalog
                    .iter()
                    .find(|rec| rec.id == id)
                    .ok_or(SelectionError::UnknownRecommendation(id))?;
                self.tab = rec.category;
                self.focused = Some(id);
            }
        }
        debug!(
            view = %self.view_id,
            tab = self.tab.key(),
            focused = ?self.focused,
            "suggestions selection changed"
        );
        Ok(())
    }

    /// Route parameters arrive as text; anything that is not a plain id is rejected.
    pub fn focus_param(
        &mut self,
        raw: &str,
        catalog: &[Recommendation],
    ) -> Result<(), SelectionError> {
        let id = raw
            .trim()
            .parse::<u32>()
            .map_err(|_| SelectionError::MalformedId(raw.to_string()))?;
        self.apply(SuggestionsEvent::Focus(id), catalog)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VisibilityToggles {
    pub password: bool,
    pub confirm: bool,
}

impl VisibilityToggles {
    pub fn toggle_password(&mut self) {
        self.password = !self.password;
    }

    pub fn toggle_confirm(&mut self) {
        self.confirm = !self.confirm;
    }
}
