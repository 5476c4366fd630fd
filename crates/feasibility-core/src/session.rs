//! Wizard session state.
//!
//! A session walks the catalog one category at a time, records answers, and
//! on the last step runs the assessment. Each completed run is identified by
//! a [`RunTicket`]; narrative output arriving for an older run is discarded.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::assembler::Assessor;
use crate::catalog::{Catalog, Category};
use crate::history::SavedAssessment;
use crate::types::{AssessmentResult, Answers, PlanStatus, DESCRIPTION_QUESTION_ID};

/// Identifies one completed assessment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunTicket {
    run_id: u64,
}

impl RunTicket {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }
}

/// Result of [`WizardSession::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    /// The current category still has unanswered questions
    Blocked,

    /// Moved to the category at this index
    Advanced(usize),

    /// The last category was submitted and the assessment ran
    Completed(RunTicket),
}

#[derive(Debug, Clone)]
pub struct WizardSession<'a> {
    catalog: &'a Catalog,
    answers: Answers,
    category_index: usize,
    editing_id: Option<String>,
    result: Option<AssessmentResult>,
    run_id: u64,
}

impl<'a> WizardSession<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            answers: Answers::new(),
            category_index: 0,
            editing_id: None,
            result: None,
            run_id: 0,
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn set_answer(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.answers.insert(question_id, value);
    }

    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id)
    }

    pub fn description(&self) -> Option<&str> {
        self.answers
            .answered(DESCRIPTION_QUESTION_ID)
            .filter(|text| !text.trim().is_empty())
    }

    pub fn category_index(&self) -> usize {
        self.category_index
    }

    pub fn current_category(&self) -> Option<&'a Category> {
        self.catalog.categories.get(self.category_index)
    }

    pub fn is_last_category(&self) -> bool {
        self.category_index + 1 >= self.catalog.categories.len()
    }

    /// Every question of the current category has a non-empty answer.
    pub fn can_go_next(&self) -> bool {
        self.current_category().is_some_and(|category| {
            category
                .questions
                .iter()
                .all(|question| self.answers.is_answered(&question.id))
        })
    }

    pub fn can_go_prev(&self) -> bool {
        self.category_index > 0
    }

    pub fn next(&mut self, assessor: &Assessor) -> WizardStep {
        if !self.can_go_next() {
            return WizardStep::Blocked;
        }
        if self.is_last_category() {
            return WizardStep::Completed(self.complete(assessor));
        }
        self.category_index += 1;
        WizardStep::Advanced(self.category_index)
    }

    pub fn previous(&mut self) -> bool {
        if !self.can_go_prev() {
            return false;
        }
        self.category_index -= 1;
        true
    }

    /// Run the assessment on the current answers.
    ///
    /// Invalidates tickets of earlier runs.
    pub fn complete(&mut self, assessor: &Assessor) -> RunTicket {
        self.run_id += 1;
        self.result = Some(assessor.assess(&self.answers, self.catalog));
        RunTicket {
            run_id: self.run_id,
        }
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// Attach narrative output to the result of the run `ticket` refers to.
    ///
    /// Returns false, leaving the result untouched, when the ticket is stale.
    pub fn attach_plan(
        &mut self,
        ticket: RunTicket,
        status: PlanStatus,
        content: Option<String>,
    ) -> bool {
        if ticket.run_id != self.run_id {
            tracing::debug!(
                ticket = ticket.run_id,
                current = self.run_id,
                "Discarding narrative for stale run"
            );
            return false;
        }
        match self.result.as_mut() {
            Some(result) => {
                result.attach_plan(status, content);
                true
            }
            None => false,
        }
    }

    /// Start over. While editing a saved assessment the answers and the
    /// saved id are kept.
    pub fn reset(&mut self) {
        if self.editing_id.is_none() {
            self.answers = Answers::new();
        }
        self.category_index = 0;
        self.result = None;
        self.run_id += 1;
    }

    /// Load a saved assessment for editing.
    pub fn edit(&mut self, saved: &SavedAssessment) {
        self.answers = saved.answers.clone();
        self.result = Some(saved.result.clone());
        self.editing_id = Some(saved.id.clone());
        self.category_index = 0;
        self.run_id += 1;
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    /// Build the record to persist, or `None` before any result exists.
    ///
    /// Reuses the id being edited; otherwise mints one from `now` plus a
    /// random suffix, so records saved in the same millisecond stay apart.
    pub fn to_saved(&self, name: impl Into<String>, now: DateTime<Utc>) -> Option<SavedAssessment> {
        let result = self.result.clone()?;
        let id = self.editing_id.clone().unwrap_or_else(|| new_record_id(now));

        Some(SavedAssessment {
            id,
            name: name.into(),
            date: now,
            answers: self.answers.clone(),
            result,
            description: self.description().map(str::to_string),
        })
    }
}

fn new_record_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}{}", now.timestamp_millis(), suffix)
}
