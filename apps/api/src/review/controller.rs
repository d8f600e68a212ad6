use std::time::{Duration, Instant};

use crate::models::candidate::{
    has_notes, CandidateDetail, CandidateSummary, SearchHit, Stats,
};

/// How long notes input must stay quiet before an autosave fires.
pub const NOTES_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Starred,
    Unviewed,
    WithNotes,
}

impl Filter {
    fn matches(self, candidate: &CandidateSummary) -> bool {
        match self {
            Filter::All => true,
            Filter::Starred => candidate.starred,
            Filter::Unviewed => !candidate.viewed,
            Filter::WithNotes => candidate.has_notes,
        }
    }
}

/// Where keyboard focus currently is. Shortcuts fire only on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    NotesInput,
    SearchInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Next,
    Prev,
    ToggleStar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Next,
    Prev,
}

/// Commands the controller asks its driver to run. The controller never
/// performs IO itself; the driver executes each effect against the API and
/// feeds the outcome back in through the `*_loaded` / `*_failed` transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    LoadCandidate { id: i64 },
    SaveStar { id: i64, starred: bool },
    SaveNotes { id: i64, notes: String },
    RunSearch { query: String },
}

/// Client-side view state for the review screen, modeled as an explicit
/// state machine: every user action and every server response is a named
/// transition, and anything that needs the network comes back as an
/// `Effect` for the driver.
#[derive(Default)]
pub struct ReviewController {
    summaries: Vec<CandidateSummary>,
    stats: Option<Stats>,
    filter: Filter,
    index: usize,
    current: Option<CandidateDetail>,
    /// Keeps the open candidate visible in the filtered list even when it no
    /// longer matches (it was marked viewed while open under `unviewed`).
    /// Cleared on navigation and filter changes.
    pinned: Option<i64>,
    search_query: String,
    search_results: Option<Vec<SearchHit>>,
    notes_buffer: String,
    notes_dirty: bool,
    notes_deadline: Option<Instant>,
    /// Pre-flip value of the oldest unresolved star toggle, for rollback.
    star_rollback: Option<(i64, bool)>,
    focus: Focus,
    last_error: Option<String>,
}

impl ReviewController {
    pub fn new() -> Self {
        Self::default()
    }

    // --- transitions: bootstrap -------------------------------------------

    pub fn summaries_loaded(&mut self, list: Vec<CandidateSummary>) -> Vec<Effect> {
        self.summaries = list;
        self.clamp_index();
        self.load_selected()
    }

    pub fn stats_loaded(&mut self, stats: Stats) {
        self.stats = Some(stats);
    }

    // --- transitions: navigation and filtering ----------------------------

    pub fn filter_change(&mut self, filter: Filter) -> Vec<Effect> {
        self.filter = filter;
        self.pinned = None;
        self.index = 0;
        self.load_selected()
    }

    /// Moves the selection by one within the filtered list, saturating at
    /// both ends. Does not touch an active search overlay.
    pub fn navigate(&mut self, step: Step) -> Vec<Effect> {
        let ids = self.filtered_ids();
        if ids.is_empty() {
            return Vec::new();
        }
        let new_index = match step {
            Step::Next => (self.index + 1).min(ids.len() - 1),
            Step::Prev => self.index.saturating_sub(1),
        };
        if new_index == self.index {
            return Vec::new();
        }

        // Resolve the target before dropping the pin: removing the pinned
        // row from the filtered list shifts positions after it.
        let target = ids[new_index];
        self.pinned = None;
        self.index = self
            .filtered_ids()
            .iter()
            .position(|&id| id == target)
            .unwrap_or(0);
        self.load_selected()
    }

    // --- transitions: search ----------------------------------------------

    /// Commits the search box contents. Blank text clears the overlay
    /// without a server call.
    pub fn search_commit(&mut self, query: &str) -> Vec<Effect> {
        self.search_query = query.to_string();
        if query.trim().is_empty() {
            self.search_results = None;
            return Vec::new();
        }
        vec![Effect::RunSearch {
            query: query.to_string(),
        }]
    }

    pub fn search_results(&mut self, query: &str, results: Vec<SearchHit>) {
        // Stale guard: results for a query that is no longer in the box are
        // dropped.
        if query != self.search_query || self.search_query.trim().is_empty() {
            return;
        }
        self.search_results = Some(results);
    }

    /// Loads a candidate picked from the overlay. The filter resets to `All`
    /// so the selection is guaranteed visible, and the overlay closes.
    pub fn select_search_result(&mut self, id: i64) -> Vec<Effect> {
        self.filter = Filter::All;
        self.pinned = None;
        self.search_results = None;
        self.search_query.clear();
        self.index = self
            .filtered_ids()
            .iter()
            .position(|&x| x == id)
            .unwrap_or(0);
        self.load_selected()
    }

    // --- transitions: server responses ------------------------------------

    pub fn candidate_loaded(&mut self, candidate: CandidateDetail) {
        // Stale guard: a response that no longer matches the selection is
        // ignored.
        if self.selected_id() != Some(candidate.id) {
            return;
        }

        // Reflect the first-read viewed flip in the summary list without
        // refetching the open candidate; the pin keeps its row in place
        // under the `unviewed` filter until the reviewer moves on.
        if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == candidate.id) {
            summary.viewed = candidate.viewed;
        }
        self.pinned = Some(candidate.id);
        self.notes_buffer = candidate.notes.clone().unwrap_or_default();
        self.notes_dirty = false;
        self.notes_deadline = None;
        self.current = Some(candidate);
    }

    pub fn load_failed(&mut self, id: i64, message: String) {
        // Prior state stays visible; the reviewer can navigate again.
        self.last_error = Some(format!("Failed to load candidate {id}: {message}"));
    }

    pub fn search_failed(&mut self, message: String) {
        // The overlay keeps whatever it was showing before.
        self.last_error = Some(format!("Search failed: {message}"));
    }

    pub fn update_succeeded(&mut self, candidate: CandidateDetail) {
        if self
            .star_rollback
            .map_or(false, |(id, _)| id == candidate.id)
        {
            self.star_rollback = None;
        }
        if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == candidate.id) {
            summary.starred = candidate.starred;
            summary.viewed = candidate.viewed;
            summary.has_notes = has_notes(candidate.notes.as_deref());
        }
        if let Some(current) = self.current.as_mut() {
            if current.id == candidate.id {
                current.starred = candidate.starred;
                current.viewed = candidate.viewed;
                current.viewed_at = candidate.viewed_at;
                current.notes = candidate.notes.clone();
                current.updated_at = candidate.updated_at;
                // The in-progress notes buffer is deliberately left alone.
            }
        }
    }

    // --- transitions: starring --------------------------------------------

    /// Optimistic star toggle: list and record flip immediately, the save
    /// runs in the background. A second toggle before the first resolves is
    /// last-write-wins.
    pub fn toggle_star(&mut self) -> Vec<Effect> {
        let Some(current) = self.current.as_mut() else {
            return Vec::new();
        };
        let id = current.id;
        let previous = current.starred;
        current.starred = !previous;
        if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == id) {
            summary.starred = !previous;
        }
        if self.star_rollback.is_none() {
            self.star_rollback = Some((id, previous));
        }
        vec![Effect::SaveStar {
            id,
            starred: !previous,
        }]
    }

    pub fn star_save_failed(&mut self, id: i64, message: String) {
        if let Some((rollback_id, previous)) = self.star_rollback.take() {
            if rollback_id == id {
                if let Some(summary) = self.summaries.iter_mut().find(|s| s.id == id) {
                    summary.starred = previous;
                }
                if let Some(current) = self.current.as_mut() {
                    if current.id == id {
                        current.starred = previous;
                    }
                }
            } else {
                self.star_rollback = Some((rollback_id, previous));
            }
        }
        self.last_error = Some(message);
    }

    // --- transitions: notes -----------------------------------------------

    /// Records a keystroke in the notes editor and (re)arms the autosave
    /// deadline. One pending timer at a time: each keystroke replaces it.
    pub fn notes_input(&mut self, text: &str, now: Instant) {
        self.notes_buffer = text.to_string();
        self.notes_dirty = true;
        self.notes_deadline = Some(now + NOTES_DEBOUNCE);
    }

    /// Fires the pending autosave once its quiet period has elapsed.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        match self.notes_deadline {
            Some(deadline) if now >= deadline => self.flush_notes(),
            _ => Vec::new(),
        }
    }

    /// Leaving the notes editor forces an immediate save and cancels any
    /// pending debounced one.
    pub fn notes_blur(&mut self) -> Vec<Effect> {
        self.flush_notes()
    }

    pub fn notes_save_failed(&mut self, _id: i64, message: String) {
        // Keep the buffer and stay dirty so the next blur or keystroke
        // retries the save.
        self.notes_dirty = true;
        self.last_error = Some(message);
    }

    fn flush_notes(&mut self) -> Vec<Effect> {
        self.notes_deadline = None;
        if !self.notes_dirty {
            return Vec::new();
        }
        let Some(id) = self.current.as_ref().map(|c| c.id) else {
            return Vec::new();
        };
        self.notes_dirty = false;
        vec![Effect::SaveNotes {
            id,
            notes: self.notes_buffer.clone(),
        }]
    }

    // --- transitions: focus and keyboard ----------------------------------

    pub fn set_focus(&mut self, focus: Focus) -> Vec<Effect> {
        let leaving_notes = self.focus == Focus::NotesInput && focus != Focus::NotesInput;
        self.focus = focus;
        if leaving_notes {
            self.notes_blur()
        } else {
            Vec::new()
        }
    }

    /// Keyboard shortcuts apply only while focus is on the list, never
    /// inside a text input.
    pub fn key(&mut self, key: Key) -> Vec<Effect> {
        if self.focus != Focus::List {
            return Vec::new();
        }
        match key {
            Key::Next => self.navigate(Step::Next),
            Key::Prev => self.navigate(Step::Prev),
            Key::ToggleStar => self.toggle_star(),
        }
    }

    // --- derived state ----------------------------------------------------

    pub fn filtered_candidates(&self) -> Vec<&CandidateSummary> {
        self.summaries
            .iter()
            .filter(|c| self.filter.matches(c) || self.pinned == Some(c.id))
            .collect()
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.filtered_ids().get(self.index).copied()
    }

    pub fn current(&self) -> Option<&CandidateDetail> {
        self.current.as_ref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn search_overlay(&self) -> Option<&[SearchHit]> {
        self.search_results.as_deref()
    }

    pub fn notes_buffer(&self) -> &str {
        &self.notes_buffer
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn filtered_ids(&self) -> Vec<i64> {
        self.filtered_candidates().iter().map(|c| c.id).collect()
    }

    fn clamp_index(&mut self) {
        let len = self.filtered_ids().len();
        self.index = if len == 0 { 0 } else { self.index.min(len - 1) };
    }

    fn load_selected(&mut self) -> Vec<Effect> {
        match self.selected_id() {
            Some(id) if self.current.as_ref().map(|c| c.id) != Some(id) => {
                vec![Effect::LoadCandidate { id }]
            }
            _ => Vec::new(),
        }
    }
}
