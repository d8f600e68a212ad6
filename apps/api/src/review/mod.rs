//! Client-side review layer: an explicit view-state machine
//! (`ReviewController`), the `CandidateApi` seam it is driven through, and
//! the async driver that executes its effects.
//!
//! This side of the crate is consumed by review frontends, not by the
//! server binary itself.
#![allow(dead_code)]

pub mod client;
pub mod controller;

use crate::models::candidate::CandidateUpdate;

use self::client::{ApiClientError, CandidateApi};
use self::controller::{Effect, ReviewController};

/// Fetches the roster and stats once and feeds them into the controller.
/// On failure the controller is left untouched so any prior state stays
/// visible.
pub async fn bootstrap(
    controller: &mut ReviewController,
    api: &dyn CandidateApi,
) -> Result<(), ApiClientError> {
    let summaries = api.list_candidates().await?;
    let stats = api.stats().await?;

    controller.stats_loaded(stats);
    let effects = controller.summaries_loaded(summaries);
    apply(controller, effects, api).await;
    Ok(())
}

/// Executes effects against the API and feeds each outcome back into the
/// controller. Responses route through the controller's stale guards, so a
/// late arrival for an abandoned selection or query is simply dropped.
pub async fn apply(
    controller: &mut ReviewController,
    effects: Vec<Effect>,
    api: &dyn CandidateApi,
) {
    for effect in effects {
        match effect {
            Effect::LoadCandidate { id } => match api.get_candidate(id).await {
                Ok(candidate) => controller.candidate_loaded(candidate),
                Err(e) => controller.load_failed(id, e.to_string()),
            },
            Effect::SaveStar { id, starred } => {
                let patch = CandidateUpdate {
                    starred: Some(starred),
                    ..Default::default()
                };
                match api.update_candidate(id, &patch).await {
                    Ok(candidate) => controller.update_succeeded(candidate),
                    Err(e) => controller.star_save_failed(id, e.to_string()),
                }
            }
            Effect::SaveNotes { id, notes } => {
                let patch = CandidateUpdate {
                    notes: Some(notes),
                    ..Default::default()
                };
                match api.update_candidate(id, &patch).await {
                    Ok(candidate) => controller.update_succeeded(candidate),
                    Err(e) => controller.notes_save_failed(id, e.to_string()),
                }
            }
            Effect::RunSearch { query } => match api.search(&query).await {
                Ok(results) => controller.search_results(&query, results),
                Err(e) => controller.search_failed(e.to_string()),
            },
        }
    }
}
