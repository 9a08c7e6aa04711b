//! Run orchestration: directory, ranking, and the emergency loop.
//!
//! ## Structure
//!
//! - `directory`: de-duplicated location discovery
//! - `ranking`: epicenter, proximity and cost ordering
//! - `solver`: greedy per-emergency fulfillment

pub mod directory;
pub mod ranking;
pub mod solver;

use std::collections::BTreeMap;

use crate::api::traits::SimulationApi;
use crate::api::types::Location;
use crate::catalog::{Catalog, LocationRow};

/// Lifecycle of one simulation run. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    NotStarted,
    Running,
    Stopped,
}

/// Tallies reported after a run completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunReport {
    pub events_handled: u64,
    pub events_resolved: u64,
    pub candidates_remaining: usize,
}

/// Owns the candidate set and drives one full simulation run.
///
/// The candidate set is built once per run from the ranked directory and
/// only shrinks afterwards, as candidates are observed exhausted.
pub struct SimulationEngine<A> {
    api: A,
    home_county: String,
    catalog: Option<Catalog>,
    state: RunState,
    candidates: Vec<Location>,
}

impl<A: SimulationApi> SimulationEngine<A> {
    pub fn new(api: A, home_county: impl Into<String>, catalog: Option<Catalog>) -> Self {
        Self {
            api,
            home_county: home_county.into(),
            catalog,
            state: RunState::NotStarted,
            candidates: Vec::new(),
        }
    }

    /// Run the full lifecycle: reset, rank, drain the emergency stream,
    /// stop. Remote-call failures degrade inside the client and never abort
    /// the run.
    pub async fn run(&mut self) -> RunReport {
        if self.state != RunState::NotStarted {
            tracing::warn!("run() called again; an engine drives a single run");
            return RunReport {
                candidates_remaining: self.candidates.len(),
                ..RunReport::default()
            };
        }

        let reset = self.api.reset().await;
        tracing::info!(
            "simulation reset: {}",
            reset.as_deref().unwrap_or("<no response>")
        );
        self.state = RunState::Running;

        let directory = directory::discover_all(&self.api).await;
        tracing::info!("directory holds {} locations", directory.len());

        let home = ranking::epicenter(&directory, &self.home_county);
        let epicenter = Location {
            city: "Epicenter".to_string(),
            county: self.home_county.clone(),
            latitude: home.0,
            longitude: home.1,
            stock: BTreeMap::new(),
        };

        self.candidates =
            ranking::rank_by_proximity(&self.api, epicenter.position(), directory).await;
        tracing::info!(
            "{} candidates survived the inventory filter",
            self.candidates.len()
        );
        self.snapshot_candidates();

        let mut report = RunReport::default();
        while let Some(event) = self.api.next_event().await {
            let outcome = solver::solve(
                &self.api,
                epicenter.position(),
                &self.home_county,
                &event,
                &mut self.candidates,
            )
            .await;
            tracing::info!(
                "emergency in {} resolved: {}",
                event.city,
                outcome.fully_resolved
            );

            report.events_handled += 1;
            if outcome.fully_resolved {
                report.events_resolved += 1;
            }
            // Descending order keeps the collected indices valid as entries
            // are removed.
            for index in outcome.exhausted.into_iter().rev() {
                self.candidates.remove(index);
            }
        }

        let stopped = self.api.stop().await;
        tracing::info!(
            "simulation stopped: {}",
            stopped.as_deref().unwrap_or("<no response>")
        );
        self.state = RunState::Stopped;

        report.candidates_remaining = self.candidates.len();
        report
    }

    /// Best-effort snapshot of the ranked candidates into the catalog;
    /// failures are logged and never reach the decision path.
    fn snapshot_candidates(&self) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        for location in &self.candidates {
            if let Err(error) = catalog.upsert_location(&LocationRow::from_location(location)) {
                tracing::warn!("catalog snapshot for {} failed: {error}", location.city);
            }
        }
    }
}
