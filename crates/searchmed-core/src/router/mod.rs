//! Query routing pipeline.
//!
//! Pipeline: Normalization → Intent Classification → Slot Extraction →
//! Registry Dispatch. The [`Intent`] enum drives a single typed dispatch:
//! each arm owns its schema and its registry endpoint, so intent, schema
//! and endpoint can never disagree.

mod classifier;
mod normalizer;
mod selector;

pub use classifier::*;
pub use normalizer::*;
pub use selector::*;

use searchmed_llm::{extract_slots, LlmClient};

use crate::error::PipelineResult;
use crate::models::{Medication, MedicamentoQuery, MedicamentosQuery, MedicationSummary};
use crate::registry::RegistryApi;

/// What the registry returned for a routed query.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// One record from the single-record endpoint.
    Single(Medication),
    /// Zero or more summaries from the search endpoint, plus the extracted
    /// name filter for selection policies that rank by name.
    Matches {
        hint: Option<String>,
        summaries: Vec<MedicationSummary>,
    },
}

/// A classified, extracted and dispatched query.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedQuery {
    pub intent: Intent,
    pub outcome: DispatchOutcome,
}

/// Coordinates classification, extraction and registry dispatch.
pub struct Router<'a> {
    llm: &'a dyn LlmClient,
    registry: &'a dyn RegistryApi,
}

impl<'a> Router<'a> {
    pub fn new(llm: &'a dyn LlmClient, registry: &'a dyn RegistryApi) -> Self {
        Self { llm, registry }
    }

    /// Route one user query: exactly one extraction call and exactly one
    /// registry call, both determined by the classified intent.
    pub fn route(&self, user_query: &str) -> PipelineResult<RoutedQuery> {
        let normalized = normalize(user_query);
        let intent = classify(&normalized);
        tracing::debug!(?intent, "query classified");

        let outcome = match intent {
            Intent::SpecificLookup => {
                let params: MedicamentoQuery = extract_slots(self.llm, user_query)?;
                tracing::debug!(?params, "identifier parameters extracted");
                let record = self.registry.fetch_by_identifier(&params)?;
                DispatchOutcome::Single(record)
            }
            Intent::DescriptiveSearch => {
                let params: MedicamentosQuery = extract_slots(self.llm, user_query)?;
                if params.is_empty() {
                    tracing::warn!("no filters extracted; refusing unbounded registry search");
                    return Err(crate::error::PipelineError::UnboundedSearch);
                }
                tracing::debug!(?params, "search filters extracted");
                let hint = params.nombre.clone();
                let summaries = self.registry.search_by_criteria(&params)?;
                DispatchOutcome::Matches { hint, summaries }
            }
        };

        Ok(RoutedQuery { intent, outcome })
    }
}
