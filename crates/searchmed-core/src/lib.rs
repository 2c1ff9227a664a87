//! SearchMed Core Library
//!
//! Query router and slot-filling extractor between free-text medication
//! questions and the pharmaceutical-registry API, with retrieval-augmented
//! QA over the selected medication's official documents.
//!
//! # Architecture
//!
//! ```text
//! User query
//!     │
//!     ▼
//! Normalization ──► Intent Classification
//!                          │
//!          ┌───────────────┴───────────────┐
//!          ▼                               ▼
//!   SpecificLookup                  DescriptiveSearch
//!   slot-fill {cn, nregistro}       slot-fill {nombre, laboratorio, practiv1}
//!          │                               │
//!          ▼                               ▼
//!   GET /medicamento                GET /medicamentos
//!   (one record)                    (many summaries)
//!          │                               │
//!          └───────────────┬───────────────┘
//!                          ▼
//!                  Result Selection
//!                          │
//!                          ▼
//!                    Document QA
//!        load docs → split → embed → top-k → grounded answer
//! ```
//!
//! # Core principle
//!
//! **Every stage fails loudly.** Malformed model output, registry misses,
//! unreachable services and empty searches each surface as a distinct
//! [`PipelineError`]; the pipeline never substitutes an absent answer.
//!
//! # Modules
//!
//! - [`models`]: registry record and query-parameter types
//! - [`router`]: normalization, classification, extraction, dispatch, selection
//! - [`registry`]: registry API trait, blocking CIMA client, mock
//! - [`retrieval`]: document loading and the ephemeral passage index
//! - [`qa`]: per-call document QA orchestration
//! - [`error`]: pipeline error taxonomy and user-facing messages

pub mod error;
pub mod models;
pub mod qa;
pub mod registry;
pub mod retrieval;
pub mod router;

// Re-export commonly used types
pub use error::{PipelineError, PipelineResult};
pub use models::{
    DocumentKind, DocumentReference, Medication, MedicamentoQuery, MedicamentosQuery,
    MedicationSummary,
};
pub use qa::{DocumentQa, QaConfig};
pub use registry::{CimaClient, RegistryApi, RegistryError};
pub use retrieval::{DocumentLoader, HttpDocumentLoader, Passage, PassageIndex, RetrievalError};
pub use router::{
    classify, normalize, select, DispatchOutcome, Intent, RoutedQuery, Router, SelectedMedication,
    SelectionPolicy,
};

use searchmed_llm::{EmbeddingModel, LlmClient};

/// The SearchMed pipeline: the single entry point a front end needs.
///
/// Holds references to the four external capabilities; each
/// [`answer_question`](SearchMed::answer_question) call runs one strictly
/// sequential pipeline and owns all of its intermediate state, so
/// concurrent queries share nothing mutable.
pub struct SearchMed<'a> {
    llm: &'a dyn LlmClient,
    embedder: &'a dyn EmbeddingModel,
    registry: &'a dyn RegistryApi,
    loader: &'a dyn DocumentLoader,
    selection: SelectionPolicy,
    qa_config: QaConfig,
}

impl<'a> SearchMed<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        embedder: &'a dyn EmbeddingModel,
        registry: &'a dyn RegistryApi,
        loader: &'a dyn DocumentLoader,
    ) -> Self {
        Self {
            llm,
            embedder,
            registry,
            loader,
            selection: SelectionPolicy::default(),
            qa_config: QaConfig::default(),
        }
    }

    /// Override how one medication is picked from a multi-record search.
    pub fn with_selection_policy(mut self, selection: SelectionPolicy) -> Self {
        self.selection = selection;
        self
    }

    /// Override document and passage limits for QA.
    pub fn with_qa_config(mut self, qa_config: QaConfig) -> Self {
        self.qa_config = qa_config;
        self
    }

    /// Answer a free-text medication question.
    ///
    /// Use [`PipelineError::user_message`] on the error to obtain the
    /// user-facing outcome.
    pub fn answer_question(&self, user_query: &str) -> PipelineResult<String> {
        tracing::info!(chars = user_query.len(), "answering medication query");

        let routed = Router::new(self.llm, self.registry).route(user_query)?;
        let selected = select(routed.outcome, self.selection)?;
        tracing::debug!(
            nregistro = %selected.nregistro,
            nombre = %selected.nombre,
            "medication selected for document QA"
        );

        DocumentQa::new(self.loader, self.embedder, self.llm)
            .with_config(self.qa_config)
            .answer(&selected, user_query)
    }
}
