//! Pipeline error taxonomy.
//!
//! Every stage converts its underlying I/O and parse failures into these
//! explicit values; nothing prints diagnostics or collapses failures into
//! an absent answer. [`PipelineError::user_message`] buckets the taxonomy
//! into the three user-visible outcomes.

use thiserror::Error;

use searchmed_llm::{ExtractionError, LlmError};

use crate::registry::RegistryError;
use crate::retrieval::RetrievalError;

/// Errors surfaced by the SearchMed pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("parameter extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(RegistryError),

    #[error("no medication matches the supplied identifier")]
    NotFound,

    #[error("the search returned no medications")]
    EmptySearch,

    #[error("descriptive search carried no usable filters")]
    UnboundedSearch,

    #[error("document retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("answer generation failed: {0}")]
    QaModel(LlmError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<RegistryError> for PipelineError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound => PipelineError::NotFound,
            other => PipelineError::RegistryUnavailable(other),
        }
    }
}

impl PipelineError {
    /// The user-facing message for this failure.
    ///
    /// Distinguishes "nothing matched" from "could not understand the
    /// query" from "service unavailable".
    pub fn user_message(&self) -> &'static str {
        match self {
            PipelineError::NotFound | PipelineError::EmptySearch => {
                "No he encontrado ningún medicamento que coincida con tu consulta."
            }
            PipelineError::Extraction(ExtractionError::Inference(_)) => {
                "El servicio no está disponible en este momento. Inténtalo de nuevo más tarde."
            }
            PipelineError::Extraction(_) | PipelineError::UnboundedSearch => {
                "No he podido interpretar tu consulta. Indica el medicamento, su código nacional o sus características."
            }
            PipelineError::RegistryUnavailable(_)
            | PipelineError::Retrieval(_)
            | PipelineError::QaModel(_) => {
                "El servicio no está disponible en este momento. Inténtalo de nuevo más tarde."
            }
        }
    }
}
