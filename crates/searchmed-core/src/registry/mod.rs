//! Pharmaceutical-registry access.
//!
//! The registry is an opaque remote service consumed through the
//! [`RegistryApi`] trait: one single-record lookup, one multi-record
//! search, and the presentation lookup for pack-level follow-ups. The
//! trait keeps the pipeline testable against [`MockRegistry`], which
//! records the exact parameter set each call sent.

mod client;

pub use client::*;

use std::cell::RefCell;

use thiserror::Error;

use crate::models::{Medication, MedicamentoQuery, MedicamentosQuery, MedicationSummary, Presentation};

/// Registry errors.
///
/// `Unavailable`/`Status`/`Decoding` carry the endpoint and the sent
/// parameters so the caller can decide retry vs. abort; `NotFound` means
/// the call succeeded but no record matches.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry request to {endpoint} failed ({params}): {cause}")]
    Unavailable {
        endpoint: String,
        params: String,
        cause: String,
    },

    #[error("registry returned HTTP {status} from {endpoint} ({params})")]
    Status {
        endpoint: String,
        params: String,
        status: u16,
    },

    #[error("registry response from {endpoint} could not be decoded: {cause}")]
    Decoding { endpoint: String, cause: String },

    #[error("no medication matches the supplied identifier")]
    NotFound,
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registry capability consumed by the dispatcher.
pub trait RegistryApi {
    /// Single-record fetch by national code and/or registration number.
    fn fetch_by_identifier(&self, params: &MedicamentoQuery) -> RegistryResult<Medication>;

    /// Multi-record search by descriptive criteria.
    fn search_by_criteria(&self, params: &MedicamentosQuery)
        -> RegistryResult<Vec<MedicationSummary>>;

    /// Presentation (pack) lookup by national code.
    fn fetch_presentation(&self, national_code: &str) -> RegistryResult<Presentation>;
}

/// A call observed by [`MockRegistry`], with the exact parameter set sent.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    FetchByIdentifier(Vec<(String, String)>),
    SearchByCriteria(Vec<(String, String)>),
    FetchPresentation(String),
}

/// Mock registry for testing — canned outcomes plus a call recorder.
pub struct MockRegistry {
    medication: Option<Medication>,
    summaries: Vec<MedicationSummary>,
    presentation: Option<Presentation>,
    unreachable: Option<String>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl MockRegistry {
    /// A registry that knows nothing: lookups miss, searches are empty.
    pub fn new() -> Self {
        Self {
            medication: None,
            summaries: Vec::new(),
            presentation: None,
            unreachable: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_medication(mut self, medication: Medication) -> Self {
        self.medication = Some(medication);
        self
    }

    pub fn with_summaries(mut self, summaries: Vec<MedicationSummary>) -> Self {
        self.summaries = summaries;
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = Some(presentation);
        self
    }

    /// A registry whose every call fails as unreachable.
    pub fn unreachable(cause: &str) -> Self {
        Self {
            unreachable: Some(cause.to_string()),
            ..Self::new()
        }
    }

    /// The calls observed so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    fn fail_if_unreachable(&self, endpoint: &str, params: &str) -> RegistryResult<()> {
        if let Some(cause) = &self.unreachable {
            return Err(RegistryError::Unavailable {
                endpoint: endpoint.to_string(),
                params: params.to_string(),
                cause: cause.clone(),
            });
        }
        Ok(())
    }
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn owned_pairs(pairs: &[(&'static str, String)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

impl RegistryApi for MockRegistry {
    fn fetch_by_identifier(&self, params: &MedicamentoQuery) -> RegistryResult<Medication> {
        let pairs = params.query_pairs();
        self.calls
            .borrow_mut()
            .push(RecordedCall::FetchByIdentifier(owned_pairs(&pairs)));
        self.fail_if_unreachable("medicamento", &format_pairs(&pairs))?;
        self.medication.clone().ok_or(RegistryError::NotFound)
    }

    fn search_by_criteria(
        &self,
        params: &MedicamentosQuery,
    ) -> RegistryResult<Vec<MedicationSummary>> {
        let pairs = params.query_pairs();
        self.calls
            .borrow_mut()
            .push(RecordedCall::SearchByCriteria(owned_pairs(&pairs)));
        self.fail_if_unreachable("medicamentos", &format_pairs(&pairs))?;
        Ok(self.summaries.clone())
    }

    fn fetch_presentation(&self, national_code: &str) -> RegistryResult<Presentation> {
        self.calls
            .borrow_mut()
            .push(RecordedCall::FetchPresentation(national_code.to_string()));
        self.fail_if_unreachable("presentacion", national_code)?;
        self.presentation.clone().ok_or(RegistryError::NotFound)
    }
}
