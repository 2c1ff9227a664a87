//! Candidate selection over dispatch results.
//!
//! The search endpoint can return many summaries but document QA runs
//! against exactly one medication. The default policy takes the first
//! result as the registry returned it; `BestNameMatch` is the opt-in
//! alternative that ranks candidates against the extracted name filter.

use strsim::jaro_winkler;

use super::DispatchOutcome;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{DocumentReference, Medication, MedicationSummary};

/// How to pick one medication out of a multi-record search result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Take the first result, as the registry returned it.
    #[default]
    FirstResult,
    /// Take the result whose name is closest (Jaro-Winkler) to the
    /// extracted name filter; falls back to first when no filter exists.
    BestNameMatch,
}

/// The medication chosen to drive document QA.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedMedication {
    pub nregistro: String,
    pub nombre: String,
    pub docs: Vec<DocumentReference>,
}

impl From<Medication> for SelectedMedication {
    fn from(record: Medication) -> Self {
        Self {
            nregistro: record.nregistro,
            nombre: record.nombre,
            docs: record.docs,
        }
    }
}

impl From<MedicationSummary> for SelectedMedication {
    fn from(summary: MedicationSummary) -> Self {
        Self {
            nregistro: summary.nregistro,
            nombre: summary.nombre,
            docs: summary.docs,
        }
    }
}

/// Reduce a dispatch outcome to exactly one medication.
///
/// An empty search result is a terminal no-match error, never an empty
/// record.
pub fn select(outcome: DispatchOutcome, policy: SelectionPolicy) -> PipelineResult<SelectedMedication> {
    match outcome {
        DispatchOutcome::Single(record) => Ok(record.into()),
        DispatchOutcome::Matches { summaries, .. } if summaries.is_empty() => {
            Err(PipelineError::EmptySearch)
        }
        DispatchOutcome::Matches { hint, mut summaries } => {
            let chosen = match (policy, hint) {
                (SelectionPolicy::BestNameMatch, Some(hint)) => {
                    let target = hint.to_lowercase();
                    let best = summaries
                        .iter()
                        .enumerate()
                        .max_by(|(_, a), (_, b)| {
                            let sa = jaro_winkler(&target, &a.nombre.to_lowercase());
                            let sb = jaro_winkler(&target, &b.nombre.to_lowercase());
                            sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    summaries.swap_remove(best)
                }
                _ => summaries.swap_remove(0),
            };
            tracing::debug!(nregistro = %chosen.nregistro, ?policy, "candidate selected");
            Ok(chosen.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(nregistro: &str, nombre: &str) -> MedicationSummary {
        serde_json::from_value(serde_json::json!({
            "nregistro": nregistro,
            "nombre": nombre,
        }))
        .unwrap()
    }

    #[test]
    fn test_single_record_passes_through() {
        let record: Medication =
            serde_json::from_str(r#"{"nregistro": "51347", "nombre": "ASPIRINA 500 mg"}"#).unwrap();
        let selected = select(DispatchOutcome::Single(record), SelectionPolicy::FirstResult).unwrap();
        assert_eq!(selected.nregistro, "51347");
    }

    #[test]
    fn test_first_result_policy_takes_head() {
        let outcome = DispatchOutcome::Matches {
            hint: Some("aspirina".into()),
            summaries: vec![
                summary("1", "ASPIRINA INFANTIL"),
                summary("2", "ASPIRINA 500 mg"),
            ],
        };
        let selected = select(outcome, SelectionPolicy::FirstResult).unwrap();
        assert_eq!(selected.nregistro, "1");
    }

    #[test]
    fn test_best_name_match_ranks_against_hint() {
        let outcome = DispatchOutcome::Matches {
            hint: Some("aspirina".into()),
            summaries: vec![
                summary("1", "ACIDO ACETILSALICILICO CINFA"),
                summary("2", "ASPIRINA 500 mg"),
            ],
        };
        let selected = select(outcome, SelectionPolicy::BestNameMatch).unwrap();
        assert_eq!(selected.nregistro, "2");
    }

    #[test]
    fn test_best_name_match_without_hint_takes_head() {
        let outcome = DispatchOutcome::Matches {
            hint: None,
            summaries: vec![summary("1", "UNO"), summary("2", "DOS")],
        };
        let selected = select(outcome, SelectionPolicy::BestNameMatch).unwrap();
        assert_eq!(selected.nregistro, "1");
    }

    #[test]
    fn test_empty_search_is_terminal_no_match() {
        let outcome = DispatchOutcome::Matches {
            hint: Some("inventado".into()),
            summaries: vec![],
        };
        assert!(matches!(
            select(outcome, SelectionPolicy::FirstResult),
            Err(PipelineError::EmptySearch)
        ));
    }
}
