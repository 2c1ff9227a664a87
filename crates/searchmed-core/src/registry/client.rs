//! Blocking HTTP client for the CIMA registry REST API.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{RegistryApi, RegistryError, RegistryResult};
use crate::models::{Medication, MedicamentoQuery, MedicamentosQuery, MedicationSummary, Presentation};

/// Base URL of the public CIMA REST API.
pub const CIMA_BASE_URL: &str = "https://cima.aemps.es/cima/rest";

/// Blocking registry client.
pub struct CimaClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl CimaClient {
    /// Create a client against a registry instance.
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// The public CIMA instance with a 30-second timeout.
    pub fn default_remote() -> Self {
        Self::new(CIMA_BASE_URL, 30)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        pairs: &[(&'static str, String)],
    ) -> RegistryResult<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, params = %format_pairs(pairs), "registry request");

        let response = self
            .client
            .get(&url)
            .query(pairs)
            .send()
            .map_err(|e| RegistryError::Unavailable {
                endpoint: endpoint.to_string(),
                params: format_pairs(pairs),
                cause: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(RegistryError::NotFound);
        }
        if !status.is_success() {
            return Err(RegistryError::Status {
                endpoint: endpoint.to_string(),
                params: format_pairs(pairs),
                status: status.as_u16(),
            });
        }

        response.json().map_err(|e| RegistryError::Decoding {
            endpoint: endpoint.to_string(),
            cause: e.to_string(),
        })
    }
}

/// Render sparse query pairs for error context and logging.
pub(crate) fn format_pairs(pairs: &[(&'static str, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Envelope of the multi-record search endpoint.
#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resultados: Vec<MedicationSummary>,
}

impl RegistryApi for CimaClient {
    fn fetch_by_identifier(&self, params: &MedicamentoQuery) -> RegistryResult<Medication> {
        self.get_json("medicamento", &params.query_pairs())
    }

    fn search_by_criteria(
        &self,
        params: &MedicamentosQuery,
    ) -> RegistryResult<Vec<MedicationSummary>> {
        let response: SearchResponse = self.get_json("medicamentos", &params.query_pairs())?;
        Ok(response.resultados)
    }

    fn fetch_presentation(&self, national_code: &str) -> RegistryResult<Presentation> {
        self.get_json("presentacion", &[("codNacional", national_code.to_string())])
    }
}
