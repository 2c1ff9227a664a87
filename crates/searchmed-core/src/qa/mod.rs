//! Document QA over a selected medication's official documents.
//!
//! One QA session: collect document URLs, load and split them, build an
//! ephemeral retrieval index, retrieve the most relevant passages, and ask
//! the model for a grounded answer. Every failure in the chain surfaces as
//! a typed error; a partial answer is never returned.

use searchmed_llm::{make_qa_prompt, EmbeddingModel, LlmClient};

use crate::error::{PipelineError, PipelineResult};
use crate::retrieval::{DocumentLoader, PassageIndex, RetrievalError};
use crate::router::SelectedMedication;

/// Tunables for a QA session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QaConfig {
    /// How many attached documents to load, front of the list first.
    /// Loading every document is slow and rarely improves answers, so the
    /// default is one.
    pub max_documents: usize,
    /// How many passages to hand the model as context.
    pub top_k: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            max_documents: 1,
            top_k: 2,
        }
    }
}

/// Per-call document QA orchestrator.
pub struct DocumentQa<'a> {
    loader: &'a dyn DocumentLoader,
    embedder: &'a dyn EmbeddingModel,
    llm: &'a dyn LlmClient,
    config: QaConfig,
}

impl<'a> DocumentQa<'a> {
    pub fn new(
        loader: &'a dyn DocumentLoader,
        embedder: &'a dyn EmbeddingModel,
        llm: &'a dyn LlmClient,
    ) -> Self {
        Self {
            loader,
            embedder,
            llm,
            config: QaConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QaConfig) -> Self {
        self.config = config;
        self
    }

    /// Answer the user's question from the medication's documents.
    pub fn answer(&self, medication: &SelectedMedication, question: &str) -> PipelineResult<String> {
        let urls: Vec<&str> = medication
            .docs
            .iter()
            .filter_map(|doc| doc.retrieval_url())
            .take(self.config.max_documents)
            .collect();

        if urls.is_empty() {
            return Err(RetrievalError::NoDocuments(medication.nombre.clone()).into());
        }

        let mut passages = Vec::new();
        for url in urls {
            passages.extend(self.loader.load_and_split(url)?);
        }

        let index = PassageIndex::build(self.embedder, passages)?;
        let top = index.query(question, self.config.top_k)?;
        let context = top
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        tracing::debug!(
            nregistro = %medication.nregistro,
            passages = top.len(),
            "asking model with retrieved context"
        );
        self.llm
            .infer(&make_qa_prompt(question, &context))
            .map_err(PipelineError::QaModel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentReference;
    use crate::retrieval::MockDocumentLoader;
    use searchmed_llm::{MockEmbedder, MockLlmClient};

    fn leaflet_doc(url: &str) -> DocumentReference {
        DocumentReference {
            url: Some(url.to_string()),
            ..Default::default()
        }
    }

    fn aspirin(docs: Vec<DocumentReference>) -> SelectedMedication {
        SelectedMedication {
            nregistro: "51347".into(),
            nombre: "ASPIRINA 500 mg".into(),
            docs,
        }
    }

    #[test]
    fn test_answer_grounds_on_loaded_documents() {
        let url = "https://example.org/dochtml/p/51347/Prospecto.html";
        let loader = MockDocumentLoader::new().with_document(
            url,
            &[
                "reacciones adversas frecuentes nauseas",
                "posologia un comprimido cada ocho horas",
            ],
        );
        let embedder = MockEmbedder::new();
        let llm = MockLlmClient::new("Las reacciones adversas más frecuentes son náuseas.");

        let qa = DocumentQa::new(&loader, &embedder, &llm);
        let answer = qa
            .answer(&aspirin(vec![leaflet_doc(url)]), "¿Qué reacciones adversas tiene?")
            .unwrap();

        assert!(answer.contains("náuseas"));
    }

    #[test]
    fn test_document_limit_is_honored() {
        let first = "https://example.org/ft.html";
        let second = "https://example.org/p.html";
        // Only the first document is canned; with max_documents = 1 the
        // second is never fetched, so no error
        let loader = MockDocumentLoader::new().with_document(first, &["texto de la ficha"]);
        let embedder = MockEmbedder::new();
        let llm = MockLlmClient::new("respuesta");

        let qa = DocumentQa::new(&loader, &embedder, &llm);
        let medication = aspirin(vec![leaflet_doc(first), leaflet_doc(second)]);
        assert!(qa.answer(&medication, "pregunta").is_ok());

        // Raising the limit reaches the second, uncanned document
        let qa = DocumentQa::new(&loader, &embedder, &llm).with_config(QaConfig {
            max_documents: 2,
            top_k: 2,
        });
        assert!(matches!(
            qa.answer(&medication, "pregunta"),
            Err(PipelineError::Retrieval(RetrievalError::Fetch { .. }))
        ));
    }

    #[test]
    fn test_medication_without_documents_fails() {
        let loader = MockDocumentLoader::new();
        let embedder = MockEmbedder::new();
        let llm = MockLlmClient::new("respuesta");

        let qa = DocumentQa::new(&loader, &embedder, &llm);
        assert!(matches!(
            qa.answer(&aspirin(vec![]), "pregunta"),
            Err(PipelineError::Retrieval(RetrievalError::NoDocuments(_)))
        ));
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let loader = MockDocumentLoader::unreachable("timeout");
        let embedder = MockEmbedder::new();
        let llm = MockLlmClient::new("respuesta");

        let qa = DocumentQa::new(&loader, &embedder, &llm);
        let medication = aspirin(vec![leaflet_doc("https://example.org/p.html")]);
        assert!(matches!(
            qa.answer(&medication, "pregunta"),
            Err(PipelineError::Retrieval(RetrievalError::Fetch { .. }))
        ));
    }

    #[test]
    fn test_model_failure_is_qa_unavailable() {
        let url = "https://example.org/p.html";
        let loader = MockDocumentLoader::new().with_document(url, &["texto"]);
        let embedder = MockEmbedder::new();
        let llm = MockLlmClient::unreachable("connection refused");

        let qa = DocumentQa::new(&loader, &embedder, &llm);
        assert!(matches!(
            qa.answer(&aspirin(vec![leaflet_doc(url)]), "pregunta"),
            Err(PipelineError::QaModel(_))
        ));
    }
}
