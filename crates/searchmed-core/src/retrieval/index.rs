//! In-memory cosine-similarity passage index.

use searchmed_llm::EmbeddingModel;

use super::{Passage, RetrievalError, RetrievalResult};

/// Ephemeral retrieval index over one medication's passages.
///
/// Built fresh per QA call and dropped with it; never shared across
/// queries.
pub struct PassageIndex<'a> {
    embedder: &'a dyn EmbeddingModel,
    entries: Vec<(Vec<f32>, Passage)>,
}

impl<'a> PassageIndex<'a> {
    /// Embed every passage and build the index.
    pub fn build(embedder: &'a dyn EmbeddingModel, passages: Vec<Passage>) -> RetrievalResult<Self> {
        if passages.is_empty() {
            return Err(RetrievalError::EmptyIndex);
        }

        let mut entries = Vec::with_capacity(passages.len());
        for passage in passages {
            let embedding = embedder.embed(&passage.content)?;
            entries.push((embedding, passage));
        }
        tracing::debug!(passages = entries.len(), "retrieval index built");
        Ok(Self { embedder, entries })
    }

    /// The `top_k` passages most similar to the question.
    pub fn query(&self, question: &str, top_k: usize) -> RetrievalResult<Vec<&Passage>> {
        let query_embedding = self.embedder.embed(question)?;

        let mut scored: Vec<(f32, &Passage)> = self
            .entries
            .iter()
            .map(|(embedding, passage)| (cosine_similarity(&query_embedding, embedding), passage))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored.into_iter().take(top_k).map(|(_, p)| p).collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchmed_llm::MockEmbedder;

    fn passage(index: usize, content: &str) -> Passage {
        Passage {
            source_url: "https://example.org/prospecto.html".to_string(),
            content: content.to_string(),
            index,
        }
    }

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.01);
    }

    #[test]
    fn test_cosine_similarity_mismatched_lengths() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_query_returns_top_k_most_similar() {
        let embedder = MockEmbedder::new();
        let index = PassageIndex::build(
            &embedder,
            vec![
                passage(0, "reacciones adversas frecuentes nauseas vomitos"),
                passage(1, "posologia y forma de administracion"),
                passage(2, "las reacciones adversas graves son raras"),
            ],
        )
        .unwrap();

        let top = index.query("reacciones adversas", 2).unwrap();
        assert_eq!(top.len(), 2);
        let picked: Vec<usize> = top.iter().map(|p| p.index).collect();
        assert!(picked.contains(&0));
        assert!(picked.contains(&2));
    }

    #[test]
    fn test_top_k_larger_than_index_returns_all() {
        let embedder = MockEmbedder::new();
        let index = PassageIndex::build(&embedder, vec![passage(0, "solo uno")]).unwrap();
        assert_eq!(index.query("cualquier cosa", 5).unwrap().len(), 1);
        assert_eq!(index.len(), 1);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_build_with_no_passages_fails() {
        let embedder = MockEmbedder::new();
        assert!(matches!(
            PassageIndex::build(&embedder, vec![]),
            Err(RetrievalError::EmptyIndex)
        ));
    }

    #[test]
    fn test_embedding_failure_propagates() {
        let embedder = MockEmbedder::unreachable("down");
        assert!(matches!(
            PassageIndex::build(&embedder, vec![passage(0, "texto")]),
            Err(RetrievalError::Embedding(_))
        ));
    }
}
