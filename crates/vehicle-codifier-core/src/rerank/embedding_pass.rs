//! Reranker Pass B — embedding rescoring (C8B).
//!
//! Embeds the query description once, compares it against every candidate
//! that carries a catalog embedding, and cuts the list down to the top-N by
//! similarity before it reaches the LLM rescorer. Candidates without an
//! embedding, or any failure of the embedding service itself, degrade to a
//! similarity score of `0.0` rather than failing the match.

use crate::embedding::EmbeddingProvider;
use crate::math::cosine_to_unit_similarity;
use crate::types::Candidate;

/// Score every candidate by cosine similarity to the query embedding, then
/// truncate to `top_n` by `similarity_score` descending. Candidates past
/// the cut retain their score but are dropped from the returned list —
/// they are no longer eligible to become the final match (spec.md §4.8).
pub async fn score_and_truncate(
    description: &str,
    mut candidates: Vec<Candidate>,
    embedder: Option<&dyn EmbeddingProvider>,
    top_n: usize,
) -> Vec<Candidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let query_embedding = match embedder {
        Some(provider) => provider.embed(description).await.ok(),
        None => None,
    };

    match &query_embedding {
        Some(query) => {
            for candidate in candidates.iter_mut() {
                candidate.similarity_score = candidate
                    .embedding
                    .as_deref()
                    .map(|e| cosine_to_unit_similarity(query, e))
                    .unwrap_or(0.0);
            }
            candidates.sort_by(|a, b| b.similarity_score.partial_cmp(&a.similarity_score).unwrap());
        }
        None => {
            // No usable embedding (absent provider or a failed call): every
            // similarity_score degrades to 0.0, so sorting by it would just
            // preserve filter order. Keep the top-N by fuzzy_score instead
            // (spec.md §4.8: rescore the top 20 by fuzzy_score on degrade).
            for candidate in candidates.iter_mut() {
                candidate.similarity_score = 0.0;
            }
            candidates.sort_by(|a, b| b.fuzzy_score.partial_cmp(&a.fuzzy_score).unwrap());
        }
    }

    candidates.truncate(top_n);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::types::CatalogRecord;
    use async_trait::async_trait;

    fn candidate(cvegs: &str, embedding: Option<Vec<f32>>) -> Candidate {
        Candidate::from_record(&CatalogRecord {
            cvegs: cvegs.to_string(),
            marca: "toyota".to_string(),
            submarca: "yaris".to_string(),
            tipveh: "auto".to_string(),
            modelo: 2022,
            descveh: "toyota yaris".to_string(),
            embedding,
            catalog_version: 1,
        })
    }

    struct StubEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, PipelineError> {
            Ok(self.0.clone())
        }
        fn dimension(&self) -> usize {
            self.0.len()
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, PipelineError> {
            Err(PipelineError::EmbeddingUnavailable { message: "down".to_string() })
        }
        fn dimension(&self) -> usize {
            8
        }
    }

    #[tokio::test]
    async fn ranks_by_cosine_similarity() {
        let candidates = vec![
            candidate("close", Some(vec![1.0, 0.0])),
            candidate("far", Some(vec![0.0, 1.0])),
        ];
        let embedder = StubEmbedder(vec![1.0, 0.0]);
        let ranked = score_and_truncate("query", candidates, Some(&embedder), 10).await;
        assert_eq!(ranked[0].cvegs, "close");
        assert!(ranked[0].similarity_score > ranked[1].similarity_score);
    }

    #[tokio::test]
    async fn candidates_without_embedding_score_zero() {
        let candidates = vec![candidate("no-embedding", None)];
        let embedder = StubEmbedder(vec![1.0, 0.0]);
        let ranked = score_and_truncate("query", candidates, Some(&embedder), 10).await;
        assert_eq!(ranked[0].similarity_score, 0.0);
    }

    #[tokio::test]
    async fn embedding_service_failure_degrades_to_all_zero() {
        let candidates = vec![candidate("a", Some(vec![1.0, 0.0])), candidate("b", Some(vec![0.0, 1.0]))];
        let ranked = score_and_truncate("query", candidates, Some(&FailingEmbedder), 10).await;
        assert!(ranked.iter().all(|c| c.similarity_score == 0.0));
    }

    #[tokio::test]
    async fn truncates_to_top_n() {
        let candidates: Vec<Candidate> = (0..30)
            .map(|i| candidate(&format!("c{i}"), Some(vec![1.0, i as f32])))
            .collect();
        let embedder = StubEmbedder(vec![1.0, 0.0]);
        let ranked = score_and_truncate("query", candidates, Some(&embedder), 20).await;
        assert_eq!(ranked.len(), 20);
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let ranked = score_and_truncate("query", vec![], None, 20).await;
        assert!(ranked.is_empty());
    }
}
