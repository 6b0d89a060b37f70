//! Generic staged candidate pipeline.
//!
//! Stage order:
//! query hydrators → sources → hydrators → filters → scorers → selector →
//! post-selection hydrators → post-selection filters → side effects.
//!
//! A component that fails is logged and skipped; the candidates it was
//! given pass through unchanged. Components never see each other's errors.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

use crate::filter::Filter;
use crate::hydrator::Hydrator;
use crate::query_hydrator::QueryHydrator;
use crate::scorer::Scorer;
use crate::selector::Selector;
use crate::side_effect::{SideEffect, SideEffectInput};
use crate::source::Source;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    QueryHydrator,
    Source,
    Hydrator,
    Filter,
    Scorer,
    PostSelectionHydrator,
    PostSelectionFilter,
    SideEffect,
}

/// Everything a pipeline run produced.
pub struct PipelineResult<Q, C> {
    /// Candidates after hydration, before any filter.
    pub retrieved_candidates: Vec<C>,
    /// Candidates removed by filters, in the order they were removed.
    pub filtered_candidates: Vec<C>,
    /// Final, ordered output.
    pub selected_candidates: Vec<C>,
    pub query: Arc<Q>,
}

/// Queries carry a request id so every log line of a run can be correlated.
pub trait HasRequestId {
    fn request_id(&self) -> &str;
}

#[async_trait]
pub trait CandidatePipeline<Q, C>: Send + Sync
where
    Q: HasRequestId + Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn query_hydrators(&self) -> &[Box<dyn QueryHydrator<Q>>];
    fn sources(&self) -> &[Box<dyn Source<Q, C>>];
    fn hydrators(&self) -> &[Box<dyn Hydrator<Q, C>>];
    fn filters(&self) -> &[Box<dyn Filter<Q, C>>];
    fn scorers(&self) -> &[Box<dyn Scorer<Q, C>>];
    fn selector(&self) -> &dyn Selector<Q, C>;
    fn post_selection_hydrators(&self) -> &[Box<dyn Hydrator<Q, C>>];
    fn post_selection_filters(&self) -> &[Box<dyn Filter<Q, C>>];
    fn side_effects(&self) -> Arc<Vec<Box<dyn SideEffect<Q, C>>>>;
    fn result_size(&self) -> usize;

    async fn execute(&self, query: Q) -> PipelineResult<Q, C> {
        let hydrated_query = self.hydrate_query(query).await;

        let candidates = self.fetch_candidates(&hydrated_query).await;
        let hydrated_candidates = self
            .run_hydrators(&hydrated_query, candidates, self.hydrators(), PipelineStage::Hydrator)
            .await;

        let (kept, mut filtered_candidates) = self
            .run_filters(
                &hydrated_query,
                hydrated_candidates.clone(),
                self.filters(),
                PipelineStage::Filter,
            )
            .await;

        let scored = self.score(&hydrated_query, kept).await;
        let selected = self.select(&hydrated_query, scored);

        let post_hydrated = self
            .run_hydrators(
                &hydrated_query,
                selected,
                self.post_selection_hydrators(),
                PipelineStage::PostSelectionHydrator,
            )
            .await;
        let (mut final_candidates, post_filtered) = self
            .run_filters(
                &hydrated_query,
                post_hydrated,
                self.post_selection_filters(),
                PipelineStage::PostSelectionFilter,
            )
            .await;
        filtered_candidates.extend(post_filtered);
        final_candidates.truncate(self.result_size());

        log::info!(
            "request_id={} retrieved={} filtered={} selected={}",
            hydrated_query.request_id(),
            hydrated_candidates.len(),
            filtered_candidates.len(),
            final_candidates.len()
        );

        let query = Arc::new(hydrated_query);
        self.run_side_effects(Arc::new(SideEffectInput {
            query: Arc::clone(&query),
            selected_candidates: final_candidates.clone(),
            removed_count: filtered_candidates.len(),
        }));

        PipelineResult {
            retrieved_candidates: hydrated_candidates,
            filtered_candidates,
            selected_candidates: final_candidates,
            query,
        }
    }

    /// Run all enabled query hydrators concurrently, then merge their fields.
    async fn hydrate_query(&self, query: Q) -> Q {
        let hydrators: Vec<_> = self
            .query_hydrators()
            .iter()
            .filter(|h| h.enable(&query))
            .collect();
        let results = join_all(hydrators.iter().map(|h| h.hydrate(&query))).await;

        let mut hydrated = query.clone();
        for (hydrator, result) in hydrators.iter().zip(results) {
            match result {
                Ok(h) => hydrator.update(&mut hydrated, h),
                Err(err) => log::error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    PipelineStage::QueryHydrator,
                    hydrator.name(),
                    err
                ),
            }
        }
        hydrated
    }

    /// Run all enabled sources concurrently and concatenate their output.
    async fn fetch_candidates(&self, query: &Q) -> Vec<C> {
        let sources: Vec<_> = self.sources().iter().filter(|s| s.enable(query)).collect();
        let results = join_all(sources.iter().map(|s| s.get_candidates(query))).await;

        let mut collected = Vec::new();
        for (source, result) in sources.iter().zip(results) {
            match result {
                Ok(mut candidates) => {
                    log::debug!(
                        "request_id={} stage={:?} component={} fetched {} candidates",
                        query.request_id(),
                        PipelineStage::Source,
                        source.name(),
                        candidates.len()
                    );
                    collected.append(&mut candidates);
                }
                Err(err) => log::error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    PipelineStage::Source,
                    source.name(),
                    err
                ),
            }
        }
        collected
    }

    /// Run hydrators concurrently over the same input and merge each result
    /// whose length matches.
    async fn run_hydrators(
        &self,
        query: &Q,
        mut candidates: Vec<C>,
        hydrators: &[Box<dyn Hydrator<Q, C>>],
        stage: PipelineStage,
    ) -> Vec<C> {
        let hydrators: Vec<_> = hydrators.iter().filter(|h| h.enable(query)).collect();
        let results = join_all(hydrators.iter().map(|h| h.hydrate(query, &candidates))).await;

        let expected = candidates.len();
        for (hydrator, result) in hydrators.iter().zip(results) {
            match result {
                Ok(hydrated) if hydrated.len() == expected => {
                    hydrator.update_all(&mut candidates, hydrated);
                }
                Ok(hydrated) => log::warn!(
                    "request_id={} stage={:?} component={} returned {} candidates, expected {}; ignored",
                    query.request_id(),
                    stage,
                    hydrator.name(),
                    hydrated.len(),
                    expected
                ),
                Err(err) => log::error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    stage,
                    hydrator.name(),
                    err
                ),
            }
        }
        candidates
    }

    /// Apply filters in order. Returns (kept, removed).
    async fn run_filters(
        &self,
        query: &Q,
        candidates: Vec<C>,
        filters: &[Box<dyn Filter<Q, C>>],
        stage: PipelineStage,
    ) -> (Vec<C>, Vec<C>) {
        let mut kept = candidates;
        let mut removed = Vec::new();

        for filter in filters.iter().filter(|f| f.enable(query)) {
            let backup = kept.clone();
            match filter.filter(query, kept).await {
                Ok(result) => {
                    log::debug!(
                        "request_id={} stage={:?} component={} kept={} removed={}",
                        query.request_id(),
                        stage,
                        filter.name(),
                        result.kept.len(),
                        result.removed.len()
                    );
                    kept = result.kept;
                    removed.extend(result.removed);
                }
                Err(err) => {
                    log::error!(
                        "request_id={} stage={:?} component={} failed: {}",
                        query.request_id(),
                        stage,
                        filter.name(),
                        err
                    );
                    kept = backup;
                }
            }
        }
        (kept, removed)
    }

    /// Apply scorers in order; each sees the previous scorer's output.
    async fn score(&self, query: &Q, mut candidates: Vec<C>) -> Vec<C> {
        let expected = candidates.len();
        for scorer in self.scorers().iter().filter(|s| s.enable(query)) {
            match scorer.score(query, &candidates).await {
                Ok(scored) if scored.len() == expected => scorer.update_all(&mut candidates, scored),
                Ok(scored) => log::warn!(
                    "request_id={} stage={:?} component={} returned {} candidates, expected {}; ignored",
                    query.request_id(),
                    PipelineStage::Scorer,
                    scorer.name(),
                    scored.len(),
                    expected
                ),
                Err(err) => log::error!(
                    "request_id={} stage={:?} component={} failed: {}",
                    query.request_id(),
                    PipelineStage::Scorer,
                    scorer.name(),
                    err
                ),
            }
        }
        candidates
    }

    fn select(&self, query: &Q, candidates: Vec<C>) -> Vec<C> {
        let selector = self.selector();
        if selector.enable(query) {
            selector.select(query, candidates)
        } else {
            candidates
        }
    }

    /// Spawn every enabled side effect on the tokio runtime.
    fn run_side_effects(&self, input: Arc<SideEffectInput<Q, C>>) {
        let side_effects = self.side_effects();
        tokio::spawn(async move {
            for side_effect in side_effects.iter() {
                if !side_effect.enable(Arc::clone(&input.query)) {
                    continue;
                }
                if let Err(err) = side_effect.run(Arc::clone(&input)).await {
                    log::error!(
                        "request_id={} stage={:?} component={} failed: {}",
                        input.query.request_id(),
                        PipelineStage::SideEffect,
                        side_effect.name(),
                        err
                    );
                }
            }
        });
    }
}
