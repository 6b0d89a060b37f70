use async_trait::async_trait;

use crate::util;

/// Partition of a candidate list produced by a filter.
pub struct FilterResult<C> {
    /// Candidates that continue to the next stage.
    pub kept: Vec<C>,
    /// Candidates excluded from every later stage.
    pub removed: Vec<C>,
}

impl<C> FilterResult<C> {
    /// Split `candidates` with `keep`, preserving order in both halves.
    pub fn partition<F>(candidates: Vec<C>, keep: F) -> Self
    where
        F: FnMut(&C) -> bool,
    {
        let (kept, removed) = candidates.into_iter().partition(keep);
        Self { kept, removed }
    }
}

/// Filters run sequentially; each sees only what the previous one kept.
#[async_trait]
pub trait Filter<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// On error the pipeline logs and keeps the input unchanged.
    async fn filter(&self, query: &Q, candidates: Vec<C>) -> Result<FilterResult<C>, String>;

    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
