use async_trait::async_trait;

use crate::util;

/// Scorers compute derived values for kept candidates.
///
/// Scorers run sequentially, so a later scorer sees the fields written by
/// an earlier one. Like hydrators they return one candidate per input, in
/// order, and the pipeline merges them back with `update`.
#[async_trait]
pub trait Scorer<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    async fn score(&self, query: &Q, candidates: &[C]) -> Result<Vec<C>, String>;

    /// Copy the scored fields from `scored` into `candidate`.
    fn update(&self, candidate: &mut C, scored: C);

    fn update_all(&self, candidates: &mut [C], scored: Vec<C>) {
        for (candidate, s) in candidates.iter_mut().zip(scored) {
            self.update(candidate, s);
        }
    }

    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
