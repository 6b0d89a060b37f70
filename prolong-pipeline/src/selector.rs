use std::cmp::Ordering;

use crate::util;

/// Selectors order (and optionally truncate) the scored candidate list.
pub trait Selector<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    fn select(&self, _query: &Q, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = self.sort(candidates);
        if let Some(limit) = self.size() {
            sorted.truncate(limit);
        }
        sorted
    }

    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Relative order of two candidates.
    fn compare(&self, a: &C, b: &C) -> Ordering;

    /// Stable sort with `compare`.
    fn sort(&self, candidates: Vec<C>) -> Vec<C> {
        let mut sorted = candidates;
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }

    /// Maximum number of candidates to keep; `None` keeps all.
    fn size(&self) -> Option<usize> {
        None
    }

    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
