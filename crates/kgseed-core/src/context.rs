//! Request-scoped state threaded through a resolution tree.

use crate::policy::ResolverPolicy;
use crate::types::TypeSet;
use parking_lot::Mutex;
use std::collections::HashSet;

/// A visited `(query text, type filter)` pair.
pub type TraceKey = (String, Option<TypeSet>);

/// State shared by every branch of one top-level request.
///
/// The trace only grows. Check-and-insert happens under one lock, so two
/// sibling branches can never both claim the same pair.
#[derive(Debug)]
pub struct RequestContext {
    trace: Mutex<HashSet<TraceKey>>,
    policy: ResolverPolicy,
}

impl RequestContext {
    pub fn new(policy: ResolverPolicy) -> Self {
        Self {
            trace: Mutex::new(HashSet::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Claim a pair. Returns `false` if some branch already visited it.
    pub fn try_visit(&self, text: &str, filter: Option<&TypeSet>) -> bool {
        let key = (text.to_string(), filter.cloned());
        self.trace.lock().insert(key)
    }

    pub fn has_visited(&self, text: &str, filter: Option<&TypeSet>) -> bool {
        let key = (text.to_string(), filter.cloned());
        self.trace.lock().contains(&key)
    }

    pub fn visited_count(&self) -> usize {
        self.trace.lock().len()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(ResolverPolicy::default())
    }
}
