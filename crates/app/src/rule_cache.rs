//! Cached active rules, grouped by event type.
//!
//! The cache is filled lazily from the [`RuleRepository`] on first use and
//! dropped as a whole on every rule mutation. A generation counter keeps a
//! load that raced with an invalidation from installing stale rules.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use herald_domain::error::HeraldError;
use herald_domain::rule::AutomationRule;

use crate::ports::RuleRepository;

type RulesByEventType = HashMap<String, Arc<[AutomationRule]>>;

#[derive(Default)]
struct CacheState {
    generation: u64,
    rules: Option<Arc<RulesByEventType>>,
}

/// Read-through cache of active rules in front of a [`RuleRepository`].
pub struct RuleCache<R> {
    repo: R,
    state: RwLock<CacheState>,
}

impl<R: RuleRepository> RuleCache<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The repository behind the cache, for writes.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Active rules listening to `event_type`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the rules have to be loaded and the
    /// repository fails.
    pub async fn active_for(&self, event_type: &str) -> Result<Arc<[AutomationRule]>, HeraldError> {
        let rules = self.load().await?;
        Ok(rules
            .get(event_type)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new())))
    }

    /// Forget every cached rule. The next lookup reloads from the repository.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.rules = None;
        tracing::debug!(generation = state.generation, "rule cache invalidated");
    }

    async fn load(&self) -> Result<Arc<RulesByEventType>, HeraldError> {
        let generation = {
            let state = self.state.read().await;
            if let Some(rules) = &state.rules {
                return Ok(Arc::clone(rules));
            }
            state.generation
        };

        let mut active = self.repo.get_active().await?;
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let mut grouped: HashMap<String, Vec<AutomationRule>> = HashMap::new();
        for rule in active {
            grouped.entry(rule.event_type.clone()).or_default().push(rule);
        }
        let rules: Arc<RulesByEventType> = Arc::new(
            grouped
                .into_iter()
                .map(|(event_type, rules)| (event_type, Arc::from(rules)))
                .collect(),
        );

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.rules = Some(Arc::clone(&rules));
            tracing::debug!(event_types = rules.len(), "rule cache loaded");
        }
        Ok(rules)
    }
}
