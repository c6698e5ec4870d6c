//! Debounced free-text lookup bound to a single form field.
//!
//! Only the result of the most recently issued request may update the
//! candidate list: every request carries a sequence number assigned
//! synchronously at call time and checked again when its response arrives.
//! Lookup failures degrade to an empty list; they never block editing.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::remote::LookupService;
use crate::session::SessionToken;

/// One candidate foreign-key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupCandidate {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupStatus {
    #[default]
    Idle,
    Pending,
    Ready,
    Failed,
}

#[derive(Debug, Default)]
struct LookupInner {
    seq: u64,
    candidates: Vec<LookupCandidate>,
    status: LookupStatus,
}

/// Per-field adapter state. Cheap to clone; clones share one candidate list.
#[derive(Clone)]
pub struct LookupBinding {
    service: Arc<dyn LookupService>,
    token: SessionToken,
    debounce: Duration,
    limit: usize,
    inner: Arc<Mutex<LookupInner>>,
}

impl LookupBinding {
    pub fn new(
        service: Arc<dyn LookupService>,
        token: SessionToken,
        debounce: Duration,
        limit: usize,
    ) -> Self {
        Self {
            service,
            token,
            debounce,
            limit,
            inner: Arc::new(Mutex::new(LookupInner::default())),
        }
    }

    pub fn candidates(&self) -> Vec<LookupCandidate> {
        self.lock().candidates.clone()
    }

    pub fn status(&self) -> LookupStatus {
        self.lock().status
    }

    /// Initial unfiltered fetch when the field gains focus; not debounced.
    pub fn on_open(&self) -> impl Future<Output = ()> + Send + 'static {
        let seq = self.bump();
        let binding = self.clone();
        async move { binding.issue(seq, String::new()).await }
    }

    /// Debounced fetch for an edited query.
    ///
    /// The sequence number is taken before the returned future runs, so a
    /// newer call supersedes this one even while it is still sleeping.
    pub fn on_query_change(
        &self,
        query: impl Into<String>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let seq = self.bump();
        let binding = self.clone();
        let query = query.into();
        async move {
            tokio::time::sleep(binding.debounce).await;
            if !binding.is_current(seq) {
                tracing::debug!(seq, "debounced lookup superseded before issue");
                return;
            }
            binding.issue(seq, query).await;
        }
    }

    async fn issue(&self, seq: u64, query: String) {
        if !self.token.is_live() {
            return;
        }
        let outcome = self.service.search(&query, self.limit).await;
        let mut inner = self.lock();
        if inner.seq != seq {
            tracing::debug!(seq, latest = inner.seq, "discarding stale lookup response");
            return;
        }
        if !self.token.is_live() {
            return;
        }
        match outcome {
            Ok(candidates) => {
                inner.candidates = candidates;
                inner.status = LookupStatus::Ready;
            }
            Err(err) => {
                tracing::warn!(%err, "lookup failed; degrading to empty candidates");
                inner.candidates.clear();
                inner.status = LookupStatus::Failed;
            }
        }
    }

    fn bump(&self) -> u64 {
        let mut inner = self.lock();
        inner.seq += 1;
        inner.status = LookupStatus::Pending;
        inner.seq
    }

    fn is_current(&self, seq: u64) -> bool {
        self.lock().seq == seq
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LookupInner> {
        self.inner.lock().expect("lookup state poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn candidate(name: &str) -> LookupCandidate {
        LookupCandidate {
            id: name.to_lowercase(),
            display_name: name.to_string(),
        }
    }

    /// Returns `<query>-hit`, optionally after a per-query delay.
    struct RecordingService {
        delays: HashMap<String, Duration>,
        searches: AtomicUsize,
        fail: bool,
    }

    impl RecordingService {
        fn new() -> Self {
            Self {
                delays: HashMap::new(),
                searches: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn with_delay(mut self, query: &str, delay: Duration) -> Self {
            self.delays.insert(query.to_string(), delay);
            self
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }
    }

    #[async_trait]
    impl LookupService for RecordingService {
        async fn search(
            &self,
            query: &str,
            _limit: usize,
        ) -> anyhow::Result<Vec<LookupCandidate>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(query) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail {
                anyhow::bail!("lookup backend down");
            }
            Ok(vec![candidate(&format!("{query}-hit"))])
        }
    }

    fn binding(service: RecordingService) -> (LookupBinding, Arc<RecordingService>) {
        let service = Arc::new(service);
        let binding = LookupBinding::new(
            service.clone(),
            SessionToken::new(),
            Duration::from_millis(250),
            10,
        );
        (binding, service)
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_request() {
        let (binding, service) = binding(RecordingService::new());
        let first = tokio::spawn(binding.on_query_change("cu"));
        let second = tokio::spawn(binding.on_query_change("cus"));
        let third = tokio::spawn(binding.on_query_change("cust"));
        let _ = tokio::join!(first, second, third);
        assert_eq!(service.searches.load(Ordering::SeqCst), 1);
        assert_eq!(binding.candidates(), vec![candidate("cust-hit")]);
        assert_eq!(binding.status(), LookupStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_newer_one() {
        let service =
            RecordingService::new().with_delay("cust", Duration::from_secs(2));
        let (binding, _service) = binding(service);
        let slow = tokio::spawn(binding.on_query_change("cust"));
        // let the first debounce elapse so "cust" is actually in flight
        tokio::time::sleep(Duration::from_millis(300)).await;
        let fast = tokio::spawn(binding.on_query_change("custom"));
        let _ = tokio::join!(slow, fast);
        assert_eq!(
            binding.candidates(),
            vec![candidate("custom-hit")],
            "only the latest request may update the candidates"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn on_open_fetches_without_debounce() {
        let (binding, service) = binding(RecordingService::new());
        binding.on_open().await;
        assert_eq!(service.searches.load(Ordering::SeqCst), 1);
        assert_eq!(binding.candidates(), vec![candidate("-hit")]);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_degrades_to_empty_candidates() {
        let (binding, _service) = binding(RecordingService::failing());
        binding.on_query_change("q").await;
        assert!(binding.candidates().is_empty());
        assert_eq!(binding.status(), LookupStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn revoked_session_token_discards_results() {
        let (binding, _service) = binding(RecordingService::new());
        let token = binding.token.clone();
        token.revoke();
        binding.on_query_change("q").await;
        assert!(binding.candidates().is_empty());
        assert_eq!(binding.status(), LookupStatus::Pending, "nothing applied");
    }
}
