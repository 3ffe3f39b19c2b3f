//! Shared test infrastructure: a scripted in-memory engine and identity helpers.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, json};

use kindgate_search::cache::{InMemoryCache, KeyValueCache};
use kindgate_search::engine::{EnginePage, EngineRequest, SearchEngineClient};
use kindgate_search::error::{EngineError, EngineResult};
use kindgate_search::tenant::IdentityContext;
use kindgate_search::types::{CursorEntry, Document};
use kindgate_search::{GatewayConfig, SearchService};

/// Builds a fresh engine error on every reply.
pub type ErrorFactory = fn() -> EngineError;

/// A scripted engine reply.
#[derive(Clone)]
pub enum Reply {
    Page(EnginePage),
    Fail(ErrorFactory),
}

impl Reply {
    fn into_result(self) -> EngineResult<EnginePage> {
        match self {
            Reply::Page(page) => Ok(page),
            Reply::Fail(factory) => Err(factory()),
        }
    }
}

#[derive(Default)]
struct FakeState {
    aliases: HashSet<String>,
    concrete: HashMap<String, String>,
    first_pages: VecDeque<Reply>,
    continuations: VecDeque<Reply>,
    routes: Vec<(String, Reply)>,
    requests: Vec<EngineRequest>,
    continued_handles: Vec<String>,
    created_aliases: Vec<(String, String)>,
    create_alias_calls: usize,
    alias_exists_calls: usize,
    get_all_aliases_calls: usize,
    fail_alias_creation: bool,
    fail_alias_listing: bool,
    handle_counter: usize,
}

/// An in-memory [`SearchEngineClient`] that records every call.
///
/// Unscripted searches return one hit and a fresh handle; unscripted
/// continuations return one hit and echo the handle back, the way a
/// scroll continuation usually does.
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
    delay: Option<Duration>,
}

impl FakeEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
            delay: Some(delay),
        })
    }

    pub fn script_first_page(&self, reply: Reply) {
        self.state.lock().first_pages.push_back(reply);
    }

    pub fn script_continuation(&self, reply: Reply) {
        self.state.lock().continuations.push_back(reply);
    }

    /// Answers every search whose index expression starts with `prefix`.
    pub fn route(&self, prefix: &str, reply: Reply) {
        self.state.lock().routes.push((prefix.to_string(), reply));
    }

    pub fn add_alias(&self, alias: &str) {
        self.state.lock().aliases.insert(alias.to_string());
    }

    pub fn set_concrete_index(&self, index: &str, concrete: Option<&str>) {
        let mut state = self.state.lock();
        match concrete {
            Some(concrete) => {
                state.concrete.insert(index.to_string(), concrete.to_string());
            }
            None => {
                state.concrete.insert(index.to_string(), String::new());
            }
        }
    }

    pub fn fail_alias_creation(&self) {
        self.state.lock().fail_alias_creation = true;
    }

    pub fn fail_alias_listing(&self) {
        self.state.lock().fail_alias_listing = true;
    }

    pub fn requests(&self) -> Vec<EngineRequest> {
        self.state.lock().requests.clone()
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.state.lock().requests.last().cloned()
    }

    pub fn continued_handles(&self) -> Vec<String> {
        self.state.lock().continued_handles.clone()
    }

    pub fn created_aliases(&self) -> Vec<(String, String)> {
        self.state.lock().created_aliases.clone()
    }

    pub fn create_alias_calls(&self) -> usize {
        self.state.lock().create_alias_calls
    }

    pub fn alias_exists_calls(&self) -> usize {
        self.state.lock().alias_exists_calls
    }

    pub fn get_all_aliases_calls(&self) -> usize {
        self.state.lock().get_all_aliases_calls
    }

    pub fn search_calls(&self) -> usize {
        self.state.lock().requests.len()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl SearchEngineClient for FakeEngine {
    fn engine_name(&self) -> &'static str {
        "fake"
    }

    async fn search_first_page(&self, request: &EngineRequest) -> EngineResult<EnginePage> {
        self.pause().await;
        let reply = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());

            let routed = state
                .routes
                .iter()
                .find(|(prefix, _)| request.index.as_str().starts_with(prefix.as_str()))
                .map(|(_, reply)| reply.clone());
            match routed.or_else(|| state.first_pages.pop_front()) {
                Some(reply) => reply,
                None => {
                    state.handle_counter += 1;
                    let id = format!("doc-{}", state.handle_counter);
                    let handle = format!("handle-{}", state.handle_counter);
                    let keep_alive = request.keep_alive.is_some();
                    Reply::Page(page(
                        &[id.as_str()],
                        1,
                        keep_alive.then_some(handle.as_str()),
                    ))
                }
            }
        };
        reply.into_result()
    }

    async fn continue_paging(
        &self,
        handle: &str,
        _keep_alive: Duration,
    ) -> EngineResult<EnginePage> {
        self.pause().await;
        let reply = {
            let mut state = self.state.lock();
            state.continued_handles.push(handle.to_string());
            state
                .continuations
                .pop_front()
                .unwrap_or_else(|| Reply::Page(page(&["next"], 1, Some(handle))))
        };
        reply.into_result()
    }

    async fn alias_exists(&self, alias: &str) -> EngineResult<bool> {
        let mut state = self.state.lock();
        state.alias_exists_calls += 1;
        Ok(state.aliases.contains(alias))
    }

    async fn create_alias(&self, concrete_index: &str, alias: &str) -> EngineResult<bool> {
        let mut state = self.state.lock();
        state.create_alias_calls += 1;
        if state.fail_alias_creation {
            return Err(EngineError::Unavailable {
                message: "alias endpoint down".to_string(),
            });
        }
        state.aliases.insert(alias.to_string());
        state
            .created_aliases
            .push((concrete_index.to_string(), alias.to_string()));
        Ok(true)
    }

    async fn get_all_aliases(&self) -> EngineResult<HashSet<String>> {
        let mut state = self.state.lock();
        state.get_all_aliases_calls += 1;
        if state.fail_alias_listing {
            return Err(EngineError::Unavailable {
                message: "alias listing down".to_string(),
            });
        }
        Ok(state.aliases.clone())
    }

    async fn resolve_concrete_index(&self, index: &str) -> EngineResult<Option<String>> {
        let state = self.state.lock();
        match state.concrete.get(index) {
            Some(concrete) if concrete.is_empty() => Ok(None),
            Some(concrete) => Ok(Some(concrete.clone())),
            None => Ok(Some(index.to_string())),
        }
    }
}

/// A document with a single `id` field.
pub fn doc(id: &str) -> Document {
    let mut document = Map::new();
    document.insert("id".to_string(), json!(id));
    document
}

/// An engine page holding one document per id.
pub fn page(ids: &[&str], total: u64, handle: Option<&str>) -> EnginePage {
    EnginePage {
        hits: ids.iter().map(|id| doc(id)).collect(),
        total,
        paging_handle: handle.map(str::to_string),
        aggregations: None,
    }
}

/// An identity with a data group for `user` in the given partition header.
pub fn identity_for(user: &str, partitions: &str) -> IdentityContext {
    IdentityContext::builder()
        .user_id(user)
        .partition_header(partitions)
        .data_group(format!("data.default.viewers@{}.example.com", partitions))
        .build()
        .expect("valid identity")
}

/// The default test user in the given partition header.
pub fn identity(partitions: &str) -> IdentityContext {
    identity_for("alice@example.com", partitions)
}

/// Caches a test can reach into.
pub struct Caches {
    pub aliases: Arc<InMemoryCache<String, String>>,
    pub cursors: Arc<InMemoryCache<String, CursorEntry>>,
}

/// A service over `engine` with default configuration and in-memory caches.
pub fn service(engine: &Arc<FakeEngine>) -> SearchService {
    SearchService::with_in_memory_caches(engine.clone(), GatewayConfig::default())
}

/// A service over `engine` that exposes its caches.
pub fn service_with_caches(
    engine: &Arc<FakeEngine>,
    config: GatewayConfig,
) -> (SearchService, Caches) {
    let caches = Caches {
        aliases: Arc::new(InMemoryCache::unbounded_ttl(config.cache_capacity)),
        cursors: Arc::new(InMemoryCache::new(config.cache_capacity, config.cursor_ttl())),
    };
    let alias_cache: Arc<dyn KeyValueCache<String, String>> = caches.aliases.clone();
    let cursor_cache: Arc<dyn KeyValueCache<String, CursorEntry>> = caches.cursors.clone();
    let service = SearchService::new(engine.clone(), alias_cache, cursor_cache, config);
    (service, caches)
}

/// A service whose cursor entries live only `ttl`.
pub fn service_with_cursor_ttl(engine: &Arc<FakeEngine>, ttl: Duration) -> SearchService {
    let config = GatewayConfig::default();
    let alias_cache: Arc<dyn KeyValueCache<String, String>> =
        Arc::new(InMemoryCache::unbounded_ttl(config.cache_capacity));
    let cursor_cache: Arc<dyn KeyValueCache<String, CursorEntry>> =
        Arc::new(InMemoryCache::new(config.cache_capacity, ttl));
    SearchService::new(engine.clone(), alias_cache, cursor_cache, config)
}
