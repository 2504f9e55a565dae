//! The offline cache interceptor runtime.
//!
//! [`ServiceWorker`] owns one registration scope: its version lifecycle, the
//! pages it controls, and the cache stores it reads and writes. Events are
//! dispatched through [`ServiceWorker::dispatch`]; routing decisions come from
//! the pure functions in [`routing`] and are executed here against the store
//! and the [`Network`].

pub mod clients;
pub mod events;
pub mod lifecycle;
pub mod network;
pub mod routing;


use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::Error;
use crate::cache::{CacheDb, NewEntry};
use crate::config::{AppConfig, WorkerVariant};
use crate::http::{FetchRequest, RequestMode, WorkerResponse};
use crate::location;
use crate::manifest::ResourceManifest;
use crate::version::CacheName;

pub use clients::{ClientId, ClientInfo, ClientMessage, ClientRegistry};
pub use events::{
    ActivationReport, EventOutcome, FetchOutcome, InstallReport, MessageEvent, MessageOutcome, ResponseSource, Served,
    WorkerCommand, WorkerEvent, WorkerReply, WorkerStatus,
};
pub use lifecycle::{Registration, RegistrationStatus, VersionStatus, WorkerState};
pub use network::Network;
pub use routing::{BypassReason, FallbackPlan, FetchRoute, StoreDecision};

use routing::{StorePolicy, fallback_plan, route_fetch, store_decision};

/// One deployable version: its configuration and the store it owns.
#[derive(Debug, Clone)]
pub struct WorkerScript {
    config: Arc<AppConfig>,
    cache_name: CacheName,
    manifest: ResourceManifest,
    origin: String,
}

impl WorkerScript {
    /// Build the version described by `config` as deployed on `today`.
    pub fn from_config(config: Arc<AppConfig>, today: NaiveDate) -> Result<Self, Error> {
        let origin = location::origin_prefix(&config.origin)?;
        let cache_name = CacheName::for_config(&config, today);
        let manifest = ResourceManifest::new(config.manifest.clone());
        Ok(Self { config, cache_name, manifest, origin })
    }

    /// Build the version described by `config` as deployed today (UTC).
    pub fn current(config: Arc<AppConfig>) -> Result<Self, Error> {
        Self::from_config(config, chrono::Utc::now().date_naive())
    }

    /// Same version bound to a different store name.
    pub fn with_cache_name(&self, cache_name: CacheName) -> Self {
        Self { cache_name, ..self.clone() }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &CacheName {
        &self.cache_name
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    /// Serialized app origin, e.g. `https://app.example.com`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn variant(&self) -> WorkerVariant {
        self.config.variant
    }
}

/// Runtime for one registration scope.
pub struct ServiceWorker<N: Network> {
    db: CacheDb,
    network: Arc<N>,
    scope: String,
    registration: Mutex<Registration>,
    clients: ClientRegistry,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<N: Network> ServiceWorker<N> {
    pub fn new(db: CacheDb, network: Arc<N>, scope: impl Into<String>) -> Self {
        Self {
            db,
            network,
            scope: scope.into(),
            registration: Mutex::new(Registration::new()),
            clients: ClientRegistry::new(),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Route an event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, Error> {
        match event {
            WorkerEvent::Install(script) => self.install(script).await.map(EventOutcome::Installed),
            WorkerEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => Ok(EventOutcome::Fetch(self.handle_fetch(&request).await)),
            WorkerEvent::Message(message) => self.handle_message(message).await.map(EventOutcome::Message),
        }
    }

    /// Bring `script` into service at process start.
    ///
    /// A version this scope already activated in an earlier run is resumed
    /// without reinstalling. Otherwise it is installed; if that fails, the
    /// previously activated store (when it still exists) keeps serving.
    pub async fn start(&self, script: Arc<WorkerScript>) -> Result<RegistrationStatus, Error> {
        let recorded = self.db.load_active(&self.scope).await?;

        if let Some(name) = recorded.as_deref()
            && script.cache_name().is_current(name)
            && self.db.has_store(name).await?
        {
            tracing::info!("resuming active version {}", name);
            self.registration.lock().await.restore_active(script);
            return Ok(self.registration.lock().await.status());
        }

        if let Err(err) = self.install(script.clone()).await {
            match recorded {
                Some(name) if self.db.has_store(&name).await? => {
                    tracing::warn!("install failed ({}), resuming previous version {}", err, name);
                    let previous = script.with_cache_name(CacheName::from_stored(name));
                    self.registration.lock().await.restore_active(Arc::new(previous));
                }
                _ => return Err(err),
            }
        }

        Ok(self.registration.lock().await.status())
    }

    /// Install a version: pre-cache its manifest, then activate it when it
    /// skips waiting or nothing else is active.
    ///
    /// Any manifest failure aborts the install with nothing written.
    pub async fn install(&self, script: Arc<WorkerScript>) -> Result<InstallReport, Error> {
        self.registration.lock().await.begin_install(script.clone())?;
        tracing::info!("installing {}", script.cache_name());

        let precached = match self.precache(&script).await {
            Ok(count) => count,
            Err(err) => {
                self.registration.lock().await.install_failed();
                tracing::error!("install of {} failed: {}", script.cache_name(), err);
                return Err(err);
            }
        };

        let ready = {
            let mut registration = self.registration.lock().await;
            if let Some(replaced) = registration.install_succeeded() {
                tracing::info!("waiting version {} replaced", replaced.script.cache_name());
            }
            if script.config().skip_waiting {
                registration.skip_waiting();
            }
            registration.ready_to_activate()
        };
        tracing::info!("installed {} ({} resources pre-cached)", script.cache_name(), precached);

        let activated = if ready { self.activate().await? } else { None };

        Ok(InstallReport { cache_name: script.cache_name().to_string(), precached, activated })
    }

    async fn precache(&self, script: &WorkerScript) -> Result<usize, Error> {
        let urls = script.manifest().resolve_all(script.origin())?;
        let mut entries = Vec::with_capacity(urls.len());

        for url in urls {
            let request = FetchRequest { url: url.clone(), method: "GET".into(), mode: RequestMode::Cors };
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| Error::PrecacheFailed { url: url.clone(), reason: e.to_string() })?;
            if !response.ok() {
                return Err(Error::PrecacheFailed { url, reason: format!("status {}", response.status) });
            }
            entries.push(NewEntry { method: request.method, url, response });
        }

        self.db.put_all(script.cache_name().as_str(), entries).await
    }

    /// Activate the waiting version, if there is one.
    ///
    /// Sweeps stale stores (offline-first only), claims every page, and
    /// tells the pages which store is now current.
    pub async fn activate(&self) -> Result<Option<ActivationReport>, Error> {
        let Some((script, previous)) = self.registration.lock().await.begin_activate() else {
            return Ok(None);
        };
        if let Some(previous) = previous {
            tracing::info!("version {} retired", previous.script.cache_name());
        }
        let cache_name = script.cache_name().as_str();
        tracing::info!("activating {}", cache_name);

        let deleted_stores = match script.variant() {
            WorkerVariant::OfflineFirst => self.sweep_stale(script.cache_name()).await.unwrap_or_else(|err| {
                tracing::warn!("stale cache cleanup failed: {}", err);
                Vec::new()
            }),
            WorkerVariant::Passthrough => Vec::new(),
        };

        let claimed_clients = self.clients.claim(cache_name).await;
        let message = ClientMessage::SwActivated { cache_name: cache_name.to_string() };
        let notified_clients = self.clients.broadcast(cache_name, &message).await;

        self.registration.lock().await.finish_activate();
        if let Err(err) = self.db.save_active(&self.scope, cache_name).await {
            tracing::warn!("failed to record {} as active: {}", cache_name, err);
        }

        Ok(Some(ActivationReport {
            cache_name: cache_name.to_string(),
            deleted_stores,
            claimed_clients,
            notified_clients,
        }))
    }

    async fn sweep_stale(&self, current: &CacheName) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.db.store_names().await? {
            if current.is_current(&name) {
                continue;
            }
            tracing::info!("removing stale cache store {}", name);
            if self.db.delete_store(&name).await? {
                deleted.push(name);
            }
        }
        Ok(deleted)
    }

    /// Run the fetch handler without executing a passthrough.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> FetchOutcome {
        let Some(script) = self.registration.lock().await.active_script() else {
            return FetchOutcome::Passthrough(BypassReason::NoController);
        };
        if script.variant() == WorkerVariant::Passthrough {
            return FetchOutcome::Passthrough(BypassReason::PassthroughVariant);
        }
        if let FetchRoute::Passthrough(reason) = route_fetch(request) {
            tracing::debug!("not intercepting {} ({})", request.url, reason.as_str());
            return FetchOutcome::Passthrough(reason);
        }

        match self.db.match_entry(None, &request.method, &request.url).await {
            Ok(Some(entry)) => {
                tracing::debug!("cache hit for {} in {}", request.url, entry.store);
                return FetchOutcome::Responded { response: entry.response, source: ResponseSource::Cache, stored: false };
            }
            Ok(None) => {}
            Err(err) => tracing::warn!("cache lookup for {} failed: {}", request.url, err),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                let policy = StorePolicy {
                    origin: script.origin(),
                    manifest: script.manifest(),
                    cdn_prefix: script.config().cdn_prefix.as_deref(),
                };
                let stored = match store_decision(request, &response, policy) {
                    StoreDecision::Store => {
                        self.store_in_background(script.cache_name().clone(), request, response.clone())
                            .await;
                        true
                    }
                    StoreDecision::Skip(reason) => {
                        tracing::debug!("not caching {}: {:?}", request.url, reason);
                        false
                    }
                };
                FetchOutcome::Responded { response, source: ResponseSource::Network, stored }
            }
            Err(err @ (Error::Network(_) | Error::FetchTimeout(_))) => {
                tracing::error!("fetch of {} failed: {}", request.url, err);
                self.offline_response(&script, request).await
            }
            Err(err) => {
                tracing::warn!("response for {} rejected: {}", request.url, err);
                FetchOutcome::Failed(err)
            }
        }
    }

    async fn offline_response(&self, script: &WorkerScript, request: &FetchRequest) -> FetchOutcome {
        if fallback_plan(request) == FallbackPlan::EntryPage {
            match self.cached_entry_page(script).await {
                Ok(Some(response)) => {
                    return FetchOutcome::Responded { response, source: ResponseSource::OfflineFallback, stored: false };
                }
                Ok(None) => tracing::debug!("no cached entry page for {}", request.url),
                Err(err) => tracing::warn!("entry page lookup failed: {}", err),
            }
        }
        FetchOutcome::Responded {
            response: WorkerResponse::network_error(),
            source: ResponseSource::NetworkError,
            stored: false,
        }
    }

    async fn cached_entry_page(&self, script: &WorkerScript) -> Result<Option<WorkerResponse>, Error> {
        let url = location::resolve(script.origin(), &script.config().entry_page)?;
        Ok(self.db.match_entry(None, "GET", &url).await?.map(|entry| entry.response))
    }

    async fn store_in_background(&self, cache_name: CacheName, request: &FetchRequest, response: WorkerResponse) {
        let db = self.db.clone();
        let entry = NewEntry { method: request.method.clone(), url: request.url.clone(), response };
        let handle = tokio::spawn(async move {
            if let Err(err) = write_entry(&db, cache_name.as_str(), entry).await {
                tracing::warn!("cache put into {} failed: {}", cache_name, err);
            }
        });

        let mut pending = self.pending.lock().await;
        pending.retain(|task| !task.is_finished());
        pending.push(handle);
    }

    /// Run the fetch handler and carry out its decision, fetching from the
    /// network directly when the request was not intercepted.
    pub async fn fetch(&self, request: FetchRequest) -> Result<Served, Error> {
        match self.handle_fetch(&request).await {
            FetchOutcome::Responded { response, source, stored } => Ok(Served { response, source, stored }),
            FetchOutcome::Failed(err) => Err(err),
            FetchOutcome::Passthrough(reason) => {
                tracing::debug!("fetching {} without interception ({})", request.url, reason.as_str());
                let response = self.network.fetch(&request).await?;
                Ok(Served { response, source: ResponseSource::Passthrough, stored: false })
            }
        }
    }

    /// Handle a message posted by a page.
    pub async fn handle_message(&self, message: MessageEvent) -> Result<MessageOutcome, Error> {
        match WorkerCommand::parse(&message.data) {
            Some(WorkerCommand::ClearCache) => {
                tracing::info!("clearing every cache store");
                let mut deleted_stores = Vec::new();
                for name in self.db.store_names().await? {
                    tracing::info!("clearing cache store {}", name);
                    if self.db.delete_store(&name).await? {
                        deleted_stores.push(name);
                    }
                }
                let replied = match message.reply_to {
                    Some(port) => port.send(WorkerReply::CacheCleared).is_ok(),
                    None => false,
                };
                Ok(MessageOutcome::CacheCleared { deleted_stores, replied })
            }
            Some(WorkerCommand::SkipWaiting) => {
                let ready = {
                    let mut registration = self.registration.lock().await;
                    registration.skip_waiting() && registration.ready_to_activate()
                };
                let activated = if ready { self.activate().await? } else { None };
                Ok(MessageOutcome::SkipWaiting { activated })
            }
            None => {
                tracing::debug!("ignoring unrecognized message {}", message.data);
                Ok(MessageOutcome::Ignored)
            }
        }
    }

    /// Wait for every background store write scheduled so far.
    pub async fn settle(&self) {
        let tasks = std::mem::take(&mut *self.pending.lock().await);
        for task in tasks {
            if let Err(err) = task.await {
                tracing::warn!("background cache write aborted: {}", err);
            }
        }
    }

    pub async fn status(&self) -> Result<WorkerStatus, Error> {
        let registration = self.registration.lock().await.status();
        let stores = self.db.store_names().await?;
        Ok(WorkerStatus { registration, stores })
    }
}

async fn write_entry(db: &CacheDb, store: &str, entry: NewEntry) -> Result<(), Error> {
    db.open_store(store).await?;
    db.put_entry(store, entry).await
}
