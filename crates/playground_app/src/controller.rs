//! Playground controller.
//!
//! The [`Playground`] owns the route table, every [`RouteCard`], the result
//! panel and the shareable [`Location`]. All mutation goes through it on a
//! single task; network work is split into a synchronous half that decides
//! what to send ([`Playground::call_method`] returning a [`PendingCall`]) and
//! an async half ([`PendingCall::execute`]) whose [`CallOutcome`] is handed
//! back to [`Playground::complete`]. Overlapping calls are not ordered: the
//! last outcome to complete wins the result panel.
//!
//! Every API-root reset bumps a generation counter. Schema results and call
//! outcomes tagged with an older generation are dropped.

use std::path::PathBuf;
use std::sync::Arc;

use playground_client::{
    Decoded, FetchError, Format, Method, Paths, PathsFuture, Payload, RouteClient, RouteTable, SchemaClient, SchemaError,
};
use thiserror::Error;

use crate::card::RouteCard;
use crate::config::PlaygroundConfig;
use crate::fragment::{FragmentError, FragmentState, Location};
use crate::integrations::{Clipboard, DirectoryDownloader, Downloader};
use crate::params::{ParamValue, Params};
use crate::preview::{strip_path_placeholder, PATH_PLACEHOLDER};
use crate::render::{classify_response, resolve_error, BlobStore, Converted, Rendered};

/// Path of the service's interactive docs
pub const DOCS_PATH: &str = "/docs";

/// Controller-level failures
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("{0}")]
    Schema(#[source] Arc<SchemaError>),

    #[error("Unknown route: {0}")]
    UnknownRoute(String),

    #[error("Invalid link state: {0}")]
    Fragment(#[from] FragmentError),

    #[error("{0}")]
    Invocation(String),
}

/// Schema loading progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Fetching,
    Loaded(usize),
    Failed(String),
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Fetching => write!(f, "fetching schema…"),
            LoadStatus::Loaded(n) => write!(f, "{} routes", n),
            LoadStatus::Failed(e) => write!(f, "schema error: {}", e),
        }
    }
}

/// The result and error regions. At most one of them is populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPanel {
    pub result: Option<Rendered>,
    pub error: Option<String>,
}

/// A request decided on the UI task, not yet sent
#[derive(Debug)]
pub struct PendingCall {
    generation: u64,
    api: RouteClient,
    route: String,
    method: Method,
    payload: Payload,
}

impl PendingCall {
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Send the request and classify whatever comes back
    pub async fn execute(self) -> CallOutcome {
        let extension = strip_path_placeholder(&self.route);
        let response = if self.method == Method::GET {
            self.api.get(self.payload, &extension, Some(Format::Result)).await
        } else {
            self.api.post(self.payload, &extension, Some(Format::Result)).await
        };

        let result = convert_response(&self.route, response).await;

        CallOutcome {
            generation: self.generation,
            route: self.route,
            result,
        }
    }
}

async fn convert_response(route: &str, response: Result<Decoded, FetchError>) -> Result<Converted, String> {
    match response {
        Ok(Decoded::Raw(raw)) => classify_response(raw).await.map_err(|e| e.to_string()),
        Ok(Decoded::Text(text)) => Ok(Converted::Text(text)),
        Ok(other) => {
            tracing::error!(%route, body = ?other, "Unexpected response body");
            Err("unexpected response body".to_string())
        }
        Err(e) => Err(resolve_error(e).await),
    }
}

/// Classified result of one [`PendingCall`]
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    generation: u64,
    pub route: String,
    pub result: Result<Converted, String>,
}

/// Controller for one API root
pub struct Playground {
    url: String,
    api: RouteClient,
    schema: SchemaClient,
    routes: RouteTable,
    cards: Vec<RouteCard>,
    selected: usize,
    location: Location,
    panel: ResultPanel,
    blobs: BlobStore,
    downloader: Box<dyn Downloader>,
    download_dir: PathBuf,
    status: LoadStatus,
    generation: u64,
}

impl std::fmt::Debug for Playground {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playground")
            .field("url", &self.url)
            .field("routes", &self.routes.len())
            .field("status", &self.status)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Playground {
    /// Controller for the configured API root; starts the schema fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: &PlaygroundConfig) -> Self {
        Self::with_downloader(config, Box::new(DirectoryDownloader::new(&config.download_dir)))
    }

    /// Controller with a custom download sink
    pub fn with_downloader(config: &PlaygroundConfig, downloader: Box<dyn Downloader>) -> Self {
        let url = config.api_root.clone();
        let api = RouteClient::new(&url);
        let schema = SchemaClient::new(api.clone());
        Self {
            location: Location::for_api_root(&url),
            blobs: BlobStore::new(&url),
            url,
            api,
            schema,
            routes: RouteTable::default(),
            cards: Vec::new(),
            selected: 0,
            panel: ResultPanel::default(),
            downloader,
            download_dir: config.download_dir.clone(),
            status: LoadStatus::Fetching,
            generation: 0,
        }
    }

    /// Discard every card and all route state, then load from `url`
    pub fn reset_api(&mut self, url: &str) {
        tracing::info!(from = %self.url, to = %url, "Resetting API root");
        self.cards.clear();
        self.routes = RouteTable::default();
        self.selected = 0;
        self.panel = ResultPanel::default();
        self.blobs.clear();
        self.set_api(url);
    }

    /// Point the controller at `url` and start a fresh schema fetch
    pub fn set_api(&mut self, url: &str) {
        self.generation += 1;
        self.url = url.trim_end_matches('/').to_string();
        self.api = RouteClient::new(&self.url);
        self.schema = SchemaClient::new(self.api.clone());
        self.blobs = BlobStore::new(&self.url);
        self.location.set_base(Location::for_api_root(&self.url).base());
        self.status = LoadStatus::Fetching;
    }

    pub fn api_root(&self) -> &str {
        &self.url
    }

    pub fn docs_url(&self) -> String {
        format!("{}{}", self.url, DOCS_PATH)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn cards(&self) -> &[RouteCard] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&RouteCard> {
        self.cards.get(index)
    }

    pub fn card_mut(&mut self, index: usize) -> Option<&mut RouteCard> {
        self.cards.get_mut(index)
    }

    pub fn card_index(&self, route: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.path() == route)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn select(&mut self, index: usize) {
        if index < self.cards.len() {
            self.selected = index;
        }
    }

    pub fn select_next(&mut self) {
        self.select(self.selected + 1);
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn expanded_count(&self) -> usize {
        self.cards.iter().filter(|c| !c.is_collapsed()).count()
    }

    pub fn panel(&self) -> &ResultPanel {
        &self.panel
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Replace the location's fragment, e.g. from a shared link
    pub fn set_hash(&mut self, hash: &str) {
        self.location.set_hash(hash);
    }

    /// Current shareable link
    pub fn link(&self) -> String {
        self.location.href()
    }

    /// Schema future for the current generation
    pub fn schema_future(&self) -> (u64, PathsFuture) {
        (self.generation, self.schema.paths_future())
    }

    /// Build the route table and cards once the schema has resolved.
    ///
    /// Returns the auto-invocation restored from the location, if any.
    pub fn on_paths(
        &mut self,
        generation: u64,
        result: Result<Arc<Paths>, Arc<SchemaError>>,
    ) -> Option<PendingCall> {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "Dropping stale schema");
            return None;
        }
        if self.status != LoadStatus::Fetching {
            tracing::warn!("Schema already applied");
            return None;
        }

        match result {
            Ok(paths) => {
                self.routes = RouteTable::from_paths(&paths);
                self.cards = self
                    .routes
                    .iter()
                    .map(|route| RouteCard::new(route.clone(), &self.url))
                    .collect();
                self.selected = 0;
                self.status = LoadStatus::Loaded(self.routes.len());
                tracing::info!(routes = self.routes.len(), "Route table built");
                self.call_hash()
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load schema");
                self.status = LoadStatus::Failed(e.to_string());
                self.handle_error(e.to_string());
                None
            }
        }
    }

    /// Restore the route and inputs named by the location's fragment.
    ///
    /// Failures are logged and leave the default state.
    pub fn call_hash(&mut self) -> Option<PendingCall> {
        if self.location.hash().is_empty() {
            return None;
        }
        match self.restore_hash() {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring link state");
                None
            }
        }
    }

    fn restore_hash(&mut self) -> Result<Option<PendingCall>, PlaygroundError> {
        let state = FragmentState::decode(self.location.hash())?;
        let index = self
            .card_index(&state.route)
            .ok_or_else(|| PlaygroundError::UnknownRoute(state.route.clone()))?;

        self.collapse_all_except(Some(index));
        self.selected = index;
        self.cards[index].set_params(&state.data);
        tracing::info!(route = %state.route, "Restored link state");

        if self.cards[index].route().is_get() {
            Ok(self.send(index))
        } else {
            Ok(None)
        }
    }

    /// Expand the card at `index` and collapse every other one
    pub fn collapse_all_except(&mut self, index: Option<usize>) {
        for (i, card) in self.cards.iter_mut().enumerate() {
            if Some(i) == index {
                card.expand();
            } else {
                card.collapse();
            }
        }
    }

    /// Header click: collapse an expanded card, otherwise expand it exclusively
    pub fn toggle_card(&mut self, index: usize) {
        let Some(card) = self.cards.get_mut(index) else {
            return;
        };
        self.selected = index;
        if card.is_collapsed() {
            self.collapse_all_except(Some(index));
        } else {
            card.collapse();
        }
    }

    /// Label click: exclusive expansion followed by invocation
    pub fn click_label(&mut self, index: usize) -> Option<PendingCall> {
        if index >= self.cards.len() {
            return None;
        }
        self.selected = index;
        self.collapse_all_except(Some(index));
        self.send(index)
    }

    /// Invoke the card at `index` with its current inputs
    pub fn send(&mut self, index: usize) -> Option<PendingCall> {
        let card = self.cards.get(index)?;
        let route = card.path().to_string();
        let params = card.get_params();
        self.call_method(&route, params)
    }

    /// Record the link state, then either render a redirect frame or
    /// prepare the request for `route`.
    pub fn call_method(&mut self, route: &str, params: Params) -> Option<PendingCall> {
        let state = FragmentState::new(route, params.to_fragment_data());
        self.location.set_hash(state.encode());

        let Some(descriptor) = self.routes.get(route) else {
            self.handle_error(PlaygroundError::UnknownRoute(route.to_string()).to_string());
            return None;
        };

        if descriptor.is_redirect() {
            let url = self.redirect_url(route, &params);
            tracing::info!(%route, %url, "Rendering redirect");
            self.handle_result(Rendered::Frame { url });
            return None;
        }

        tracing::info!(%route, method = %descriptor.method, "Invoking route");
        Some(PendingCall {
            generation: self.generation,
            api: self.api.clone(),
            route: route.to_string(),
            method: descriptor.method.clone(),
            payload: params.into_payload(descriptor.is_form()),
        })
    }

    fn redirect_url(&self, route: &str, params: &Params) -> String {
        if !route.contains(PATH_PLACEHOLDER) {
            return format!("{}{}", self.url, route);
        }
        let mut path = match params.get("path") {
            Some(ParamValue::Text(text)) => text.clone(),
            _ => String::new(),
        };
        if !path.is_empty() && !path.starts_with('/') {
            path.insert(0, '/');
        }
        format!("{}{}/", self.url, route.replace(PATH_PLACEHOLDER, &path))
    }

    /// Apply the outcome of a finished call
    pub fn complete(&mut self, outcome: CallOutcome) {
        if outcome.generation != self.generation {
            tracing::debug!(route = %outcome.route, "Dropping result from previous API root");
            return;
        }
        match outcome.result {
            Ok(converted) => {
                let rendered = self.render(converted);
                self.handle_result(rendered);
            }
            Err(message) => self.handle_error(message),
        }
    }

    fn render(&mut self, converted: Converted) -> Rendered {
        match converted {
            Converted::Image { content_type, bytes } => {
                let size = bytes.len();
                let blob_url = self.blobs.register(content_type.clone(), bytes);
                Rendered::Image {
                    blob_url,
                    content_type,
                    size,
                }
            }
            Converted::Download {
                filename,
                content_type,
                bytes,
            } => {
                let saved_to = match self.downloader.download(&filename, &bytes) {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::error!(%filename, error = %e, "Download failed");
                        None
                    }
                };
                let blob_url = self.blobs.register(content_type, bytes);
                Rendered::Download {
                    filename,
                    blob_url,
                    saved_to,
                }
            }
            Converted::Text(text) => Rendered::Markup(text),
        }
    }

    /// Show a result and clear the error region
    pub fn handle_result(&mut self, rendered: Rendered) {
        if let Rendered::Download {
            filename,
            saved_to: None,
            ..
        } = &rendered
        {
            let message = format!("Failed to save {}", filename);
            self.panel.result = Some(rendered);
            self.panel.error = Some(message);
            return;
        }
        self.panel.result = Some(rendered);
        self.panel.error = None;
    }

    /// Show an error and clear the result region
    pub fn handle_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Showing error");
        self.panel.result = None;
        self.panel.error = Some(message);
    }

    /// Copy the shareable link; failures are logged only
    pub fn copy_link(&self, clipboard: &mut dyn Clipboard) -> bool {
        match clipboard.write_text(&self.link()) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to copy link");
                false
            }
        }
    }

    /// Something the system opener can show for the current result.
    ///
    /// Blob-backed results are exported to the download directory first.
    pub fn result_target(&self) -> std::io::Result<Option<String>> {
        let Some(rendered) = &self.panel.result else {
            return Ok(None);
        };
        match rendered {
            Rendered::Frame { url } => Ok(Some(url.clone())),
            Rendered::Download {
                saved_to: Some(path), ..
            } => Ok(Some(path.display().to_string())),
            Rendered::Image { blob_url, .. } | Rendered::Download { blob_url, .. } => {
                let path = self.blobs.export(blob_url, &self.download_dir)?;
                Ok(Some(path.display().to_string()))
            }
            Rendered::Markup(_) => Ok(None),
        }
    }

    /// Await the schema and apply it, running any restored auto-invocation
    pub async fn load(&mut self) -> Result<(), PlaygroundError> {
        let (generation, paths) = self.schema_future();
        match paths.await {
            Ok(paths) => {
                if let Some(pending) = self.on_paths(generation, Ok(paths)) {
                    let outcome = pending.execute().await;
                    self.complete(outcome);
                }
                Ok(())
            }
            Err(e) => {
                self.on_paths(generation, Err(e.clone()));
                Err(PlaygroundError::Schema(e))
            }
        }
    }

    /// Invoke `route` with `params` and wait for the rendered result
    pub async fn invoke(&mut self, route: &str, params: Params) -> Result<&Rendered, PlaygroundError> {
        if let Some(pending) = self.call_method(route, params) {
            let outcome = pending.execute().await;
            self.complete(outcome);
        }
        if let Some(error) = &self.panel.error {
            return Err(PlaygroundError::Invocation(error.clone()));
        }
        self.panel
            .result
            .as_ref()
            .ok_or_else(|| PlaygroundError::Invocation(format!("No result for {}", route)))
    }
}
