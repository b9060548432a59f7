//! # Playground App
//!
//! Terminal playground for a service that publishes an OpenAPI document.
//!
//! ## Layout
//! The left panel lists one card per route (GET routes first, then POST
//! routes). Expanding a card shows one input per parameter, the resolved
//! request URL and an equivalent Python `requests` snippet. The right panel
//! shows the classified result of the last invocation or the normalised error.
//!
//! ## Shareable state
//! Every invocation records `base64(JSON({route, data}))` as the fragment of
//! the playground link `<api-root>/api#...`. Starting with `--link` or
//! `--state` restores that route and its inputs, and re-runs GET routes.
//!
//! ## Modules
//! - **controller**: [`Playground`], owner of the route table and cards
//! - **card**: [`RouteCard`], inputs and live previews for one route
//! - **render**: result classification, blob store, error normalisation
//! - **fragment**: link state codec and [`Location`]
//! - **app** / **screens**: the ratatui front end

pub mod app;
pub mod card;
pub mod config;
pub mod controller;
pub mod fragment;
pub mod integrations;
pub mod params;
pub mod preview;
pub mod render;
pub mod screens;

pub use card::RouteCard;
pub use controller::{Playground, PlaygroundError};
pub use fragment::{FragmentState, Location};

/// Playground version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::app::{AppState, TuiApp};
    pub use crate::config::{build_config, CliArgs, PlaygroundConfig};
    pub use crate::controller::{CallOutcome, LoadStatus, PendingCall, Playground, PlaygroundError};
    pub use crate::integrations::{Clipboard, DirectoryDownloader, Downloader, SystemClipboard};
    pub use crate::params::{ParamValue, Params};
    pub use crate::render::Rendered;
    pub use crate::screens::SplitPane;
}
