//! # Sample Service
//!
//! A small axum service publishing `/openapi.json`, used to explore the
//! playground by hand and as its integration-test target.
//!
//! ## Endpoints
//! - `GET /hello`, `GET /greet`: plain text
//! - `GET /html`: HTML fragment
//! - `GET /json`, `GET /add`: JSON
//! - `GET /pixel`: `image/png`
//! - `GET /archive`, `GET /config.yaml`: downloads with `Content-Disposition`
//! - `GET /fail`, `GET /fail_verbose`: `{"detail": ...}` errors
//! - `GET /go/{path}`: temporary redirect
//! - `POST /echo`: JSON echo
//! - `POST /upload`: multipart upload

pub mod openapi;
pub mod routes;

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;

pub use openapi::openapi_document;
pub use routes::build_router;

/// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The sample service bound to one address
pub struct SampleService {
    addr: SocketAddr,
    router: Router,
}

impl SampleService {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            router: build_router(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.run_with_listener(listener).await
    }

    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!("Sample service listening on {}", addr);

        axum::serve(listener, self.router).await
    }
}

/// Serve on a random local port in the background
pub async fn spawn() -> Result<(SocketAddr, tokio::task::JoinHandle<()>), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let service = SampleService::new(addr);
    let handle = tokio::spawn(async move {
        service.run_with_listener(listener).await.ok();
    });

    Ok((addr, handle))
}
