use crate::{
    classifier::classify,
    configs::ApplicationConfig,
    error::{AppError, AppResult, ErrorReason},
    expiry::days_until_expiry,
    resolver::IdentityResolver,
    store::CertStore,
    types::{NodeIdentity, Slot},
};
use anyhow::Result as AnyResult;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;

mod caller;

pub use caller::Caller;

const CLIENT_SCRIPT: &str = include_str!("../../assets/cert-cacher.sh");
const SCRIPT_CONTENT_TYPE: &str = "application/x-sh";

#[derive(Clone, Debug)]
pub struct ServerState {
    pub store: Arc<CertStore>,
    pub resolver: Arc<IdentityResolver>,
    pub script: Arc<str>,
}

#[derive(Clone, Debug)]
pub struct CacheServer {
    addr: SocketAddr,
    state: ServerState,
}

impl CacheServer {
    pub fn new(config: &ApplicationConfig, store: Arc<CertStore>, resolver: IdentityResolver) -> Self {
        Self {
            addr: config.addr,
            state: ServerState {
                store,
                resolver: Arc::new(resolver),
                script: render_script(&config.service_url()).into(),
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/sh", get(Self::handle_script).post(Self::handle_upload))
            .route("/days", get(Self::handle_days).post(Self::handle_upload))
            .route("/cert", get(Self::handle_cert).post(Self::handle_upload))
            .route("/key", get(Self::handle_key).post(Self::handle_upload))
            .fallback(get(Self::handle_invalid_path).post(Self::handle_upload))
            .with_state(self.state.clone())
    }

    pub async fn run(&self) -> AnyResult<()> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }

    async fn handle_script(state: State<ServerState>) -> impl IntoResponse {
        ([(CONTENT_TYPE, SCRIPT_CONTENT_TYPE)], state.script.to_string())
    }

    async fn handle_days(state: State<ServerState>, Caller(identity): Caller) -> AppResult<String> {
        let blob = lookup(&state.store, &identity, Slot::Cert).await?;
        let days = days_until_expiry(&blob).map_err(|e| {
            warn!("Stored certificate for {} is unreadable: {}", identity, e);
            e
        })?;
        debug!("{} has {} days left", identity, days);
        Ok(days.to_string())
    }

    async fn handle_cert(state: State<ServerState>, Caller(identity): Caller) -> AppResult<String> {
        lookup(&state.store, &identity, Slot::Cert).await
    }

    async fn handle_key(state: State<ServerState>, Caller(identity): Caller) -> AppResult<String> {
        lookup(&state.store, &identity, Slot::Key).await
    }

    async fn handle_upload(
        state: State<ServerState>,
        Caller(identity): Caller,
        body: Bytes,
    ) -> AppResult<String> {
        let blob = String::from_utf8(body.to_vec()).map_err(|_| ErrorReason::UnrecognizedContent)?;
        let slot = classify(&blob).ok_or(ErrorReason::UnrecognizedContent)?;

        state.store.upsert(&identity, blob, slot).await?;
        info!("Saved the {} for {}", slot, identity);

        Ok(format!("{identity} {slot} saved"))
    }

    async fn handle_invalid_path(Caller(identity): Caller, uri: Uri) -> AppError {
        debug!("{} asked for an unknown path {}", identity, uri.path());
        ErrorReason::InvalidPath(uri.path().to_owned()).into()
    }
}

async fn lookup(store: &CertStore, identity: &NodeIdentity, slot: Slot) -> AppResult<String> {
    store.get(identity, slot).await.ok_or_else(|| {
        ErrorReason::Missing {
            slot,
            identity: identity.clone(),
        }
        .into()
    })
}

fn render_script(service_url: &str) -> String {
    CLIENT_SCRIPT.replace("@SERVICE_URL@", service_url)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
