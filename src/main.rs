#[macro_use]
extern crate tracing;

use anyhow::{Context, Result as AnyResult};
use configs::ApplicationConfig;
use resolver::IdentityResolver;
use server::CacheServer;
use std::{num::NonZeroUsize, sync::Arc};
use store::{Backend, CertStore};

mod classifier;
mod configs;
mod error;
mod expiry;
mod resolver;
mod server;
mod store;
#[cfg(test)]
mod test_support;
mod types;

fn main() -> AnyResult<()> {
    // Load environment variables from the `.env` file
    dotenvy::dotenv().ok();
    // Initialize the logger after loading the environment variables
    tracing_subscriber::fmt::init();

    let app_config =
        ApplicationConfig::load_config().context("Failed to parse configuration files")?;

    // Setup async runtime
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(worker) = app_config.workers.and_then(NonZeroUsize::new) {
        runtime_builder.worker_threads(worker.into());
    }
    runtime_builder
        .enable_all()
        .build()
        .context("Failed to bootstrap the Tokio runtime")?
        .block_on(server_loop(app_config))
}

async fn server_loop(app_config: ApplicationConfig) -> AnyResult<()> {
    let store = Arc::new(CertStore::from_config(&app_config.storage));
    store
        .init()
        .await
        .context("Failed to initialize the certificate store")?;
    match store.backend() {
        Backend::Memory(_) => info!("Keeping certificates in memory"),
        Backend::File(backend) => {
            info!("Keeping certificates in {}", backend.directory().display())
        }
    }

    let resolver = IdentityResolver::from_config(&app_config.resolver)
        .context("Failed to set up the identity resolver")?;
    info!(
        "Serving {} as {:?} with the {:?} resolver",
        app_config.service_url(),
        app_config.hostname,
        app_config.resolver.kind
    );

    CacheServer::new(&app_config, store, resolver).run().await
}
