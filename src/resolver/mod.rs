//! Maps the peer address of a connection to the caller's node identity.

use crate::{
    configs::{ResolverConfig, ResolverKind},
    error::{AppResult, ErrorReason},
    types::NodeIdentity,
};
use std::{net::SocketAddr, time::Duration};
use tokio::time::timeout;

mod static_table;
mod tailscale;

pub use static_table::StaticResolver;
pub use tailscale::TailscaleResolver;

#[derive(Clone, Debug)]
pub enum ResolverBackend {
    Tailscale(TailscaleResolver),
    Static(StaticResolver),
}

#[derive(Clone, Debug)]
pub struct IdentityResolver {
    inner: ResolverBackend,
    timeout: Duration,
}

impl IdentityResolver {
    pub fn new(inner: ResolverBackend, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn from_config(config: &ResolverConfig) -> AppResult<Self> {
        let inner = match config.kind {
            ResolverKind::Tailscale => {
                ResolverBackend::Tailscale(TailscaleResolver::new(&config.command))
            }
            ResolverKind::Static => {
                ResolverBackend::Static(StaticResolver::from_peers(&config.peers)?)
            }
        };
        Ok(Self::new(inner, config.timeout))
    }

    pub async fn resolve(&self, peer: SocketAddr) -> AppResult<NodeIdentity> {
        let lookup = async {
            match &self.inner {
                ResolverBackend::Tailscale(resolver) => resolver.resolve(peer).await,
                ResolverBackend::Static(resolver) => resolver.resolve(peer),
            }
        };

        match timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(ErrorReason::Resolver(format!(
                "lookup of {} timed out after {}ms",
                peer,
                self.timeout.as_millis()
            ))
            .into()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_lookups_time_out() {
        let dir = TempDir::new().unwrap();
        let command = crate::test_support::sleeping_command(dir.path(), 5);
        let resolver = IdentityResolver::new(
            ResolverBackend::Tailscale(TailscaleResolver::new(command)),
            Duration::from_millis(100),
        );

        let started = Instant::now();
        let err = resolver
            .resolve("100.64.0.3:41641".parse().unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err.reason(), ErrorReason::Resolver(_)), "{err:?}");
        assert!(err.to_string().contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn static_lookups_finish_within_the_timeout() {
        let mut table = StaticResolver::default();
        table.insert(
            "100.64.0.3".parse().unwrap(),
            NodeIdentity::new("m3.tailnet.net.").unwrap(),
        );
        let resolver = IdentityResolver::new(ResolverBackend::Static(table), Duration::from_millis(100));

        let identity = resolver
            .resolve("100.64.0.3:41641".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(identity.as_str(), "m3.tailnet.net");
    }
}
