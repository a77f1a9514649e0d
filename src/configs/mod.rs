use crate::error::AppResult;
use config::{
    builder::DefaultState, Config, ConfigBuilder, Environment as ConfigEnv, File as ConfigFile,
};
use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    time::Duration,
};

pub const DEFAULT_PORT: u16 = 9191;
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApplicationConfig {
    pub workers: Option<usize>,

    #[serde(default = "default_addr")]
    pub addr: SocketAddr,

    /// Name of this service on the overlay network.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl ApplicationConfig {
    pub fn load_config() -> AppResult<Self> {
        let builder = Config::builder()
            .add_source(ConfigFile::with_name("/etc/cert-cacher/config").required(false))
            .add_source(ConfigFile::with_name("config").required(false))
            .add_source(
                ConfigEnv::with_prefix("CERTCACHER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        Self::load_from(builder)
    }

    pub fn load_from(builder: ConfigBuilder<DefaultState>) -> AppResult<Self> {
        let cfg = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Base URL clients use to reach this service.
    pub fn service_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.addr.port())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            workers: Default::default(),
            addr: default_addr(),
            hostname: default_hostname(),
            storage: Default::default(),
            resolver: Default::default(),
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT)
}

fn default_hostname() -> String {
    "cert-cacher".to_owned()
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory used by the file backend.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Default::default(),
            directory: default_directory(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("certs")
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    #[serde(alias = "disk")]
    File,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub kind: ResolverKind,

    /// Tailscale CLI used by the `tailscale` resolver.
    #[serde(default = "default_command")]
    pub command: PathBuf,

    #[serde(
        default = "default_resolve_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    /// Address table used by the `static` resolver.
    #[serde(default)]
    pub peers: Vec<StaticPeer>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            kind: Default::default(),
            command: default_command(),
            timeout: default_resolve_timeout(),
            peers: Default::default(),
        }
    }
}

fn default_command() -> PathBuf {
    PathBuf::from("tailscale")
}

const fn default_resolve_timeout() -> Duration {
    DEFAULT_RESOLVE_TIMEOUT
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    #[default]
    Tailscale,
    Static,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StaticPeer {
    pub addr: IpAddr,
    pub identity: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorReason;
    use config::FileFormat;

    fn load(toml: &str) -> AppResult<ApplicationConfig> {
        ApplicationConfig::load_from(
            Config::builder().add_source(ConfigFile::from_str(toml, FileFormat::Toml)),
        )
    }

    fn parse(toml: &str) -> ApplicationConfig {
        load(toml).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = parse("");
        assert_eq!(cfg.workers, None);
        assert_eq!(cfg.addr, "0.0.0.0:9191".parse().unwrap());
        assert_eq!(cfg.hostname, "cert-cacher");
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.resolver.kind, ResolverKind::Tailscale);
        assert_eq!(cfg.resolver.timeout, DEFAULT_RESOLVE_TIMEOUT);
        assert_eq!(cfg.service_url(), "http://cert-cacher:9191");
    }

    #[test]
    fn file_backend_and_static_peers() {
        let cfg = parse(
            r#"
            addr = "100.64.0.10:8443"
            hostname = "certs"

            [storage]
            backend = "disk"
            directory = "/var/lib/cert-cacher"

            [resolver]
            kind = "static"
            timeout = "250ms"

            [[resolver.peers]]
            addr = "100.64.0.3"
            identity = "m3.tailnet.net."
            "#,
        );

        assert_eq!(cfg.storage.backend, StorageBackend::File);
        assert_eq!(cfg.storage.directory, PathBuf::from("/var/lib/cert-cacher"));
        assert_eq!(cfg.resolver.kind, ResolverKind::Static);
        assert_eq!(cfg.resolver.timeout, Duration::from_millis(250));
        assert_eq!(cfg.resolver.peers.len(), 1);
        assert_eq!(cfg.resolver.peers[0].addr, "100.64.0.3".parse::<IpAddr>().unwrap());
        assert_eq!(cfg.service_url(), "http://certs:8443");
    }

    #[test]
    fn unknown_backend_is_a_config_error() {
        let err = load("[storage]\nbackend = \"tape\"\n").unwrap_err();
        assert!(matches!(err.reason(), ErrorReason::Config(_)), "{err:?}");
    }

    #[test]
    fn malformed_duration_is_a_config_error() {
        let err = load("[resolver]\ntimeout = \"soon\"\n").unwrap_err();
        assert!(matches!(err.reason(), ErrorReason::Config(_)), "{err:?}");
    }
}
