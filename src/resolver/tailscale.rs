use crate::{
    error::{AppResult, ErrorReason},
    types::NodeIdentity,
};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;

/// Asks the local tailscale daemon who owns a peer address by running
/// `tailscale whois --json <addr>`.
#[derive(Clone, Debug)]
pub struct TailscaleResolver {
    command: PathBuf,
}

impl TailscaleResolver {
    pub fn new<P>(command: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            command: command.as_ref().to_path_buf(),
        }
    }

    pub async fn resolve(&self, peer: SocketAddr) -> AppResult<NodeIdentity> {
        let output = Command::new(&self.command)
            .arg("whois")
            .arg("--json")
            .arg(peer.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                ErrorReason::Resolver(format!("failed to run {}: {}", self.command.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ErrorReason::Resolver(format!(
                "whois {} exited with {}: {}",
                peer,
                output.status,
                stderr.trim()
            ))
            .into());
        }

        parse_whois(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WhoIsResponse {
    node: WhoIsNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WhoIsNode {
    name: String,
}

fn parse_whois(stdout: &[u8]) -> AppResult<NodeIdentity> {
    let response: WhoIsResponse = serde_json::from_slice(stdout)
        .map_err(|e| ErrorReason::Resolver(format!("unexpected whois output: {e}")))?;
    NodeIdentity::new(&response.node.name)
}
