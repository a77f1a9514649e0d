use crate::{
    configs::StaticPeer,
    error::{AppResult, ErrorReason},
    types::NodeIdentity,
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
};

/// Resolves callers from a fixed address table.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    peers: HashMap<IpAddr, NodeIdentity>,
}

impl StaticResolver {
    pub fn from_peers(peers: &[StaticPeer]) -> AppResult<Self> {
        let mut resolver = Self::default();
        for peer in peers {
            resolver.insert(peer.addr, NodeIdentity::new(&peer.identity)?);
        }
        Ok(resolver)
    }

    pub fn insert(&mut self, addr: IpAddr, identity: NodeIdentity) {
        self.peers.insert(addr.to_canonical(), identity);
    }

    pub fn resolve(&self, peer: SocketAddr) -> AppResult<NodeIdentity> {
        self.peers
            .get(&peer.ip().to_canonical())
            .cloned()
            .ok_or_else(|| ErrorReason::Resolver(format!("unknown peer {}", peer.ip())).into())
    }
}
