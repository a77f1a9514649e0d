use super::ServerState;
use crate::{
    error::{AppError, ErrorReason},
    types::NodeIdentity,
};
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::net::SocketAddr;

/// Identity of the node that opened the connection, resolved from its
/// peer address. Never taken from anything the client sends.
#[derive(Clone, Debug)]
pub struct Caller(pub NodeIdentity);

#[async_trait]
impl FromRequestParts<ServerState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let ConnectInfo(peer) = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .cloned()
            .ok_or_else(|| ErrorReason::Resolver("peer address is unavailable".to_owned()))?;

        match state.resolver.resolve(peer).await {
            Ok(identity) => {
                trace!("{} resolved to {}", peer, identity);
                Ok(Self(identity))
            }
            Err(e) => {
                warn!("Rejecting {}: {}", peer, e);
                Err(e)
            }
        }
    }
}
