//! Transport between the router and an extension.
//!
//! The router never links against extensions. It calls well-known command
//! ids through an [`ExtensionBridge`] and exchanges MessagePack payloads.

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Command not available: {0}")]
    UnknownCommand(String),

    #[error("Transport failed: {0}")]
    Transport(String),
}

/// Invokes an extension command with an encoded payload.
#[async_trait]
pub trait ExtensionBridge: Send + Sync {
    async fn invoke(&self, command_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, BridgeError>;
}

/// In-process bridge backed by a closure.
///
/// Wire an extension server straight into the host:
///
/// ```rust,ignore
/// let server = ExtensionServer::new("azureStorage", Storage);
/// let bridge = LoopbackBridge::new(move |id, payload| server.handle(id, payload));
/// ```
pub struct LoopbackBridge<F> {
    handler: F,
}

impl<F> LoopbackBridge<F>
where
    F: Fn(&str, &[u8]) -> Vec<u8> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F> ExtensionBridge for LoopbackBridge<F>
where
    F: Fn(&str, &[u8]) -> Vec<u8> + Send + Sync,
{
    async fn invoke(&self, command_id: &str, payload: Vec<u8>) -> Result<Vec<u8>, BridgeError> {
        let reply = (self.handler)(command_id, payload.as_slice());
        if reply.is_empty() {
            return Err(BridgeError::Transport(format!(
                "Empty reply for {}",
                command_id
            )));
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_passes_payload() {
        let bridge = LoopbackBridge::new(|id: &str, payload: &[u8]| {
            let mut reply = id.as_bytes().to_vec();
            reply.extend_from_slice(payload);
            reply
        });

        let reply = bridge.invoke("ext.ping", vec![b'!']).await.unwrap();
        assert_eq!(reply, b"ext.ping!".to_vec());
    }

    #[tokio::test]
    async fn test_empty_reply_is_transport_error() {
        let bridge = LoopbackBridge::new(|_: &str, _: &[u8]| Vec::new());
        let err = bridge.invoke("ext.ping", Vec::new()).await.unwrap_err();
        assert!(matches!(err, BridgeError::Transport(_)));
    }
}
