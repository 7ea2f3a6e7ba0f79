// Typed request/response calls between execution contexts

use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Failures of the call itself, never of the work behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("receiving context is unavailable")]
    Unavailable,

    #[error("receiving context dropped the request without answering")]
    NoResponse,

    #[error("call timed out after {0:?}")]
    TimedOut(Duration),
}

/// A request together with the channel its answer goes back on
pub struct Envelope<Req, Resp> {
    pub request: Req,
    pub reply: oneshot::Sender<Resp>,
}

impl<Req, Resp> Envelope<Req, Resp> {
    /// Answer the caller. A caller that stopped waiting is not an error.
    pub fn respond(self, response: Resp) {
        if self.reply.send(response).is_err() {
            debug!("Caller went away before the response was ready");
        }
    }
}

pub type Mailbox<Req, Resp> = mpsc::Receiver<Envelope<Req, Resp>>;

pub struct RpcClient<Req, Resp> {
    sender: mpsc::Sender<Envelope<Req, Resp>>,
    timeout: Duration,
}

impl<Req, Resp> Clone for RpcClient<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            timeout: self.timeout,
        }
    }
}

/// Create a client and the mailbox its calls arrive in
pub fn channel<Req, Resp>(capacity: usize, timeout: Duration) -> (RpcClient<Req, Resp>, Mailbox<Req, Resp>) {
    let (sender, mailbox) = mpsc::channel(capacity);
    (RpcClient { sender, timeout }, mailbox)
}

impl<Req, Resp> RpcClient<Req, Resp> {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn call(&self, request: Req) -> Result<Resp, TransportError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Envelope { request, reply })
            .await
            .map_err(|_| TransportError::Unavailable)?;

        match tokio::time::timeout(self.timeout, response).await {
            Err(_) => Err(TransportError::TimedOut(self.timeout)),
            Ok(Err(_)) => Err(TransportError::NoResponse),
            Ok(Ok(response)) => Ok(response),
        }
    }
}
