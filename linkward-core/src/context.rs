// Execution contexts: the page owner and the background prober

use crate::rpc::{self, Mailbox, RpcClient};
use crate::source::PageSource;
use linkward_scanner::error::Result;
use linkward_scanner::{
    Located, Marker, Page, RuleSet, ScanError, ScanResult, SiteInfo, VerificationOutcome, Verifier, scan,
};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const PAGE_MAILBOX: usize = 16;
const BACKGROUND_MAILBOX: usize = 256;

/// Slack on top of a full HEAD + GET probe before a call is given up
const PROBE_CALL_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum PageRequest {
    Ping,
    Scan { rules: RuleSet },
    SiteInfo,
    Highlight { url: String },
    RemoveHighlight,
    /// Replace the document; any mark is dropped
    Reload { source: PageSource },
}

#[derive(Debug, Clone)]
pub enum PageResponse {
    Pong,
    Scanned(ScanResult),
    SiteInfo(SiteInfo),
    Highlighted(Option<Located>),
    HighlightRemoved,
    Reloaded(std::result::Result<(), String>),
}

/// Owns the parsed document on a dedicated thread.
///
/// The parsed tree cannot leave the thread that built it, so every read of
/// the document and every change to the mark goes through this context's
/// mailbox, one request at a time.
pub struct PageContext {
    client: RpcClient<PageRequest, PageResponse>,
}

impl PageContext {
    pub async fn start(source: PageSource, call_timeout: Duration) -> Result<Self> {
        let (client, mailbox) = rpc::channel(PAGE_MAILBOX, call_timeout);
        let (ready_tx, ready_rx) = oneshot::channel();

        thread::Builder::new()
            .name("linkward-page".to_string())
            .spawn(move || match Page::parse(&source.html, &source.url) {
                Ok(page) => {
                    let _ = ready_tx.send(Ok(()));
                    serve_page(page, mailbox);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })?;

        match ready_rx.await {
            Ok(Ok(())) => {
                debug!("Page context started");
                Ok(Self { client })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ScanError::ContextUnavailable(
                "exited during startup".to_string(),
            )),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_client(client: RpcClient<PageRequest, PageResponse>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RpcClient<PageRequest, PageResponse> {
        &self.client
    }

    pub fn is_alive(&self) -> bool {
        !self.client.is_closed()
    }
}

fn serve_page(mut page: Page, mut mailbox: Mailbox<PageRequest, PageResponse>) {
    let mut marker = Marker::new();

    while let Some(envelope) = mailbox.blocking_recv() {
        let response = match &envelope.request {
            PageRequest::Ping => PageResponse::Pong,
            PageRequest::Scan { rules } => PageResponse::Scanned(scan(&page, rules)),
            PageRequest::SiteInfo => PageResponse::SiteInfo(page.site_info()),
            PageRequest::Highlight { url } => {
                PageResponse::Highlighted(marker.mark(&page, url).cloned())
            }
            PageRequest::RemoveHighlight => {
                marker.clear();
                PageResponse::HighlightRemoved
            }
            PageRequest::Reload { source } => match Page::parse(&source.html, &source.url) {
                Ok(reloaded) => {
                    marker.clear();
                    page = reloaded;
                    info!("Page reloaded from {}", source.url);
                    PageResponse::Reloaded(Ok(()))
                }
                Err(e) => PageResponse::Reloaded(Err(e.to_string())),
            },
        };
        envelope.respond(response);
    }

    debug!("Page context for {} stopped", page.url());
}

#[derive(Debug, Clone)]
pub enum ProbeRequest {
    CheckLinkStatus { url: String },
}

/// Runs link probes off the caller's task, one spawned task per request
pub struct BackgroundContext {
    client: RpcClient<ProbeRequest, VerificationOutcome>,
    task: JoinHandle<()>,
}

impl BackgroundContext {
    /// Must be called from within a tokio runtime
    pub fn spawn(verifier: Verifier) -> Self {
        let call_timeout = verifier.timeout() * 2 + PROBE_CALL_MARGIN;
        let (client, mut mailbox) = rpc::channel(BACKGROUND_MAILBOX, call_timeout);

        let task = tokio::spawn(async move {
            while let Some(envelope) = mailbox.recv().await {
                let verifier = verifier.clone();
                tokio::spawn(async move {
                    let outcome = match &envelope.request {
                        ProbeRequest::CheckLinkStatus { url } => verifier.probe(url).await,
                    };
                    envelope.respond(outcome);
                });
            }
            debug!("Background context stopped");
        });

        Self { client, task }
    }

    #[cfg(test)]
    pub(crate) fn from_client(client: RpcClient<ProbeRequest, VerificationOutcome>) -> Self {
        Self {
            client,
            task: tokio::spawn(async {}),
        }
    }

    pub fn client(&self) -> &RpcClient<ProbeRequest, VerificationOutcome> {
        &self.client
    }
}

impl Drop for BackgroundContext {
    fn drop(&mut self) {
        self.task.abort();
    }
}
