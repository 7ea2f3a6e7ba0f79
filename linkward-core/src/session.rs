// Scan orchestration across the page and background contexts

use crate::context::{BackgroundContext, PageContext, PageRequest, PageResponse, ProbeRequest};
use crate::rank::group_links;
use crate::report::ScanReport;
use crate::rpc::{RpcClient, TransportError};
use crate::settings::Settings;
use crate::source::PageSource;
use futures::future::join_all;
use linkward_scanner::{
    Fault, LinkRecord, Located, RuleSet, ScanError, ScanResult, SiteInfo, VerificationOutcome, Verifier,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const SCAN_FAILED: &str = "Failed to scan links. Please refresh the page and try again.";

const DEFAULT_PAGE_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Called after each verified link with (checked, total)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{}", SCAN_FAILED)]
    ScanFailed { cause: String },

    #[error("Page error: {0}")]
    Page(#[from] ScanError),

    #[error("Page context call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Report for scan {0} was superseded by a newer scan")]
    StaleReport(ScanId),

    #[error("Unexpected response from page context to {0}")]
    UnexpectedResponse(&'static str),

    #[error("Failed to reload page: {0}")]
    Reload(String),
}

/// One inspected page: its contexts, its source, and the id of the scan
/// whose report is still wanted.
pub struct Session {
    source: PageSource,
    page: Option<PageContext>,
    background: BackgroundContext,
    page_call_timeout: Duration,
    current: Option<ScanId>,
}

impl Session {
    /// Must be called from within a tokio runtime
    pub fn new(source: PageSource, verifier: Verifier) -> Self {
        Self {
            source,
            page: None,
            background: BackgroundContext::spawn(verifier),
            page_call_timeout: DEFAULT_PAGE_CALL_TIMEOUT,
            current: None,
        }
    }

    pub fn with_page_call_timeout(mut self, timeout: Duration) -> Self {
        self.page_call_timeout = timeout;
        self
    }

    pub fn source(&self) -> &PageSource {
        &self.source
    }

    pub fn current_scan(&self) -> Option<ScanId> {
        self.current
    }

    /// Pass `report` through only if it belongs to the latest scan
    pub fn accept(&self, report: ScanReport) -> Result<ScanReport, SessionError> {
        if self.current == Some(report.scan_id) {
            Ok(report)
        } else {
            debug!("Discarding stale report for scan {}", report.scan_id);
            Err(SessionError::StaleReport(report.scan_id))
        }
    }

    async fn page_client(&mut self) -> Result<RpcClient<PageRequest, PageResponse>, SessionError> {
        if let Some(page) = self.page.as_ref().filter(|p| p.is_alive()) {
            return Ok(page.client().clone());
        }

        let page = PageContext::start(self.source.clone(), self.page_call_timeout).await?;
        let client = page.client().clone();
        self.page = Some(page);
        Ok(client)
    }

    fn restart_page(&mut self) {
        if self.page.take().is_some() {
            debug!("Stopping page context");
        }
    }

    async fn call_page(&mut self, request: PageRequest) -> Result<PageResponse, SessionError> {
        let client = self.page_client().await?;
        Ok(client.call(request).await?)
    }

    async fn scan_page(&mut self, rules: &RuleSet) -> Result<(ScanResult, SiteInfo), SessionError> {
        match self.call_page(PageRequest::Ping).await? {
            PageResponse::Pong => {}
            _ => return Err(SessionError::UnexpectedResponse("ping")),
        }

        let result = match self.call_page(PageRequest::Scan { rules: rules.clone() }).await? {
            PageResponse::Scanned(result) => result,
            _ => return Err(SessionError::UnexpectedResponse("scan")),
        };

        let site = match self.call_page(PageRequest::SiteInfo).await? {
            PageResponse::SiteInfo(site) => site,
            _ => return Err(SessionError::UnexpectedResponse("site info")),
        };

        Ok((result, site))
    }

    /// Probe every url through the background context. Output is
    /// index-aligned with `urls`; a failed call becomes a failed outcome.
    pub async fn verify(&self, urls: &[String], progress: Option<ProgressCallback>) -> Vec<VerificationOutcome> {
        let client = self.background.client();
        let total = urls.len();
        let checked = AtomicUsize::new(0);

        let calls = urls.iter().map(|url| {
            let progress = progress.clone();
            let checked = &checked;
            async move {
                let request = ProbeRequest::CheckLinkStatus { url: url.clone() };
                let outcome = match client.call(request).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Status check for {} failed: {}", url, e);
                        VerificationOutcome::failed(url.clone(), Fault::Transport)
                    }
                };
                let done = checked.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(callback) = progress {
                    callback(done, total);
                }
                outcome
            }
        });

        join_all(calls).await
    }

    /// Extract, classify, verify and rank the links of the current page.
    ///
    /// A failing page context is restarted and the scan retried once; a
    /// second failure is reported as [`SessionError::ScanFailed`].
    pub async fn run_scan(
        &mut self,
        settings: &Settings,
        rules: &RuleSet,
        progress: Option<ProgressCallback>,
    ) -> Result<ScanReport, SessionError> {
        let scan_id = ScanId::new();
        self.current = Some(scan_id);
        info!("Starting scan {} of {}", scan_id, self.source.url);

        let (result, site) = match self.scan_page(rules).await {
            Ok(scanned) => scanned,
            Err(first) => {
                warn!("Scan failed ({}), restarting page context and retrying", first);
                self.restart_page();
                self.scan_page(rules).await.map_err(|second| {
                    warn!("Retry failed: {}", second);
                    SessionError::ScanFailed {
                        cause: second.to_string(),
                    }
                })?
            }
        };

        let total = result.total();
        let types = settings.link_types;
        let ScanResult {
            team,
            onedrive,
            email,
            external,
            excluded,
        } = result;

        let started = Instant::now();
        let external = if types.external {
            let verified = self.verify_records(external, progress).await;
            Some(group_links(verified, &settings.external_status_codes))
        } else {
            debug!("External links hidden, skipping verification");
            None
        };
        let verification_time = started.elapsed();

        info!(
            "Scan {} finished: {} links, {} excluded, verification took {:?}",
            scan_id, total, excluded, verification_time
        );

        Ok(ScanReport {
            scan_id,
            site,
            team: types.teams.then_some(team),
            onedrive: types.onedrive.then_some(onedrive),
            email: types.email.then_some(email),
            external,
            excluded,
            total,
            verification_time,
        })
    }

    async fn verify_records(
        &self,
        mut records: Vec<LinkRecord>,
        progress: Option<ProgressCallback>,
    ) -> Vec<LinkRecord> {
        let urls: Vec<String> = records.iter().map(|r| r.url.clone()).collect();
        let outcomes = self.verify(&urls, progress).await;

        for (record, outcome) in records.iter_mut().zip(outcomes) {
            if let Some(fault) = outcome.fault {
                debug!("{} failed verification ({:?})", record.url, fault);
            }
            record.record_status(outcome.status);
        }
        records
    }

    /// Mark the anchor for `url`, replacing any previous mark
    pub async fn highlight(&mut self, url: &str) -> Result<Option<Located>, SessionError> {
        match self.call_page(PageRequest::Highlight { url: url.to_string() }).await? {
            PageResponse::Highlighted(located) => Ok(located),
            _ => Err(SessionError::UnexpectedResponse("highlight")),
        }
    }

    pub async fn remove_highlight(&mut self) -> Result<(), SessionError> {
        match self.call_page(PageRequest::RemoveHighlight).await? {
            PageResponse::HighlightRemoved => Ok(()),
            _ => Err(SessionError::UnexpectedResponse("remove highlight")),
        }
    }

    /// Swap in a new document for the same session. Drops any mark.
    pub async fn reload(&mut self, source: PageSource) -> Result<(), SessionError> {
        if self.page.as_ref().is_some_and(|p| p.is_alive()) {
            match self.call_page(PageRequest::Reload { source: source.clone() }).await? {
                PageResponse::Reloaded(Ok(())) => {}
                PageResponse::Reloaded(Err(e)) => return Err(SessionError::Reload(e)),
                _ => return Err(SessionError::UnexpectedResponse("reload")),
            }
        }
        self.source = source;
        Ok(())
    }
}
