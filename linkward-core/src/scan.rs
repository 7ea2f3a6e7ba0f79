use crate::report::ScanReport;
use crate::session::{ProgressCallback, Session, SessionError};
use crate::settings::Settings;
use crate::source::PageSource;
use indicatif::{ProgressBar, ProgressStyle};
use linkward_scanner::{Located, RuleSet, Verifier, VerifierConfig};
use std::sync::Arc;
use std::time::Duration;

/// Options for a single scan
pub struct ScanOptions {
    pub source: PageSource,
    pub settings: Settings,
    pub rules: RuleSet,
    pub verifier: VerifierConfig,
    pub show_progress: bool,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run one scan end to end, with a spinner while links are verified
pub async fn execute_scan(options: ScanOptions) -> Result<ScanReport, SessionError> {
    let ScanOptions {
        source,
        settings,
        rules,
        verifier,
        show_progress,
    } = options;

    let verifier = Verifier::with_config(verifier)?;
    let progress_bar = show_progress.then(|| spinner("Scanning page..."));

    let callback: Option<ProgressCallback> = progress_bar.clone().map(|pb| {
        Arc::new(move |done: usize, total: usize| {
            pb.set_message(format!("Checking links... {}/{}", done, total));
        }) as ProgressCallback
    });

    let mut session = Session::new(source, verifier);
    let result = session.run_scan(&settings, &rules, callback).await;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    session.accept(result?)
}

/// Find and mark the anchor for `url` on the given page
pub async fn execute_locate(source: PageSource, url: &str) -> Result<Option<Located>, SessionError> {
    let mut session = Session::new(source, Verifier::new()?);
    session.highlight(url).await
}
