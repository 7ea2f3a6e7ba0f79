use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use linkward_core::report::{
    generate_json_report, generate_markdown_report, generate_text_report, save_report,
};
use linkward_core::settings::{self, Settings};
use linkward_core::{PageSource, ReportFormat, ScanOptions, ScanReport, execute_locate, execute_scan};
use linkward_scanner::{RuleSet, VerifierConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub const EXIT_CLEAN: i32 = 0;
/// A surfaced external link is unreachable or answered 4xx/5xx
pub const EXIT_BROKEN_LINKS: i32 = 1;
pub const EXIT_FAILURE: i32 = 2;
/// `locate` found no matching anchor
pub const EXIT_NOT_FOUND: i32 = 1;

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn verifier_config(timeout_secs: u64, follow_redirects: bool) -> VerifierConfig {
    VerifierConfig {
        timeout: Duration::from_secs(timeout_secs),
        follow_redirects,
        ..VerifierConfig::default()
    }
}

/// Fetch `source` when it is a URL, otherwise read it from disk
pub async fn load_page_source(
    source: &str,
    page_url: Option<&str>,
    config: &VerifierConfig,
) -> Result<PageSource> {
    if PageSource::is_remote(source) {
        PageSource::fetch(source, &config.user_agent, config.timeout)
            .await
            .with_context(|| format!("Failed to fetch {}", source))
    } else {
        let path = shellexpand::tilde(source);
        PageSource::from_file(Path::new(path.as_ref()), page_url)
            .with_context(|| format!("Failed to read {}", source))
    }
}

pub fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let path = path.cloned().unwrap_or_else(settings::default_path);
    Ok(Settings::load(&path)?)
}

pub fn load_rules(path: Option<&PathBuf>) -> Result<RuleSet> {
    match path {
        Some(path) => RuleSet::from_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display())),
        None => Ok(RuleSet::default()),
    }
}

pub fn render_report(report: &ScanReport, format: ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_text_report(report),
        ReportFormat::Json => generate_json_report(report)?,
        ReportFormat::Markdown => generate_markdown_report(report),
    })
}

pub fn exit_code(report: &ScanReport) -> i32 {
    if report.has_broken_links() {
        EXIT_BROKEN_LINKS
    } else {
        EXIT_CLEAN
    }
}

fn print_summary(report: &ScanReport) {
    if let Some(message) = report.message() {
        eprintln!("{} {}", "!".yellow(), message);
        return;
    }

    let external = report.external.as_ref();
    let displayed = external.map_or(0, |v| v.displayed());
    let line = format!(
        "{} links, {} external shown, {} excluded",
        report.total, displayed, report.excluded
    );
    if report.has_broken_links() {
        eprintln!("{} {} ({})", "✗".red(), line, "broken links found".red().bold());
    } else {
        eprintln!("{} {}", "✓".green(), line);
    }
}

pub async fn handle_scan(args: &ArgMatches) -> Result<i32> {
    let source = args
        .get_one::<String>("SOURCE")
        .ok_or_else(|| anyhow!("missing SOURCE"))?;
    let page_url = args.get_one::<String>("page-url").map(String::as_str);
    let timeout = args.get_one::<u64>("timeout").copied().unwrap_or(10);
    let follow = !args.get_flag("no-follow-redirects");
    let quiet = args.get_flag("quiet");
    let format_name = args.get_one::<String>("format").map_or("text", String::as_str);
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unknown report format: {}", format_name))?;

    let settings = load_settings(args.get_one::<PathBuf>("settings"))?;
    let rules = load_rules(args.get_one::<PathBuf>("rules"))?;
    let verifier = verifier_config(timeout, follow);
    let page = load_page_source(source, page_url, &verifier).await?;

    info!("Scanning {} (timeout {}s, follow redirects: {})", page.url, timeout, follow);

    let report = execute_scan(ScanOptions {
        source: page,
        settings,
        rules,
        verifier,
        show_progress: !quiet,
    })
    .await?;

    let rendered = render_report(&report, format)?;
    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            save_report(&rendered, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                eprintln!("{} Report saved to {}", "✓".green(), path.display());
            }
        }
        None => print!("{}", rendered),
    }

    if !quiet {
        print_summary(&report);
    }
    Ok(exit_code(&report))
}

pub async fn handle_locate(args: &ArgMatches) -> Result<i32> {
    let source = args
        .get_one::<String>("SOURCE")
        .ok_or_else(|| anyhow!("missing SOURCE"))?;
    let url = args
        .get_one::<String>("URL")
        .ok_or_else(|| anyhow!("missing URL"))?;
    let page_url = args.get_one::<String>("page-url").map(String::as_str);

    let page = load_page_source(source, page_url, &VerifierConfig::default()).await?;
    match execute_locate(page, url).await? {
        Some(located) => {
            println!("{} anchor #{} ({})", "✓".green(), located.index, located.strategy.as_str());
            println!("  text: {}", located.text);
            println!("  href: {}", located.href);
            println!("  html: {}", located.outer_html);
            Ok(EXIT_CLEAN)
        }
        None => {
            println!("{} {} not found on the page", "✗".red(), url);
            Ok(EXIT_NOT_FOUND)
        }
    }
}

pub fn handle_init(args: &ArgMatches) -> Result<i32> {
    let raw_path = args
        .get_one::<String>("PATH")
        .map_or(settings::DEFAULT_SETTINGS_PATH, String::as_str);
    let force = args.get_flag("force");
    let path = PathBuf::from(shellexpand::tilde(raw_path).as_ref());

    Settings::default().save(&path, force)?;
    if !args.get_flag("quiet") {
        println!("{} Wrote default settings to {}", "✓".green(), path.display());
    }
    Ok(EXIT_CLEAN)
}
