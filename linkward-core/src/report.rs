// Report generation from a finished scan

use crate::rank::{ExternalView, NO_LINKS_FOUND};
use crate::session::ScanId;
use linkward_scanner::{LinkRecord, Location, SiteInfo};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportFormat {
    Text,
    Json,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Everything one scan produced. Hidden categories are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scan_id: ScanId,
    pub site: SiteInfo,
    pub team: Option<Vec<LinkRecord>>,
    pub onedrive: Option<Vec<LinkRecord>>,
    pub email: Option<Vec<LinkRecord>>,
    pub external: Option<ExternalView>,
    pub excluded: usize,
    /// Links in the four categories, hidden ones included
    pub total: usize,
    pub verification_time: Duration,
}

impl ScanReport {
    /// Page-level message replacing the report body, if any
    pub fn message(&self) -> Option<&'static str> {
        (self.total == 0).then_some(NO_LINKS_FOUND)
    }

    /// Whether any surfaced external link is unreachable or answered 4xx/5xx
    pub fn has_broken_links(&self) -> bool {
        self.external.as_ref().is_some_and(|view| {
            view.groups()
                .iter()
                .flat_map(|g| &g.members)
                .any(|record| record.severity() <= 3)
        })
    }

    fn sections(&self) -> [(&'static str, Option<&Vec<LinkRecord>>); 3] {
        [
            ("Team", self.team.as_ref()),
            ("OneDrive", self.onedrive.as_ref()),
            ("Email", self.email.as_ref()),
        ]
    }
}

fn none_found(label: &str) -> String {
    format!("No {} links found on this page.", label.to_lowercase())
}

fn location_badge(location: Location) -> String {
    match location {
        Location::Body => String::new(),
        other => format!(" [{}]", other.as_str()),
    }
}

pub fn generate_text_report(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push_str("                           LINKWARD LINK REPORT\n");
    out.push_str(RULE);
    out.push('\n');

    out.push_str(&format!("Scan ID:      {}\n", report.scan_id));
    out.push_str(&format!("Site:         {}\n", report.site.site_title));
    out.push_str(&format!("Page:         {}\n", report.site.page_title));
    out.push_str(&format!("URL:          {}\n", report.site.clean_url));
    out.push_str(&format!(
        "SharePoint:   {}\n",
        if report.site.is_sharepoint { "yes" } else { "no" }
    ));
    out.push_str(&format!(
        "Generated:    {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(message) = report.message() {
        out.push_str(message);
        out.push_str("\n\n");
        return out;
    }

    out.push_str(RULE);
    out.push_str("SUMMARY\n");
    out.push_str(RULE);
    out.push('\n');
    for (label, links) in report.sections() {
        let count = links.map_or("hidden".to_string(), |l| l.len().to_string());
        out.push_str(&format!("  {:<16}{}\n", format!("{}:", label), count));
    }
    let external = match &report.external {
        Some(view) => format!("{} shown of {}", view.displayed(), view.raw_count()),
        None => "hidden".to_string(),
    };
    out.push_str(&format!("  {:<16}{}\n", "External:", external));
    out.push_str(&format!("  {:<16}{}\n\n", "Excluded:", report.excluded));

    for (label, links) in report.sections() {
        let Some(links) = links else { continue };
        out.push_str(RULE);
        out.push_str(&format!("{} LINKS ({})\n", label.to_uppercase(), links.len()));
        out.push_str(RULE);
        out.push('\n');

        if links.is_empty() {
            out.push_str(&format!("  {}\n\n", none_found(label)));
            continue;
        }
        for (idx, link) in links.iter().enumerate() {
            out.push_str(&format!("  {}. {}{}\n", idx + 1, link.text, location_badge(link.location)));
            out.push_str(&format!("     {}\n", link.url));
        }
        out.push('\n');
    }

    if let Some(view) = &report.external {
        out.push_str(RULE);
        out.push_str(&format!("EXTERNAL LINKS ({})\n", view.displayed()));
        out.push_str(RULE);
        out.push('\n');

        if let Some(message) = view.message() {
            out.push_str(&format!("  {}\n\n", message));
        }
        for group in view.groups() {
            out.push_str(&format!("  {} ({})\n", group.group.name(), group.count));
            for link in &group.members {
                out.push_str(&format!(
                    "    [{}] {}{}\n",
                    link.status_text(),
                    link.text,
                    location_badge(link.location)
                ));
                out.push_str(&format!("        {}\n", link.url));
            }
            out.push('\n');
        }
    }

    out.push_str(RULE);
    out.push_str(&format!(
        "Verification took {:.1}s\n",
        report.verification_time.as_secs_f64()
    ));
    out
}

fn link_json(link: &LinkRecord) -> serde_json::Value {
    serde_json::json!({
        "url": link.url,
        "text": link.text,
        "location": link.location,
        "status": link.status(),
        "status_text": link.status_text(),
        "severity": link.severity(),
    })
}

fn links_json(links: Option<&Vec<LinkRecord>>) -> serde_json::Value {
    match links {
        Some(links) => serde_json::Value::Array(links.iter().map(link_json).collect()),
        None => serde_json::Value::Null,
    }
}

pub fn generate_json_report(report: &ScanReport) -> Result<String, serde_json::Error> {
    let external = report.external.as_ref().map(|view| {
        let state = match view {
            ExternalView::NoLinksFound => "no_links_found",
            ExternalView::NoneMatchFilters { .. } => "none_match_filters",
            ExternalView::Groups { .. } => "groups",
        };
        serde_json::json!({
            "state": state,
            "message": view.message(),
            "displayed": view.displayed(),
            "raw_count": view.raw_count(),
            "groups": view.groups().iter().map(|g| serde_json::json!({
                "group": g.group.name(),
                "count": g.count,
                "members": g.members.iter().map(link_json).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })
    });

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkward",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json",
                "scan_id": report.scan_id,
            },
            "page": report.site,
            "message": report.message(),
            "summary": {
                "total_links": report.total,
                "team": report.team.as_ref().map(Vec::len),
                "onedrive": report.onedrive.as_ref().map(Vec::len),
                "email": report.email.as_ref().map(Vec::len),
                "external_displayed": report.external.as_ref().map(ExternalView::displayed),
                "external_raw": report.external.as_ref().map(ExternalView::raw_count),
                "excluded": report.excluded,
                "has_broken_links": report.has_broken_links(),
                "verification_ms": report.verification_time.as_millis() as u64,
            },
            "categories": {
                "team": links_json(report.team.as_ref()),
                "onedrive": links_json(report.onedrive.as_ref()),
                "email": links_json(report.email.as_ref()),
            },
            "external": external,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_markdown_report(report: &ScanReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Link report: {}\n\n", report.site.page_title));
    out.push_str(&format!("- **Site:** {}\n", report.site.site_title));
    out.push_str(&format!("- **URL:** <{}>\n", report.site.clean_url));
    out.push_str(&format!("- **Scan ID:** `{}`\n", report.scan_id));
    out.push_str(&format!(
        "- **Generated:** {}\n\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(message) = report.message() {
        out.push_str(&format!("_{}_\n", message));
        return out;
    }

    for (label, links) in report.sections() {
        let Some(links) = links else { continue };
        out.push_str(&format!("## {} links ({})\n\n", label, links.len()));
        if links.is_empty() {
            out.push_str(&format!("_{}_\n\n", none_found(label)));
            continue;
        }
        for link in links {
            out.push_str(&format!(
                "- [{}]({}){}\n",
                escape_markdown(&link.text),
                link.url,
                location_badge(link.location)
            ));
        }
        out.push('\n');
    }

    if let Some(view) = &report.external {
        out.push_str(&format!("## External links ({})\n\n", view.displayed()));
        if let Some(message) = view.message() {
            out.push_str(&format!("_{}_\n\n", message));
        }
        for group in view.groups() {
            out.push_str(&format!("### {} ({})\n\n", group.group.name(), group.count));
            for link in &group.members {
                out.push_str(&format!(
                    "- **{}** [{}]({})\n",
                    link.status_text(),
                    escape_markdown(&link.text),
                    link.url
                ));
            }
            out.push('\n');
        }
    }

    out.push_str(&format!("_{} links excluded._\n", report.excluded));
    out
}

fn escape_markdown(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
