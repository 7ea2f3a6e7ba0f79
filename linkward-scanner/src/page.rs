// Document model and link extraction

use crate::error::{Result, ScanError};
use crate::link::{Candidate, Location};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector"));
static NAV_TEXT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.ms-HorizontalNavItem-linkText, span.ms-Nav-linkText")
        .expect("nav text selector")
});
static SITE_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#SiteHeaderTitle").expect("site title selector"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));
static SHAREPOINT_MARKERS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="ms.sharepointpnpversion"], script[src*="sharepoint"]"#)
        .expect("sharepoint marker selector")
});

const SHAREPOINT_HOSTS: [&str; 2] = ["sharepoint.com", "sharepoint-df.com"];

/// Descriptive information about the scanned page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteInfo {
    pub site_title: String,
    pub page_title: String,
    /// Page address cut after `.aspx`, when present
    pub clean_url: String,
    pub full_url: String,
    pub is_sharepoint: bool,
}

/// A parsed document together with the address it was loaded from.
///
/// The parsed tree is not `Send`; a `Page` lives on the thread that parsed it.
pub struct Page {
    url: Url,
    document: Html,
}

impl Page {
    pub fn parse(html: &str, page_url: &str) -> Result<Self> {
        let url = Url::parse(page_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", page_url, e)))?;

        Ok(Self {
            url,
            document: Html::parse_document(html),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Every anchor carrying an `href`, in document order
    pub fn anchors(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.document.select(&ANCHORS)
    }

    /// Resolve an `href` the way a browser computes `a.href`
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.url.join(href.trim()).ok()
    }

    /// Pull every usable anchor out of the document, in document order
    pub fn extract(&self) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for anchor in self.anchors() {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let trimmed = href.trim();
            if trimmed.is_empty() || is_script_href(trimmed) {
                debug!("Skipping placeholder link {:?}", href);
                continue;
            }

            // Unresolvable destinations are kept verbatim; classification drops them
            let url = match self.resolve(trimmed) {
                Some(resolved) if resolved.scheme() == "javascript" => continue,
                Some(resolved) => resolved.to_string(),
                None => trimmed.to_string(),
            };

            candidates.push(Candidate {
                url,
                href: href.to_string(),
                text: anchor_text(anchor),
                location: location_of(anchor),
            });
        }

        debug!("Extracted {} links from {}", candidates.len(), self.url);
        candidates
    }

    pub fn is_sharepoint(&self) -> bool {
        let host = self.host().unwrap_or_default().to_lowercase();
        SHAREPOINT_HOSTS.iter().any(|known| host.contains(known))
            || self.document.select(&SHAREPOINT_MARKERS).next().is_some()
    }

    pub fn site_info(&self) -> SiteInfo {
        let site_title = first_text(&self.document, &SITE_TITLE)
            .unwrap_or_else(|| "Unknown Site".to_string());
        let page_title =
            first_text(&self.document, &TITLE).unwrap_or_else(|| "Unknown Page".to_string());

        let full_url = self.url.to_string();
        let clean_url = match full_url.find(".aspx") {
            Some(idx) => full_url[..idx + ".aspx".len()].to_string(),
            None => full_url.clone(),
        };

        SiteInfo {
            site_title,
            page_title,
            clean_url,
            full_url,
            is_sharepoint: self.is_sharepoint(),
        }
    }
}

fn is_script_href(href: &str) -> bool {
    href.get(..11)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

/// Visible text of an anchor with runs of whitespace collapsed
pub(crate) fn anchor_text(anchor: ElementRef<'_>) -> String {
    anchor
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Footer wins over nav; anything else is body content
fn location_of(anchor: ElementRef<'_>) -> Location {
    let in_footer = std::iter::once(anchor)
        .chain(anchor.ancestors().filter_map(ElementRef::wrap))
        .take_while(|el| el.value().name() != "body")
        .any(|el| el.value().name() == "footer" || el.value().attr("role") == Some("contentinfo"));

    if in_footer {
        Location::Footer
    } else if anchor.select(&NAV_TEXT).next().is_some() {
        Location::Nav
    } else {
        Location::Body
    }
}
