// Re-identification of a link's anchor element

use crate::page::{Page, anchor_text};
use serde::Serialize;
use tracing::debug;
use url::Url;

/// How an anchor was matched to the requested address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactHref,
    WithoutFragment,
    WithoutQuery,
    HostAndPath,
    ComputedHref,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ExactHref => "exact href",
            Strategy::WithoutFragment => "href without fragment",
            Strategy::WithoutQuery => "href without query",
            Strategy::HostAndPath => "host and path",
            Strategy::ComputedHref => "computed href",
        }
    }
}

/// What the strategies get to look at for one anchor
struct Probe<'a> {
    href: &'a str,
    resolved: Option<&'a Url>,
    target: &'a str,
    target_url: Option<&'a Url>,
}

type Matcher = fn(&Probe<'_>) -> bool;

/// Tried in order; each strategy scans every anchor before the next one runs
const STRATEGIES: [(Strategy, Matcher); 5] = [
    (Strategy::ExactHref, exact_href),
    (Strategy::WithoutFragment, |p| p.href == without_fragment(p.target)),
    (Strategy::WithoutQuery, |p| p.href == without_query(p.target)),
    (Strategy::HostAndPath, same_host_and_path),
    (Strategy::ComputedHref, computed_href),
];

fn exact_href(p: &Probe<'_>) -> bool {
    p.href == p.target
}

fn same_host_and_path(p: &Probe<'_>) -> bool {
    match (p.resolved, p.target_url) {
        (Some(anchor), Some(target)) => {
            anchor.host_str() == target.host_str() && anchor.path() == target.path()
        }
        _ => false,
    }
}

fn computed_href(p: &Probe<'_>) -> bool {
    p.resolved.is_some_and(|r| r.as_str() == p.target)
}

fn without_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(head, _)| head)
}

fn without_query(url: &str) -> &str {
    let url = without_fragment(url);
    url.split_once('?').map_or(url, |(head, _)| head)
}

/// Handle to a matched anchor. `index` is its position among the page's
/// `a[href]` elements, which stays valid until the document is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Located {
    pub index: usize,
    pub href: String,
    pub text: String,
    pub strategy: Strategy,
    pub outer_html: String,
}

/// Find the anchor that best matches `url`, or `None` when nothing does
pub fn locate(page: &Page, url: &str) -> Option<Located> {
    let target_url = Url::parse(url).ok();
    let anchors: Vec<_> = page
        .anchors()
        .filter_map(|el| {
            // Extraction trims hrefs, so comparisons must too
            let href = el.value().attr("href")?.trim();
            Some((el, href, page.resolve(href)))
        })
        .collect();

    for (strategy, matches) in STRATEGIES {
        let found = anchors.iter().enumerate().find(|(_, (_, href, resolved))| {
            matches(&Probe {
                href,
                resolved: resolved.as_ref(),
                target: url,
                target_url: target_url.as_ref(),
            })
        });

        if let Some((index, (el, href, _))) = found {
            debug!("Located {} by {} at anchor #{}", url, strategy.as_str(), index);
            return Some(Located {
                index,
                href: href.to_string(),
                text: anchor_text(*el),
                strategy,
                outer_html: el.html(),
            });
        }
    }

    debug!("No anchor matches {}", url);
    None
}

/// Single-slot highlight state for one page
#[derive(Debug, Default)]
pub struct Marker {
    marked: Option<Located>,
}

impl Marker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any existing mark, then mark the anchor matching `url`.
    /// Stays unmarked when nothing matches.
    pub fn mark(&mut self, page: &Page, url: &str) -> Option<&Located> {
        self.clear();
        self.marked = locate(page, url);
        self.marked.as_ref()
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.marked.take() {
            debug!("Cleared mark on anchor #{}", previous.index);
        }
    }

    pub fn is_marked(&self) -> bool {
        self.marked.is_some()
    }

    pub fn current(&self) -> Option<&Located> {
        self.marked.as_ref()
    }
}
