// Severity ordering and status grouping of external links

use crate::settings::StatusFilters;
use linkward_scanner::LinkRecord;
use serde::Serialize;
use std::cmp::Ordering;

pub const NO_LINKS_FOUND: &str = "No links found on this page.";
pub const NO_EXTERNAL_LINKS_FOUND: &str = "No external links found on this page.";
pub const NO_LINKS_MATCH_FILTERS: &str = "No external links match your current filter settings.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    NetworkUnknown,
    ServerErrors,
    ClientErrors,
    Redirects,
    Success,
}

impl Group {
    /// Display order
    pub const ALL: [Group; 5] = [
        Group::NetworkUnknown,
        Group::ServerErrors,
        Group::ClientErrors,
        Group::Redirects,
        Group::Success,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Group::NetworkUnknown => "Network/Unknown Errors",
            Group::ServerErrors => "Server Errors (5xx)",
            Group::ClientErrors => "Client Errors (4xx)",
            Group::Redirects => "Redirects (3xx)",
            Group::Success => "Success (2xx)",
        }
    }

    /// Settings key that toggles the group
    pub fn key(&self) -> &'static str {
        match self {
            Group::NetworkUnknown => "network",
            Group::ServerErrors => "5xx",
            Group::ClientErrors => "4xx",
            Group::Redirects => "3xx",
            Group::Success => "2xx",
        }
    }

    /// Severity classes 1 and 6 share the network group
    pub fn of(record: &LinkRecord) -> Group {
        match record.severity() {
            2 => Group::ServerErrors,
            3 => Group::ClientErrors,
            4 => Group::Redirects,
            5 => Group::Success,
            _ => Group::NetworkUnknown,
        }
    }

    pub fn is_enabled(&self, filters: &StatusFilters) -> bool {
        match self {
            Group::NetworkUnknown => filters.network,
            Group::ServerErrors => filters.server_errors,
            Group::ClientErrors => filters.client_errors,
            Group::Redirects => filters.redirects,
            Group::Success => filters.success,
        }
    }
}

/// Total order: severity class, then status, then url, text and location
pub fn compare(a: &LinkRecord, b: &LinkRecord) -> Ordering {
    a.severity()
        .cmp(&b.severity())
        .then_with(|| match (a.status().code(), b.status().code()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.sort_text().cmp(&b.sort_text()),
        })
        .then_with(|| a.url.cmp(&b.url))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.location.cmp(&b.location))
}

pub fn sort_by_severity(records: &mut [LinkRecord]) {
    records.sort_by(compare);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkGroup {
    pub group: Group,
    pub count: usize,
    pub members: Vec<LinkRecord>,
}

/// What the external section shows after ranking and filtering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExternalView {
    NoLinksFound,
    NoneMatchFilters {
        raw_count: usize,
    },
    Groups {
        groups: Vec<LinkGroup>,
        /// Links in the surfaced groups
        displayed: usize,
        raw_count: usize,
    },
}

impl ExternalView {
    pub fn raw_count(&self) -> usize {
        match self {
            ExternalView::NoLinksFound => 0,
            ExternalView::NoneMatchFilters { raw_count } => *raw_count,
            ExternalView::Groups { raw_count, .. } => *raw_count,
        }
    }

    pub fn displayed(&self) -> usize {
        match self {
            ExternalView::Groups { displayed, .. } => *displayed,
            _ => 0,
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            ExternalView::NoLinksFound => Some(NO_EXTERNAL_LINKS_FOUND),
            ExternalView::NoneMatchFilters { .. } => Some(NO_LINKS_MATCH_FILTERS),
            ExternalView::Groups { .. } => None,
        }
    }

    pub fn groups(&self) -> &[LinkGroup] {
        match self {
            ExternalView::Groups { groups, .. } => groups,
            _ => &[],
        }
    }
}

/// Sort, bucket and filter verified external links
pub fn group_links(mut records: Vec<LinkRecord>, filters: &StatusFilters) -> ExternalView {
    let raw_count = records.len();
    if raw_count == 0 {
        return ExternalView::NoLinksFound;
    }

    sort_by_severity(&mut records);

    let mut buckets: Vec<(Group, Vec<LinkRecord>)> =
        Group::ALL.iter().map(|g| (*g, Vec::new())).collect();
    for record in records {
        let group = Group::of(&record);
        if let Some((_, members)) = buckets.iter_mut().find(|(g, _)| *g == group) {
            members.push(record);
        }
    }

    let groups: Vec<LinkGroup> = buckets
        .into_iter()
        .filter(|(group, members)| !members.is_empty() && group.is_enabled(filters))
        .map(|(group, members)| LinkGroup {
            group,
            count: members.len(),
            members,
        })
        .collect();

    if groups.is_empty() {
        return ExternalView::NoneMatchFilters { raw_count };
    }

    let displayed = groups.iter().map(|g| g.count).sum();
    ExternalView::Groups {
        groups,
        displayed,
        raw_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkward_scanner::{Category, Location, Status};

    fn external(url: &str, status: Status) -> LinkRecord {
        let mut record = LinkRecord::new(url, "link", Location::Body, Category::External);
        record.record_status(status);
        record
    }

    #[test]
    fn test_numeric_statuses_compare_numerically() {
        let mut records = vec![
            external("https://a.example/", Status::Http(404)),
            external("https://b.example/", Status::Http(400)),
            external("https://c.example/", Status::Http(418)),
        ];
        sort_by_severity(&mut records);
        let codes: Vec<u16> = records.iter().filter_map(|r| r.status().code()).collect();
        assert_eq!(codes, vec![400, 404, 418]);
    }

    #[test]
    fn test_network_class_orders_textually() {
        let mut records = vec![
            external("https://a.example/", Status::Timeout),
            external("https://b.example/", Status::NetworkError),
            external("https://c.example/", Status::Http(0)),
        ];
        sort_by_severity(&mut records);
        let statuses: Vec<Status> = records.iter().map(|r| r.status()).collect();
        assert_eq!(
            statuses,
            vec![Status::Http(0), Status::NetworkError, Status::Timeout]
        );
    }

    #[test]
    fn test_unknown_code_lands_in_network_group() {
        let record = external("https://a.example/", Status::Http(799));
        assert_eq!(Group::of(&record), Group::NetworkUnknown);
        let informational = external("https://a.example/", Status::Http(101));
        assert_eq!(Group::of(&informational), Group::NetworkUnknown);
    }

    #[test]
    fn test_groups_skip_empty_buckets() {
        let view = group_links(
            vec![
                external("https://ok.example/", Status::Http(200)),
                external("https://gone.example/", Status::Http(410)),
            ],
            &StatusFilters::default(),
        );
        let names: Vec<&str> = view.groups().iter().map(|g| g.group.name()).collect();
        assert_eq!(names, vec!["Client Errors (4xx)", "Success (2xx)"]);
        assert_eq!(view.displayed(), 2);
    }
}
