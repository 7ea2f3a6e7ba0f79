// Link classification rules

use crate::error::{Result, ScanError};
use crate::link::{Candidate, Category, LinkRecord};
use crate::page::Page;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Domains and path markers the classification rules are built from.
///
/// Loaded once per scan. Any list missing from an override file keeps its
/// default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleSet {
    /// Messaging hosts whose links are always team links
    pub collaboration_domains: Vec<String>,
    /// Document sharing hosts that hold team sites
    pub sharing_domains: Vec<String>,
    pub team_path_segment: String,
    /// Host suffixes of personal storage sites
    pub personal_host_suffixes: Vec<String>,
    pub personal_path_segment: String,
    /// First-party hosts (and their subdomains) never reported as external
    pub first_party_domains: Vec<String>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            collaboration_domains: strings(&["teams.microsoft.com"]),
            sharing_domains: strings(&["sharepoint.com", "sharepoint-df.com"]),
            team_path_segment: "/teams/".to_string(),
            personal_host_suffixes: strings(&["-my.sharepoint.com", "-my.sharepoint-df.com"]),
            personal_path_segment: "/personal/".to_string(),
            first_party_domains: strings(&[
                "microsoft.com",
                "sharepoint.com",
                "sharepoint-df.com",
                "office.com",
                "office365.com",
                "teams.microsoft.com",
                "outlook.com",
                "outlook.office.com",
                "onedrive.com",
                "live.com",
                "hotmail.com",
                "msn.com",
                "bing.com",
                "azure.com",
                "azurewebsites.net",
                "microsoftonline.com",
                "graph.microsoft.com",
                "powerapps.com",
                "powerbi.com",
                "dynamics.com",
                "xbox.com",
                "skype.com",
                "linkedin.com",
                "github.com",
                "visualstudio.com",
                "vscode.dev",
                "aka.ms",
                "microsoftstore.com",
            ]),
        }
    }
}

impl RuleSet {
    /// Load rule overrides from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let rules: RuleSet =
            serde_json::from_str(&content).map_err(|source| ScanError::InvalidRules {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Loaded classification rules from {}", path.display());
        Ok(rules.normalized())
    }

    fn normalized(mut self) -> Self {
        for list in [
            &mut self.collaboration_domains,
            &mut self.sharing_domains,
            &mut self.personal_host_suffixes,
            &mut self.first_party_domains,
        ] {
            for entry in list.iter_mut() {
                *entry = entry.trim().to_lowercase();
            }
        }
        self.team_path_segment = self.team_path_segment.to_lowercase();
        self.personal_path_segment = self.personal_path_segment.to_lowercase();
        self
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

type Predicate = fn(&Classifier, &Url) -> bool;

/// Classification rules in precedence order; the first match decides
const RULES: [(Category, Predicate); 4] = [
    (Category::Email, Classifier::is_email),
    (Category::Team, Classifier::is_team),
    (Category::OneDrive, Classifier::is_onedrive),
    (Category::External, Classifier::is_external),
];

/// Links of one scan split by category, each list in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub team: Vec<LinkRecord>,
    pub onedrive: Vec<LinkRecord>,
    pub email: Vec<LinkRecord>,
    pub external: Vec<LinkRecord>,
    /// Links that matched no category
    pub excluded: usize,
}

impl ScanResult {
    /// Number of links in the four live categories
    pub fn total(&self) -> usize {
        self.team.len() + self.onedrive.len() + self.email.len() + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

pub struct Classifier {
    rules: RuleSet,
    page_host: Option<String>,
}

impl Classifier {
    pub fn new(rules: RuleSet, page_url: &Url) -> Self {
        Self {
            rules,
            page_host: page_url.host_str().map(|h| h.to_lowercase()),
        }
    }

    /// Category of a single destination. Unparsable addresses are excluded.
    pub fn classify(&self, url: &str) -> Category {
        let Ok(target) = Url::parse(url) else {
            debug!("Excluding unparsable link {:?}", url);
            return Category::Excluded;
        };

        RULES
            .iter()
            .find(|(_, predicate)| predicate(self, &target))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Excluded)
    }

    pub fn partition(&self, candidates: Vec<Candidate>) -> ScanResult {
        let mut result = ScanResult::default();

        for candidate in candidates {
            let category = self.classify(&candidate.url);
            let record = LinkRecord::new(candidate.url, &candidate.text, candidate.location, category);
            match category {
                Category::Team => result.team.push(record),
                Category::OneDrive => result.onedrive.push(record),
                Category::Email => result.email.push(record),
                Category::External => result.external.push(record),
                Category::Excluded => result.excluded += 1,
            }
        }

        debug!(
            "Classified links: team={} onedrive={} email={} external={} excluded={}",
            result.team.len(),
            result.onedrive.len(),
            result.email.len(),
            result.external.len(),
            result.excluded
        );
        result
    }

    fn host(target: &Url) -> Option<String> {
        target.host_str().map(|h| h.to_lowercase())
    }

    fn is_email(&self, target: &Url) -> bool {
        target.scheme() == "mailto"
    }

    fn is_team(&self, target: &Url) -> bool {
        let Some(host) = Self::host(target) else {
            return false;
        };
        if self.rules.collaboration_domains.iter().any(|d| host_matches(&host, d)) {
            return true;
        }
        self.rules.sharing_domains.iter().any(|d| host_matches(&host, d))
            && target.path().to_lowercase().contains(&self.rules.team_path_segment)
    }

    fn is_onedrive(&self, target: &Url) -> bool {
        let Some(host) = Self::host(target) else {
            return false;
        };
        self.rules.personal_host_suffixes.iter().any(|suffix| host.ends_with(suffix.as_str()))
            || target.path().to_lowercase().contains(&self.rules.personal_path_segment)
    }

    fn is_external(&self, target: &Url) -> bool {
        if !matches!(target.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = Self::host(target) else {
            return false;
        };
        if self.page_host.as_deref() == Some(host.as_str()) {
            return false;
        }
        !self.rules.first_party_domains.iter().any(|d| host_matches(&host, d))
    }
}

/// Extract and classify every link of a page
pub fn scan(page: &Page, rules: &RuleSet) -> ScanResult {
    Classifier::new(rules.clone(), page.url()).partition(page.extract())
}
