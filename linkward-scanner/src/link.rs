use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Label used for anchors without visible text
pub const NO_TEXT: &str = "No text";

/// Where on the page an anchor sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Body,
    Footer,
    Nav,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Body => "body",
            Location::Footer => "footer",
            Location::Nav => "nav",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Team,
    OneDrive,
    Email,
    External,
    Excluded,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Team => "team",
            Category::OneDrive => "onedrive",
            Category::Email => "email",
            Category::External => "external",
            Category::Excluded => "excluded",
        }
    }
}

/// Verification state of a link.
///
/// `Http(0)` is the sentinel some transports report for an opaque failure and
/// ranks with the network errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Status {
    Unchecked,
    Http(u16),
    Timeout,
    NetworkError,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Unchecked)
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            Status::Http(code) => Some(*code),
            _ => None,
        }
    }

    /// Severity class, 1 is the most urgent
    pub fn severity(&self) -> u8 {
        match self {
            Status::NetworkError | Status::Timeout | Status::Http(0) => 1,
            Status::Http(500..=599) => 2,
            Status::Http(400..=499) => 3,
            Status::Http(300..=399) => 4,
            Status::Http(200..=299) => 5,
            Status::Http(_) | Status::Unchecked => 6,
        }
    }

    /// Human readable status, e.g. `404 Not Found`
    pub fn text(&self) -> String {
        match self {
            Status::Unchecked => "Checking...".to_string(),
            Status::Timeout => "Request Timeout".to_string(),
            Status::NetworkError | Status::Http(0) => "Network Error".to_string(),
            Status::Http(code) => {
                let reason = StatusCode::from_u16(*code)
                    .ok()
                    .and_then(|status| status.canonical_reason());
                match reason {
                    Some(reason) => format!("{} {}", code, reason),
                    None => format!("{} Unknown", code),
                }
            }
        }
    }

    /// Raw textual form used to order statuses that are not both numeric
    pub fn sort_text(&self) -> String {
        match self {
            Status::Unchecked => "Unchecked".to_string(),
            Status::Timeout => "Timeout".to_string(),
            Status::NetworkError => "Error".to_string(),
            Status::Http(code) => code.to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// An anchor pulled out of a document, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Destination resolved against the page address
    pub url: String,
    /// Raw `href` attribute value
    pub href: String,
    pub text: String,
    pub location: Location,
}

/// The unit of work from classification to the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub url: String,
    pub text: String,
    pub location: Location,
    category: Category,
    status: Status,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>, text: &str, location: Location, category: Category) -> Self {
        let text = text.trim();
        Self {
            url: url.into(),
            text: if text.is_empty() { NO_TEXT.to_string() } else { text.to_string() },
            location,
            category,
            status: Status::Unchecked,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Store the verification outcome. The status can only leave `Unchecked`
    /// once; later writes are ignored and reported as `false`.
    pub fn record_status(&mut self, status: Status) -> bool {
        if self.status.is_terminal() {
            warn!(
                "Ignoring second status {:?} for {} (already {:?})",
                status, self.url, self.status
            );
            return false;
        }
        self.status = status;
        true
    }

    /// Severity class; email links rank with successful ones
    pub fn severity(&self) -> u8 {
        match self.category {
            Category::Email => 5,
            _ => self.status.severity(),
        }
    }

    /// Textual status used as a secondary sort key
    pub fn sort_text(&self) -> String {
        match self.category {
            Category::Email => "mailto".to_string(),
            _ => self.status.sort_text(),
        }
    }

    pub fn status_text(&self) -> String {
        match self.category {
            Category::Email => "Email link".to_string(),
            _ => self.status.text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_text_gets_placeholder() {
        let record = LinkRecord::new("https://example.com/", "   \n ", Location::Body, Category::External);
        assert_eq!(record.text, NO_TEXT);
    }

    #[test]
    fn test_status_is_write_once() {
        let mut record = LinkRecord::new("https://example.com/", "Example", Location::Body, Category::External);
        assert!(record.record_status(Status::Http(404)));
        assert!(!record.record_status(Status::Http(200)));
        assert_eq!(record.status(), Status::Http(404));
    }

    #[test]
    fn test_severity_classes() {
        assert_eq!(Status::NetworkError.severity(), 1);
        assert_eq!(Status::Timeout.severity(), 1);
        assert_eq!(Status::Http(0).severity(), 1);
        assert_eq!(Status::Http(503).severity(), 2);
        assert_eq!(Status::Http(418).severity(), 3);
        assert_eq!(Status::Http(308).severity(), 4);
        assert_eq!(Status::Http(204).severity(), 5);
        assert_eq!(Status::Http(102).severity(), 6);
        assert_eq!(Status::Http(799).severity(), 6);
    }

    #[test]
    fn test_email_ranks_with_success() {
        let record = LinkRecord::new("mailto:a@b.com", "Mail", Location::Footer, Category::Email);
        assert_eq!(record.severity(), 5);
        assert_eq!(record.sort_text(), "mailto");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(Status::Http(404).text(), "404 Not Found");
        assert_eq!(Status::Http(0).text(), "Network Error");
        assert_eq!(Status::Timeout.text(), "Request Timeout");
        assert_eq!(Status::Http(799).text(), "799 Unknown");
    }
}
