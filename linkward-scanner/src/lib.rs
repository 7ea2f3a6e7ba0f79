pub mod classify;
pub mod error;
pub mod link;
pub mod locate;
pub mod page;
pub mod verify;

pub use classify::{Classifier, RuleSet, ScanResult, scan};
pub use error::ScanError;
pub use link::{Candidate, Category, LinkRecord, Location, Status};
pub use locate::{Located, Marker, Strategy};
pub use page::{Page, SiteInfo};
pub use verify::{Fault, ProbeMethod, VerificationOutcome, Verifier, VerifierConfig};
