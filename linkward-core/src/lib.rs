pub mod context;
pub mod rank;
pub mod report;
pub mod rpc;
pub mod scan;
pub mod session;
pub mod settings;
pub mod source;

pub use rank::{ExternalView, Group, LinkGroup};
pub use report::{ReportFormat, ScanReport};
pub use scan::{ScanOptions, execute_locate, execute_scan};
pub use session::{ScanId, Session, SessionError};
pub use settings::{Settings, SettingsError, StatusFilters};
pub use source::PageSource;
