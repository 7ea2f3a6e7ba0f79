pub mod commands;
pub mod handlers;

pub use handlers::{
    EXIT_BROKEN_LINKS, EXIT_CLEAN, EXIT_FAILURE, EXIT_NOT_FOUND, exit_code, load_page_source,
    load_rules, load_settings, render_report,
};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
