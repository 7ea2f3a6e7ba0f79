use crate::CLAP_STYLING;
use clap::{arg, command};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkward")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkward")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress progress and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Increase log verbosity (-v info, -vv debug)")
                .action(clap::ArgAction::Count)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            command!("scan")
                .about(
                    "Extract, classify and verify every link on a page, then print a \
                severity-ordered report.",
                )
                .arg(
                    arg!(<SOURCE>)
                        .required(true)
                        .help("An http(s) URL to fetch, or the path of a saved HTML page"),
                )
                .arg(
                    arg!(--"page-url" <URL>)
                        .required(false)
                        .help("Address to resolve a saved page's links against (default: its file:// URL)"),
                )
                .arg(
                    arg!(-s --"settings" <PATH>)
                        .required(false)
                        .help("Settings file (default: ~/.config/linkward/settings.json)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-r --"rules" <PATH>)
                        .required(false)
                        .help("JSON file overriding the classification domain lists")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Deadline for each link probe")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"no-follow-redirects")
                        .required(false)
                        .help("Report 3xx answers instead of following them")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown", "md"])
                        .ignore_case(true)
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("locate")
                .about("Find the anchor element a link URL belongs to")
                .arg(
                    arg!(<SOURCE>)
                        .required(true)
                        .help("An http(s) URL to fetch, or the path of a saved HTML page"),
                )
                .arg(arg!(<URL>).required(true).help("The link address to look for"))
                .arg(
                    arg!(--"page-url" <URL>)
                        .required(false)
                        .help("Address to resolve a saved page's links against"),
                ),
        )
        .subcommand(
            command!("init")
                .about("Writes the default settings file")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the settings file")
                        .default_value("~/.config/linkward/settings.json"),
                )
                .arg(
                    arg!(--"force")
                        .help("Overwrite an existing settings file")
                        .required(false),
                ),
        )
}
