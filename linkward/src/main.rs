use colored::Colorize;
use linkward::commands::command_argument_builder;
use linkward::handlers::{EXIT_FAILURE, handle_init, handle_locate, handle_scan, init_tracing};

#[tokio::main]
async fn main() {
    let matches = command_argument_builder().get_matches();
    init_tracing(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("scan", sub)) => handle_scan(sub).await,
        Some(("locate", sub)) => handle_locate(sub).await,
        Some(("init", sub)) => handle_init(sub),
        _ => unreachable!("clap should ensure we don't get here"),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red(), e);
            EXIT_FAILURE
        }
    };
    std::process::exit(code);
}
