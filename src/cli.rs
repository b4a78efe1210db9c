use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("grabber")
        .about("Fetch media posts from a subreddit listing, paced by the API quota")
        .arg(
            Arg::new("subreddit")
                .help("Subreddit to list (without the r/ prefix)")
                .required_unless_present("version"),
        )
        .arg(
            Arg::new("sort")
                .long("sort")
                .num_args(1)
                .value_parser(["new", "hot", "top", "rising"])
                .default_value("new")
                .help("Listing sort order"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .num_args(1)
                .value_parser(clap::value_parser!(u32))
                .default_value("100")
                .help("Stop after this many posts"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    if let Some(lvl) = level {
        std::env::set_var("RUST_LOG", lvl);
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
