use grabber::cli;
use grabber::config::Config;
use grabber::http::RedditClient;
use log::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("grabber {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let subreddit = matches
        .get_one::<String>("subreddit")
        .cloned()
        .expect("clap enforces subreddit");
    let sort = matches
        .get_one::<String>("sort")
        .cloned()
        .expect("sort has a default");
    let limit = *matches.get_one::<u32>("limit").expect("limit has a default");

    let cfg = Config::from_env().map_err(anyhow::Error::msg)?;
    let mut client = RedditClient::new(cfg)?;
    run_fetch(&mut client, &subreddit, &sort, limit).await
}

async fn run_fetch(
    client: &mut RedditClient,
    subreddit: &str,
    sort: &str,
    limit: u32,
) -> anyhow::Result<()> {
    let mut seen: u32 = 0;
    let mut after: Option<String> = None;

    while seen < limit {
        let page_size = (limit - seen).min(100);
        let page = client
            .listing_page(subreddit, sort, after.as_deref(), page_size)
            .await?;
        if page.posts.is_empty() {
            break;
        }
        for post in &page.posts {
            seen += 1;
            if let Some(url) = post.media_url() {
                println!("{}", url);
            }
            if seen >= limit {
                break;
            }
        }
        after = match page.after {
            Some(cursor) => Some(cursor),
            None => break,
        };
    }

    let snap = client.rate_snapshot();
    let calibrated_at = snap
        .last_header_time
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    info!(
        "fetched {} posts from r/{}; quota remaining={:?} reset_in={:?}s headers_seen={}",
        seen, subreddit, snap.remaining, snap.reset_seconds, calibrated_at
    );
    Ok(())
}
