use anyhow::{Context, Result};
use clap::Parser;
use nb_core::{ArticleId, FetchQuery, SectionName, SortKey};
use nb_session::{SessionController, SessionDriver, SessionHandle, SessionNotice, SessionSnapshot};
use nb_sources::{create_source, SourceConfig};
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

mod commands;
mod logging;
mod render;

use commands::{parse_command, Command, HELP};

#[derive(Debug, Clone, Copy)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// Accepts `500ms`, `30s`, `2m`, `1m30s`; a bare number means seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = Duration::ZERO;
        let mut number = String::new();
        let mut chars = s.trim().chars().peekable();

        if s.trim().is_empty() {
            return Err("Duration must include a number".to_string());
        }

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Expected a number before '{}'", c))?;
            let part = match c {
                'm' if chars.peek() == Some(&'s') => {
                    chars.next();
                    Some(Duration::from_millis(value))
                }
                's' => Some(Duration::from_secs(value)),
                'm' => value.checked_mul(60).map(Duration::from_secs),
                'h' => value.checked_mul(3600).map(Duration::from_secs),
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total = part
                .and_then(|part| total.checked_add(part))
                .ok_or_else(|| format!("Duration too large: {}", s))?;
            number.clear();
        }

        if !number.is_empty() {
            let value: u64 = number.parse().map_err(|_| "Invalid number in duration".to_string())?;
            total = total
                .checked_add(Duration::from_secs(value))
                .ok_or_else(|| format!("Duration too large: {}", s))?;
        }
        Ok(HumanDuration(total))
    }
}

#[derive(Parser, Debug)]
#[command(name = "nb", author, version, about = "Browse news articles with summaries", long_about = None)]
pub struct Cli {
    /// Where articles come from: http, file or memory
    #[arg(long, env = "NB_SOURCE", default_value = "http")]
    source: String,
    /// Base URL for http, path for file
    #[arg(long, env = "NB_API_URL")]
    url: Option<String>,
    #[arg(long, env = "NB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, default_value = "articles")]
    articles_path: String,
    /// Request timeout (e.g. 30s, 1m, 500ms)
    #[arg(long, default_value = "30s")]
    timeout: HumanDuration,
    /// Print snapshots as JSON instead of text
    #[arg(long)]
    json: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch and list articles
    List {
        #[arg(long, default_value = "date")]
        sort: SortKey,
        #[arg(long)]
        search: Option<String>,
        /// Expand a section on every card
        #[arg(long)]
        expand: Option<SectionName>,
    },
    /// Show one article in detail
    Show {
        id: String,
        #[arg(long)]
        search: Option<String>,
        /// summary, article or ai-summary
        #[arg(long)]
        section: Option<SectionName>,
    },
    /// Drive a session from stdin
    Interactive {
        #[arg(long, default_value = "date")]
        sort: SortKey,
    },
}

impl Cli {
    fn source_config(&self) -> SourceConfig {
        let mut config = SourceConfig::new()
            .with_articles_path(self.articles_path.clone())
            .with_timeout(self.timeout.0);
        if let Some(url) = &self.url {
            config = config.with_url(url.clone());
        }
        if let Some(key) = &self.api_key {
            config = config.with_api_key(key.clone());
        }
        config
    }
}

fn print_snapshot(snapshot: &SessionSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        print!("{}", render::render_list(snapshot));
    }
    Ok(())
}

async fn run_interactive(handle: SessionHandle, mut notices: mpsc::UnboundedReceiver<SessionNotice>, json: bool) -> Result<()> {
    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = updates.borrow_and_update().clone();
                    if let Err(e) = print_snapshot(&snapshot, json) {
                        eprintln!("Failed to render: {}", e);
                    }
                }
                Some(notice) = notices.recv() => match notice {
                    SessionNotice::FetchFailed(msg) => eprintln!("⚠️ {}", msg),
                    SessionNotice::MalformedData(msg) => eprintln!("⚠️ {}", msg),
                    SessionNotice::UnknownArticle(id) => eprintln!("⚠️ No article with id {}", id),
                },
            }
        }
    });

    println!("{}", HELP);
    handle.refresh(FetchQuery::Latest).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Event(event))) => handle.send(event).await?,
            Ok(Some(Command::Show)) => print!("{}", render::render_detail(&handle.snapshot(), None)),
            Ok(Some(Command::Help)) => println!("{}", HELP),
            Ok(Some(Command::Quit)) => break,
            Err(e) => eprintln!("{}", e),
        }
    }

    handle.shutdown().await?;
    printer.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let source = create_source(&cli.source, cli.source_config())
        .with_context(|| format!("Failed to set up {} source", cli.source))?;

    match &cli.command {
        Commands::List { sort, search, expand } => {
            let mut controller = SessionController::new(*sort);
            let mut snapshot = controller
                .refresh(source.as_ref(), FetchQuery::from_term(search.as_deref()))
                .await?;
            if let Some(section) = expand {
                for id in snapshot.articles.ids() {
                    snapshot = controller.on_section_toggled(&id, *section)?;
                }
            }
            info!("Listed {} articles", snapshot.articles.len());
            print_snapshot(&snapshot, cli.json)?;
        }
        Commands::Show { id, search, section } => {
            let mut controller = SessionController::default();
            controller
                .refresh(source.as_ref(), FetchQuery::from_term(search.as_deref()))
                .await?;
            let snapshot = controller
                .on_article_selected(&ArticleId::from(id.as_str()))
                .with_context(|| format!("Article {} is not in the fetched batch", id))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&snapshot.focused_article())?);
            } else {
                print!("{}", render::render_detail(&snapshot, *section));
            }
        }
        Commands::Interactive { sort } => {
            let (handle, notices, task) = SessionDriver::spawn(SessionController::new(*sort), source);
            run_interactive(handle, notices, cli.json).await?;
            task.await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_list_args() {
        let cli = Cli::try_parse_from([
            "nb", "--source", "file", "--url", "fixtures/articles.json", "list", "--sort", "duration", "--expand", "ai-summary",
        ])
        .unwrap();
        match &cli.command {
            Commands::List { sort, search, expand } => {
                assert_eq!(*sort, SortKey::ByDuration);
                assert_eq!(*search, None);
                assert_eq!(*expand, Some(SectionName::AiSummary));
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.source_config().url.as_deref(), Some("fixtures/articles.json"));
    }

    #[test]
    fn test_human_duration() {
        assert_eq!(HumanDuration::from_str("30s").unwrap().0, Duration::from_secs(30));
        assert_eq!(HumanDuration::from_str("1m30s").unwrap().0, Duration::from_secs(90));
        assert_eq!(HumanDuration::from_str("500ms").unwrap().0, Duration::from_millis(500));
        assert_eq!(HumanDuration::from_str("45").unwrap().0, Duration::from_secs(45));
        assert!(HumanDuration::from_str("").is_err());
        assert!(HumanDuration::from_str("10x").is_err());
        assert!(HumanDuration::from_str("s").is_err());
        assert!(HumanDuration::from_str("18446744073709551615h").is_err());
        assert!(HumanDuration::from_str("18446744073709551615s18446744073709551615s").is_err());
    }
}
