use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eventhub::config::{AppConfig, BackendKind, ConfigError};
use eventhub::models::Event;
use eventhub::services::account::{self, AccountError, SignupForm};
use eventhub::services::events::{self, EventDraft, EventError, TOP_EVENTS};
use eventhub::services::storage::LocalStore;
use eventhub::services::ErrorCode;
use eventhub::util::format::{format_date_time, format_number, format_price};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("[{}] {}", .0.error_code(), .0)]
    Account(#[from] AccountError),
    #[error("[{}] {}", .0.error_code(), .0)]
    Event(#[from] EventError),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("reset failed, please try again")]
    ResetFailed,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "eventhub", about = "Discover, create and join local events")]
struct Cli {
    #[arg(long, env = "EVENTHUB_BACKEND")]
    backend: Option<BackendKind>,

    #[arg(long, env = "EVENTHUB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print full records as JSON instead of one-line summaries.
    #[arg(long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Signup {
        username: String,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    Login {
        username: String,
    },
    Logout,
    Whoami,
    Events(EventsCommand),
    Profile,
    Stats {
        event_id: String,
    },
    /// Delete all users, events, likes, registrations and the session.
    Reset,
}

#[derive(Args, Debug)]
struct EventsCommand {
    #[command(subcommand)]
    command: EventsSubcommand,
}

#[derive(Subcommand, Debug)]
enum EventsSubcommand {
    List,
    Search {
        query: String,
    },
    Top {
        #[arg(long, default_value_t = TOP_EVENTS)]
        count: usize,
    },
    Show {
        event_id: String,
    },
    Create(DraftArgs),
    Edit {
        event_id: String,
        #[command(flatten)]
        fields: DraftArgs,
    },
    Delete {
        event_id: String,
    },
    Like {
        event_id: String,
    },
    Register {
        event_id: String,
    },
}

#[derive(Args, Debug)]
struct DraftArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    time: Option<String>,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    price: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    cover_image: Option<String>,
}

impl DraftArgs {
    /// Overlay the provided flags on `base`.
    fn apply(self, mut base: EventDraft) -> EventDraft {
        let fields = [
            (self.title, &mut base.title),
            (self.date, &mut base.date),
            (self.time, &mut base.time),
            (self.location, &mut base.location),
            (self.price, &mut base.price),
            (self.description, &mut base.description),
            (self.cover_image, &mut base.cover_image),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        base
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eventhub=info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(?config, "store configured");

    let store = eventhub::open_store(&config);
    let out = Output { json: cli.json };

    match cli.command {
        Command::Signup { username, bio, avatar } => {
            let user = account::signup(&store, SignupForm { username, bio, avatar }).await?;
            out.value(&user, &format!("signed up as {} ({})", user.username, user.id))
        }
        Command::Login { username } => {
            let user = account::login(&store, &username).await?;
            out.value(&user, &format!("logged in as {}", user.username))
        }
        Command::Logout => {
            account::logout(&store).await?;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => {
            let user = account::require_user(&store).await?;
            out.value(&user, &user.username)
        }
        Command::Events(cmd) => run_events(&store, &out, cmd).await,
        Command::Profile => {
            let profile = events::profile(&store).await?;
            if out.json {
                return print_json(&profile);
            }
            println!("{}", profile.user.username);
            if let Some(bio) = &profile.user.bio {
                println!("{bio}");
            }
            println!("\ncreated ({}):", profile.created_events.len());
            print_events(&profile.created_events);
            println!("\nliked ({}):", profile.liked_events.len());
            print_events(&profile.liked_events);
            Ok(())
        }
        Command::Stats { event_id } => {
            let stats = store.get_event_stats(&event_id).await;
            out.value(
                &stats,
                &format!(
                    "{} registered, {} likes",
                    format_number(stats.registrations as u64),
                    format_number(stats.likes as u64)
                ),
            )
        }
        Command::Reset => {
            if !store.clear_all_data().await {
                return Err(CliError::ResetFailed);
            }
            println!("all data cleared");
            Ok(())
        }
    }
}

async fn run_events(store: &LocalStore, out: &Output, cmd: EventsCommand) -> Result<(), CliError> {
    match cmd.command {
        EventsSubcommand::List => out.events(&store.get_all_events().await),
        EventsSubcommand::Search { query } => out.events(&events::search_events(store, &query).await),
        EventsSubcommand::Top { count } => out.events(&events::top_events(store, count).await),
        EventsSubcommand::Show { event_id } => {
            let details = events::event_details(store, &event_id).await?;
            if out.json {
                return print_json(&details);
            }
            print_events(std::slice::from_ref(&details.event));
            if let Some(description) = &details.event.description {
                println!("{description}");
            }
            println!(
                "{} registered, {} likes{}{}",
                format_number(details.stats.registrations as u64),
                format_number(details.stats.likes as u64),
                if details.liked { ", liked" } else { "" },
                if details.registered { ", registered" } else { "" },
            );
            if let Some(revenue) = details.revenue {
                println!("revenue ${revenue:.2}");
            }
            Ok(())
        }
        EventsSubcommand::Create(fields) => {
            let event = events::create_event(store, &fields.apply(EventDraft::default())).await?;
            out.value(&event, &format!("created {}", event.id))
        }
        EventsSubcommand::Edit { event_id, fields } => {
            let existing = store
                .get_event_by_id(&event_id)
                .await
                .ok_or_else(|| CliError::EventNotFound(event_id.clone()))?;
            let draft = fields.apply(EventDraft::from(&existing));
            let event = events::update_event(store, &event_id, &draft).await?;
            out.value(&event, &format!("updated {}", event.id))
        }
        EventsSubcommand::Delete { event_id } => {
            events::delete_event(store, &event_id).await?;
            println!("deleted {event_id}");
            Ok(())
        }
        EventsSubcommand::Like { event_id } => {
            let liked = events::toggle_like(store, &event_id).await?;
            println!("{}", if liked { "liked" } else { "unliked" });
            Ok(())
        }
        EventsSubcommand::Register { event_id } => {
            let stats = events::register(store, &event_id).await?;
            println!("registered ({} total)", format_number(stats.registrations as u64));
            Ok(())
        }
    }
}

struct Output {
    json: bool,
}

impl Output {
    fn value<T: serde::Serialize>(&self, value: &T, summary: &str) -> Result<(), CliError> {
        if self.json {
            return print_json(value);
        }
        println!("{summary}");
        Ok(())
    }

    fn events(&self, list: &[Event]) -> Result<(), CliError> {
        if self.json {
            return print_json(&list);
        }
        if list.is_empty() {
            println!("no events");
        }
        print_events(list);
        Ok(())
    }
}

fn print_events(list: &[Event]) {
    for event in list {
        println!(
            "{}  {}  {}  {}  {}",
            event.id,
            event.title,
            format_date_time(&event.date, event.time.as_deref()),
            event.location,
            format_price(event.price.as_deref()),
        );
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
