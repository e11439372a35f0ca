//! `trekking`: console front end for the trekking participant tracker.
//!
//! Every command loads the participant data file, applies at most one change
//! through the participant bus and prints the result. Operator messages
//! (accepted updates, conflicts, backups) are logged to stderr.
//!
//! # Usage
//!
//! ```text
//! trekking import registrations.csv --charset ISO-8859-1
//! trekking add "Anna Berg" 1985-02-01 --category dogtrekking
//! trekking start "Anna Berg" 1985-02-01 --number 17
//! trekking stop "Anna Berg" 1985-02-01
//! trekking list --results
//! ```

mod app;
mod roster;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use app::App;
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Args, Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trek_core::{Category, Charset, Person, person};

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "trekking", version, about = "Track the participants of a trekking event")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "trekking.toml", value_name = "FILE")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

/// Name and birthday of one participant.
#[derive(Args)]
struct Who {
  name:     String,
  /// `YYYY-MM-DD` or the configured registration format.
  birthday: String,
}

#[derive(Subcommand)]
enum Command {
  /// Replace all participant data with a registration table.
  Import {
    file:    PathBuf,
    #[arg(long, default_value = "UTF-8")]
    charset: Charset,
  },
  /// Register a participant.
  Add {
    #[command(flatten)]
    who:      Who,
    #[arg(long, value_parser = parse_category)]
    category: Option<Category>,
  },
  /// Hand out a start number and record the start time.
  Start {
    #[command(flatten)]
    who:    Who,
    #[arg(long)]
    number: u32,
    /// RFC 3339 instant; defaults to now.
    #[arg(long)]
    at:     Option<DateTime<Utc>>,
  },
  /// Record the arrival of a participant.
  Stop {
    #[command(flatten)]
    who: Who,
    /// RFC 3339 instant; defaults to now.
    #[arg(long)]
    at:  Option<DateTime<Utc>>,
    /// Arrived without finishing the route.
    #[arg(long)]
    dnf: bool,
  },
  /// Correct category or start number.
  Modify {
    #[command(flatten)]
    who:          Who,
    #[arg(long, value_parser = parse_category)]
    category:     Option<Category>,
    #[arg(long)]
    number:       Option<u32>,
    /// Take the start number away.
    #[arg(long, conflicts_with = "number")]
    clear_number: bool,
  },
  /// Show every recorded state of a participant.
  History {
    #[command(flatten)]
    who: Who,
  },
  /// Show all participants.
  List {
    /// Order by category and trip time.
    #[arg(long)]
    results: bool,
    #[arg(long)]
    json:    bool,
  },
}

/// Variant names in any case, otherwise the registration keywords.
fn parse_category(text: &str) -> Result<Category, String> {
  let normalized = text.trim().to_ascii_uppercase().replace(['-', ' '], "_");
  Ok(normalized.parse().unwrap_or_else(|_| Category::classify(text)))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let app = App::start(&settings)?;
  app.init().await;

  match cli.command {
    Command::Import { file, charset } => {
      let count = app.import(file, charset).await?;
      println!("{count} participants registered");
    }
    Command::Add { who, category } => {
      let added = app.add(&who.name, &who.birthday, category).await?;
      print_table(&[added]);
    }
    Command::Start { who, number, at } => {
      let old = app.participant(&who.name, &who.birthday)?;
      let new = old
        .clone()
        .with_number(Some(number))
        .with_start(Some(at.unwrap_or_else(Utc::now)));
      print_table(&[app.update(old, new).await?]);
    }
    Command::Stop { who, at, dnf } => {
      let old = app.participant(&who.name, &who.birthday)?;
      if old.start().is_none() {
        tracing::warn!(participant = %old, "stopping a participant that never started");
      }
      let new = old
        .clone()
        .with_stop(Some(at.unwrap_or_else(Utc::now)))
        .with_finished(!dnf);
      print_table(&[app.update(old, new).await?]);
    }
    Command::Modify { who, category, number, clear_number } => {
      let old = app.participant(&who.name, &who.birthday)?;
      let mut new = old.clone();
      if let Some(category) = category {
        new = new.with_category(Some(category));
      }
      if number.is_some() || clear_number {
        new = new.with_number(number);
      }
      print_table(&[app.update(old, new).await?]);
    }
    Command::History { who } => {
      let history = app.history(&who.name, &who.birthday)?;
      if history.is_empty() {
        anyhow::bail!("no participant {} born {}", who.name, who.birthday);
      }
      print_table(&history);
    }
    Command::List { results, json } => {
      let mut participants = app.participants();
      if results {
        participants.sort_by(person::by_trip_time);
      }
      if json {
        let out = serde_json::to_string_pretty(&participants).context("serialising participants")?;
        println!("{out}");
      } else {
        print_table(&participants);
      }
    }
  }

  Ok(())
}

// ─── Output ──────────────────────────────────────────────────────────────────

fn print_table(participants: &[Person]) {
  println!(
    "{:>4}  {:<28} {:<10}  {:<12} {:<20} {:<20} {:>9}",
    "No", "Name", "Birthday", "Category", "Start", "Stop", "Time"
  );
  for p in participants {
    println!(
      "{:>4}  {:<28} {:<10}  {:<12} {:<20} {:<20} {:>9}",
      p.number().map(|n| n.to_string()).unwrap_or_default(),
      p.name(),
      p.birthday(),
      p.category().map(|c| c.to_string()).unwrap_or_default(),
      p.start().map(fmt_instant).unwrap_or_default(),
      p.stop().map(fmt_instant).unwrap_or_default(),
      match (p.trip_time(), p.stop()) {
        (Some(time), _) => fmt_duration(time),
        (None, Some(_)) => "DNF".to_owned(),
        (None, None) => String::new(),
      },
    );
  }
}

fn fmt_instant(instant: DateTime<Utc>) -> String { instant.format("%Y-%m-%d %H:%M:%S").to_string() }

fn fmt_duration(duration: TimeDelta) -> String {
  let secs = duration.num_seconds();
  let sign = if secs < 0 { "-" } else { "" };
  let secs = secs.abs();
  format!("{sign}{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}
