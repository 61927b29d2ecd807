mod ics;
mod render;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use timegrid_core::config::PreferencesStore;
use timegrid_core::source::EventSource;
use timegrid_core::tz::{DisplayTimezone, SYSTEM_TIMEZONE};
use timegrid_core::window::Granularity;
use timegrid_core::{Resource, ViewController};

use crate::ics::IcsDirSource;
use crate::render::{Render, render_snapshot};

#[derive(Parser)]
#[command(name = "timegrid")]
#[command(about = "Aggregated calendar timelines in your terminal")]
struct Cli {
    /// Directory holding one subdirectory of .ics files per calendar
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the aggregated calendar view
    Show {
        /// View mode
        #[arg(long, value_enum)]
        view: Option<ViewArg>,

        /// Anchor date (e.g. "2026-08-05", "today", "next friday")
        #[arg(long)]
        date: Option<String>,

        /// Display timezone id (e.g. "Europe/Stockholm"), or "system"
        #[arg(long)]
        timezone: Option<String>,

        /// Only show these calendars (repeatable)
        #[arg(long = "calendar")]
        calendars: Vec<String>,
    },
    /// List available calendars
    Calendars,
    /// Persist the default display timezone
    SetTimezone {
        /// Timezone id, or "system" for the local clock
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ViewArg {
    Day,
    Week,
    Month,
}

impl From<ViewArg> for Granularity {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Day => Granularity::Day,
            ViewArg::Week => Granularity::Week,
            ViewArg::Month => Granularity::Month,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Show {
            view,
            date,
            timezone,
            calendars,
        } => show(cli.dir, view, date, timezone, calendars).await,
        Commands::Calendars => list_calendars(cli.dir),
        Commands::SetTimezone { id } => set_timezone(&id),
    }
}

async fn show(
    dir: Option<PathBuf>,
    view: Option<ViewArg>,
    date: Option<String>,
    timezone: Option<String>,
    calendars: Vec<String>,
) -> Result<()> {
    let store = PreferencesStore::default_location()?;
    let prefs = store.load()?;

    let tz = DisplayTimezone::parse(timezone.as_deref().unwrap_or(&prefs.timezone));
    let granularity = view.map(Granularity::from).unwrap_or(prefs.granularity);
    let anchor = parse_anchor(date.as_deref(), &tz)?;

    let source = IcsDirSource::new(calendar_dir(dir, &prefs)?);
    let mut resources = source.list_resources()?;
    require_calendars(&resources)?;
    apply_selection(&mut resources, &calendars, &prefs.hidden_resources)?;

    let mut controller = ViewController::new(anchor, granularity, tz, resources);
    controller.start_now_ticker();
    controller.sync(&source).await;

    if let Some(snapshot) = controller.snapshot() {
        println!(
            "{}",
            render_snapshot(
                snapshot,
                controller.resources(),
                &controller.timezone(),
                controller.anchor(),
                controller.now_fraction(),
            )
        );
    }
    if let Some(notice) = controller.notice() {
        eprintln!("{}", notice.render());
    }

    Ok(())
}

fn list_calendars(dir: Option<PathBuf>) -> Result<()> {
    let store = PreferencesStore::default_location()?;
    let prefs = store.load()?;

    let source = IcsDirSource::new(calendar_dir(dir, &prefs)?);
    let mut resources = source.list_resources()?;
    require_calendars(&resources)?;

    for resource in &mut resources {
        resource.active = !prefs.hidden_resources.contains(&resource.id);
        println!("{}", resource.render());
    }
    Ok(())
}

fn set_timezone(id: &str) -> Result<()> {
    // Unlike the lenient render-time parse, persisting an unknown id is an
    // error: the user asked for this zone by name.
    if !id.eq_ignore_ascii_case(SYSTEM_TIMEZONE) {
        chrono_tz::Tz::from_str(id)
            .map_err(|_| anyhow::anyhow!("Unknown timezone id: '{}'", id))?;
    }

    let store = PreferencesStore::default_location()?;
    let mut prefs = store.load()?;
    prefs.timezone = id.to_string();
    store.save(&prefs)?;

    println!("Display timezone set to {}", id);
    Ok(())
}

/// Resolve the ICS root: flag, then config, then `~/calendar`.
fn calendar_dir(
    flag: Option<PathBuf>,
    prefs: &timegrid_core::config::ViewPreferences,
) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Some(dir) = &prefs.calendar_dir {
        return Ok(dir.clone());
    }
    dirs::home_dir()
        .map(|home| home.join("calendar"))
        .context("Could not determine home directory")
}

fn require_calendars(resources: &[Resource]) -> Result<()> {
    if resources.is_empty() {
        anyhow::bail!(
            "No calendars found.\n\n\
            Create one subdirectory per calendar with .ics files inside:\n  \
            ~/calendar/work/standup.ics\n  \
            ~/calendar/personal/dentist.ics"
        );
    }
    Ok(())
}

/// Apply `--calendar` filters or the persisted hidden set to the active
/// flags.
fn apply_selection(
    resources: &mut [Resource],
    requested: &[String],
    hidden: &[String],
) -> Result<()> {
    if requested.is_empty() {
        for resource in resources.iter_mut() {
            resource.active = !hidden.contains(&resource.id);
        }
        return Ok(());
    }

    for name in requested {
        if !resources.iter().any(|r| &r.id == name) {
            let available: Vec<&str> = resources.iter().map(|r| r.id.as_str()).collect();
            anyhow::bail!(
                "Calendar '{}' not found. Available: {}",
                name,
                available.join(", ")
            );
        }
    }
    for resource in resources.iter_mut() {
        resource.active = requested.contains(&resource.id);
    }
    Ok(())
}

/// Parse the anchor date: ISO first, then natural language.
fn parse_anchor(input: Option<&str>, tz: &DisplayTimezone) -> Result<NaiveDate> {
    let Some(input) = input else {
        return Ok(tz.display_date(Utc::now()));
    };
    if input.eq_ignore_ascii_case("today") {
        return Ok(tz.display_date(Utc::now()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    fuzzydate::parse(input)
        .map(|dt| dt.date())
        .map_err(|_| anyhow::anyhow!("Could not parse date: \"{}\"", input))
}
