use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use hike_core::{
    Config, ForecastClient, HikingDayManager, ImportSource, Intent, Location, ViewMode, ViewShell,
};
use inquire::{Confirm, Password};

use crate::{console, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "hike", version, about = "Plan hiking days with weather forecasts")]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Send notifications to the log instead of the terminal.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Look up a place name.
    Search {
        /// Free-text place name, e.g. "Chamonix".
        query: String,
    },

    /// Plan a hiking day and fetch its forecast.
    Add {
        /// Day of the hike, YYYY-MM-DD.
        date: NaiveDate,

        /// Place name; geocoded unless coordinates are given.
        place: String,

        /// Which search match to use, starting at 1.
        #[arg(long, default_value_t = 1)]
        pick: usize,

        /// Latitude, skips geocoding.
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude, skips geocoding.
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Keep the place without coordinates (no forecast).
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_geocode: bool,
    },

    /// Remove a planned day by id.
    Remove { id: String },

    /// Refetch the forecast of one day.
    Refresh { id: String },

    /// Refetch the forecast of every day with coordinates.
    RefreshAll,

    /// Merge hiking days from a JSON bundle (URL or file).
    Import {
        /// Defaults to `import_source` from the config file.
        source: Option<String>,
    },

    /// Delete every planned day.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show or switch the active view: list, calendar or map.
    View { mode: Option<ViewMode> },

    /// Render the planned days in the active view.
    Show {
        /// Render in this view once, without switching.
        #[arg(long)]
        view: Option<ViewMode>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        let notifier = console::notifier(self.quiet);
        tracing::debug!(command = ?self.command, "running");

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Search { query } => {
                let client = ForecastClient::from_config(&config, notifier);
                let results = client.search_location(&query).await;
                if results.is_empty() {
                    println!("No location found for '{query}'.");
                }
                for (i, r) in results.iter().enumerate() {
                    let state = r.state.as_deref().map(|s| format!(" ({s})")).unwrap_or_default();
                    println!("{}. {}{state}  [{:.4}, {:.4}]", i + 1, r.display_name(), r.lat, r.lon);
                }
            }
            command => {
                let manager = HikingDayManager::from_config(&config, notifier)?;
                let mut shell = ViewShell::open(manager).await;
                run_in_shell(&mut shell, &config, command).await?;
            }
        }

        Ok(())
    }
}

async fn run_in_shell(shell: &mut ViewShell, config: &Config, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Add {
            date,
            place,
            pick,
            lat,
            lon,
            no_geocode,
        } => {
            let location = match (lat, lon) {
                (Some(lat), Some(lon)) => Location::at(place, lat, lon),
                _ if no_geocode => Location::named(place),
                _ => resolve_place(shell, &place, pick).await?,
            };
            let before = shell.hiking_days().len();
            shell.dispatch(Intent::Add { date, location }).await;

            if let Some(day) = shell.hiking_days().get(before) {
                print!("{}", render::list::render_day(day));
            }
        }
        Command::Remove { id } => shell.dispatch(Intent::Remove { id }).await,
        Command::Refresh { id } => shell.dispatch(Intent::Refresh { id }).await,
        Command::RefreshAll => shell.dispatch(Intent::RefreshAll).await,
        Command::Import { source } => {
            let Some(raw) = source.or_else(|| config.import_source.clone()) else {
                bail!(
                    "No import source given.\n\
                     Hint: pass a URL or file, or set `import_source` in {}.",
                    Config::config_file_path()?.display()
                );
            };
            let source: ImportSource = raw.parse()?;
            shell.dispatch(Intent::Import { source }).await;
        }
        Command::Clear { yes } => {
            let confirmed = yes
                || Confirm::new("Delete every planned hiking day?")
                    .with_default(false)
                    .prompt()
                    .context("Failed to read confirmation")?;
            if confirmed {
                shell.dispatch(Intent::ClearAll).await;
            }
        }
        Command::View { mode: Some(mode) } => {
            shell.dispatch(Intent::SwitchView { mode }).await;
            println!("{}", render::render(mode, shell.hiking_days())?);
        }
        Command::View { mode: None } => println!("{}", shell.mode()),
        Command::Show { view } => {
            let mode = view.unwrap_or(shell.mode());
            println!("{}", render::render(mode, shell.hiking_days())?);
        }
        other @ (Command::Configure | Command::Search { .. }) => {
            bail!("{other:?} does not run inside the view shell")
        }
    }

    Ok(())
}

async fn resolve_place(shell: &ViewShell, place: &str, pick: usize) -> anyhow::Result<Location> {
    if !shell.manager().forecast().is_configured() {
        bail!("Cannot geocode '{place}' without an API key.\nHint: run `hike configure`, or pass --lat/--lon.");
    }

    let results = shell.manager().forecast().search_location(place).await;
    let Some(result) = pick.checked_sub(1).and_then(|i| results.get(i)) else {
        bail!(
            "No match #{pick} for '{place}' ({} found). Try `hike search {place}`.",
            results.len()
        );
    };

    Ok(Location::from(result))
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let key = key.trim().to_string();
    if key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(key);
    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
