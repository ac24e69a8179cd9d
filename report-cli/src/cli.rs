use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use report_core::{
    CityDirectory, DEFAULT_REFRESH_INTERVAL, FileStore, OpenMeteoClient, RefreshController,
    ReportModel, RequestState, Selection,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-report", version, about = "City weather report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the cities available for selection.
    Cities,

    /// Fetch and print today's report once.
    Show {
        /// City name; defaults to the last selection, else an interactive picker.
        city: Option<String>,
    },

    /// Keep fetching the report periodically until interrupted.
    Watch {
        /// City name; defaults to the last selection, else an interactive picker.
        city: Option<String>,

        /// Refresh interval in seconds.
        #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
        interval: u64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let directory = CityDirectory::bundled()?;

        match self.command {
            Command::Cities => {
                for name in directory.names() {
                    println!("{name}");
                }
                Ok(())
            }
            Command::Show { city } => {
                let app = App::new(directory)?;
                let city = app.choose_city(city)?;

                app.model.fetch_for(&city).await;
                render(&app.model.snapshot());
                Ok(())
            }
            Command::Watch { city, interval } => {
                let app = App::new(directory)?;
                let city = app.choose_city(city)?;

                app.watch(&city, Duration::from_secs(interval)).await
            }
        }
    }
}

/// Wires the model, selection state and persistent store together.
struct App {
    model: Arc<ReportModel>,
    selection: Arc<Selection>,
}

impl App {
    fn new(directory: CityDirectory) -> Result<Self> {
        let store = Arc::new(FileStore::in_config_dir()?);
        let selection = Arc::new(Selection::new(store));
        let client = Arc::new(OpenMeteoClient::new().context("Failed to build HTTP client")?);
        let model = Arc::new(ReportModel::new(directory, client));

        Ok(Self { model, selection })
    }

    /// Resolve which city to report on: explicit argument, else the
    /// persisted selection, else an interactive picker. The choice is
    /// persisted either way.
    fn choose_city(&self, arg: Option<String>) -> Result<String> {
        let city = match arg {
            Some(city) => city,
            None => match self.selection.restore()? {
                Some(city) => city,
                None => {
                    let names = self.model.directory().names();
                    inquire::Select::new("Select city", names)
                        .prompt()
                        .context("No city selected")?
                        .to_string()
                }
            },
        };

        self.selection.set(&city)?;
        Ok(city)
    }

    async fn watch(&self, city: &str, interval: Duration) -> Result<()> {
        self.model.fetch_for(city).await;
        render(&self.model.snapshot());

        let mut controller = RefreshController::new(interval);
        let mut cycles = controller.subscribe();
        controller.arm(self.model.clone(), self.selection.clone());

        println!("Refreshing every {}s, press Ctrl-C to stop.", interval.as_secs());

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    controller.disarm();
                    return Ok(());
                }
                changed = cycles.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                    println!();
                    render(&self.model.snapshot());
                }
            }
        }
    }
}

fn render(state: &RequestState) {
    if let Some(error) = &state.error {
        println!("{error}");
        return;
    }

    let Some(forecast) = &state.forecast else {
        println!("No forecast yet.");
        return;
    };

    println!("Weather for {}", state.selected_city);
    println!("  Min temperature:     {:.1} °C", forecast.min_temperatures()[0]);
    println!("  Max temperature:     {:.1} °C", forecast.max_temperatures()[0]);
    println!("  Average temperature: {:.2} °C", forecast.average_temperature());
    if let Some(updated_at) = state.updated_at {
        println!(
            "  Updated:             {}",
            updated_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        );
    }
}
