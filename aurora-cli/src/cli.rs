use std::{ops::RangeInclusive, path::PathBuf};

use anyhow::Context;
use aurora_core::{
    Config, Dashboard, GeoLocator, Tab, WebcamEntry,
    config::Coordinates,
    dashboard::MapView,
    http::HttpClient,
    kp::{interpret_kp, visibility_zone},
    location::{bundled_locations, find_location, haversine_km, is_northern_hemisphere},
    overlay::ProbabilityBand,
    solar::{SUN_IMAGES, find_sun_image},
    source::IpApiLocator,
    webcams::{self, SortOrder, select_webcam},
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, CustomUserError, validator::Validation};
use tracing::warn;

use crate::{
    app::{App, Effect},
    tui,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "aurora", version, about = "Aurora tracker: Kp index, forecasts, solar wind and webcams")]
pub struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    /// Goes to stderr, or to the log file while the dashboard is open.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current Kp index and where the aurora may be visible.
    Kp,

    /// Render the Ovation aurora-probability map to a PNG file.
    Map {
        /// Output file; defaults to the configured map path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Image width in pixels.
        #[arg(long, default_value_t = 1440)]
        width: u32,

        /// Print what the map colours mean.
        #[arg(long)]
        about: bool,
    },

    /// Kp forecast bar chart (opens the dashboard on that tab).
    Forecast {
        /// 27-day outlook instead of the 3-day forecast.
        #[arg(long)]
        long: bool,
    },

    /// Solar wind speed, density, Bz and Bt over the last day (opens the dashboard).
    Solar,

    /// Download the latest SDO sun images.
    Sun {
        /// Directory for the images; defaults to the configured image dir.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Only these channels, e.g. solar_disk_aia_0193. Repeatable.
        #[arg(long = "channel")]
        channels: Vec<String>,

        /// List the available channels and exit.
        #[arg(long)]
        list: bool,
    },

    /// Live aurora webcams, best chance first.
    Webcams {
        #[arg(long, value_enum, default_value_t = SortArg::Visibility)]
        sort: SortArg,

        /// With --sort distance: measure from the IP geolocation instead of home.
        #[arg(long)]
        near_me: bool,

        /// With --sort distance: measure from a bundled location, e.g. Abisko.
        #[arg(long, value_name = "LOCATION", conflicts_with = "near_me")]
        from: Option<String>,

        /// Open a stream in the browser, by list position or location name.
        #[arg(long, value_name = "N|LOCATION")]
        open: Option<String>,

        /// Print how the ranking works.
        #[arg(long)]
        about: bool,
    },

    /// Approximate location from IP geolocation.
    Locate,

    /// Full-screen dashboard with one tab per data source; refreshes every tab on start.
    Dashboard {
        /// Tab shown first.
        #[arg(long, value_enum, default_value_t = TabArg::Kp)]
        tab: TabArg,
    },

    /// Set home coordinates and the Kp alert threshold.
    Configure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Visibility,
    Location,
    Country,
    Distance,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Visibility => SortOrder::Visibility,
            SortArg::Location => SortOrder::Location,
            SortArg::Country => SortOrder::Country,
            SortArg::Distance => SortOrder::Distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TabArg {
    Kp,
    Map,
    Forecast,
    Outlook,
    Solar,
    Sun,
    Webcams,
}

impl From<TabArg> for Tab {
    fn from(value: TabArg) -> Self {
        match value {
            TabArg::Kp => Tab::Kp,
            TabArg::Map => Tab::Map,
            TabArg::Forecast => Tab::ShortForecast,
            TabArg::Outlook => Tab::LongForecast,
            TabArg::Solar => Tab::SolarWind,
            TabArg::Sun => Tab::SunImages,
            TabArg::Webcams => Tab::Webcams,
        }
    }
}

impl Command {
    /// Commands that take over the terminal.
    pub fn is_interactive(&self) -> bool {
        matches!(self, Command::Forecast { .. } | Command::Solar | Command::Dashboard { .. })
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = load_config();

        match self.command {
            Command::Kp => show_kp(&config).await,
            Command::Map { output, width, about } => show_map(&config, output, width, about).await,
            Command::Forecast { long } => {
                let tab = if long { Tab::LongForecast } else { Tab::ShortForecast };
                launch(&config, tab, Effect::Refresh(tab)).await
            }
            Command::Solar => launch(&config, Tab::SolarWind, Effect::Refresh(Tab::SolarWind)).await,
            Command::Sun { output_dir, channels, list } => {
                show_sun(&config, output_dir, channels, list).await
            }
            Command::Webcams { sort, near_me, from, open, about } => {
                let origin = match from {
                    Some(name) => Origin::Named(name),
                    None if near_me => Origin::Geolocated,
                    None => Origin::Home,
                };
                show_webcams(&config, sort.into(), origin, open.as_deref(), about).await
            }
            Command::Locate => show_location(&config).await,
            Command::Dashboard { tab } => launch(&config, tab.into(), Effect::RefreshAll).await,
            Command::Configure => configure(config).await,
        }
    }
}

/// A broken config file is reported, not fatal.
fn load_config() -> Config {
    Config::load().unwrap_or_else(|err| {
        warn!(error = %format!("{err:#}"), "using default configuration");
        Config::default()
    })
}

fn unavailable(tab: Tab, state_error: Option<&str>) {
    println!("{tab}: data unavailable ({})", state_error.unwrap_or("no data"));
}

async fn show_kp(config: &Config) -> anyhow::Result<()> {
    let mut dash = Dashboard::from_config(config)?;
    dash.refresh_kp().await;

    match dash.kp.data() {
        Some(reading) => {
            println!("Current Kp index: {:.2} ({} UTC)", reading.kp, reading.time.format("%Y-%m-%d %H:%M"));
            println!("Visibility zone:  {}", visibility_zone(reading.kp));
            println!("                  {}", interpret_kp(reading.kp));
            if dash.kp_alert() {
                println!();
                println!(
                    "*** ALERT: Kp {:.2} is at or above your threshold of {:.1} ***",
                    reading.kp, config.kp_alert_threshold
                );
            }
        }
        None => unavailable(Tab::Kp, dash.kp.error()),
    }
    Ok(())
}

async fn show_map(
    config: &Config,
    output: Option<PathBuf>,
    width: u32,
    about: bool,
) -> anyhow::Result<()> {
    if about {
        println!("{}", Tab::Map.help().unwrap_or_default());
        return Ok(());
    }

    let mut dash = Dashboard::from_config(config)?;
    {
        let settings = dash.settings_mut();
        if let Some(path) = output {
            settings.map_path = path;
        }
        settings.render.width = width.clamp(90, 8192);
    }
    dash.refresh_map().await;

    match dash.map.data() {
        Some(MapView { overlay, path }) => {
            println!("Aurora map saved to {}", path.display());
            if let Some(run) = overlay.forecast_time {
                println!("Model run:   forecast for {} UTC", run.format("%Y-%m-%d %H:%M"));
            }
            println!("Cells drawn: {}", overlay.plotted);
            println!();
            for band in [
                ProbabilityBand::High,
                ProbabilityBand::Moderate,
                ProbabilityBand::Low,
                ProbabilityBand::Faint,
            ] {
                println!("  {}", band.label());
            }
        }
        None => unavailable(Tab::Map, dash.map.error()),
    }
    Ok(())
}

async fn show_sun(
    config: &Config,
    output_dir: Option<PathBuf>,
    channels: Vec<String>,
    list: bool,
) -> anyhow::Result<()> {
    if list {
        for image in SUN_IMAGES {
            println!("{:<28} {}", image.name, image.url);
        }
        return Ok(());
    }

    let mut dash = Dashboard::from_config(config)?;
    {
        let settings = dash.settings_mut();
        if let Some(dir) = output_dir {
            settings.image_dir = dir;
        }
        if !channels.is_empty() {
            settings.sun_images = channels
                .iter()
                .map(|name| {
                    find_sun_image(name).with_context(|| {
                        format!("Unknown sun image channel '{name}'. Hint: run `aurora sun --list`.")
                    })
                })
                .collect::<anyhow::Result<_>>()?;
        }
    }
    dash.refresh_sun_images().await;

    match dash.sun_images.data() {
        Some(saved) => {
            println!("Saved {} of {} sun images:", saved.len(), dash.settings().sun_images.len());
            for image in saved {
                println!("  {:<28} {}", image.name, image.path.display());
            }
        }
        None => unavailable(Tab::SunImages, dash.sun_images.error()),
    }
    Ok(())
}

/// Reference point for distance sorting.
#[derive(Debug)]
enum Origin {
    Home,
    Geolocated,
    Named(String),
}

impl Origin {
    async fn resolve(self, config: &Config) -> anyhow::Result<Coordinates> {
        Ok(match self {
            Origin::Home => config.home,
            Origin::Geolocated => locate(config).await.unwrap_or(config.home),
            Origin::Named(name) => {
                let loc = find_location(bundled_locations()?, &name).with_context(|| {
                    format!("Unknown location '{name}'. Hint: run `aurora webcams --sort location`.")
                })?;
                Coordinates { latitude: loc.latitude, longitude: loc.longitude }
            }
        })
    }
}

async fn launch(config: &Config, tab: Tab, first: Effect) -> anyhow::Result<()> {
    let app = App::new(Dashboard::from_config(config)?, tab);
    tui::run(app, first).await
}

async fn show_webcams(
    config: &Config,
    sort: SortOrder,
    origin: Origin,
    open: Option<&str>,
    about: bool,
) -> anyhow::Result<()> {
    if about {
        println!("{}", Tab::Webcams.help().unwrap_or_default());
        return Ok(());
    }

    let cams = match sort {
        SortOrder::Visibility => {
            let mut dash = Dashboard::from_config(config)?;
            dash.refresh_webcams().await;
            if let Some(reading) = dash.kp.data() {
                println!("Ranked for Kp {:.2}\n", reading.kp);
            }
            match dash.webcams.data() {
                Some(cams) => cams.clone(),
                None => {
                    unavailable(Tab::Webcams, dash.webcams.error());
                    return Ok(());
                }
            }
        }
        SortOrder::Location => webcams::sort_by_location(webcams::webcam_catalog()?),
        SortOrder::Country => webcams::sort_by_country(webcams::webcam_catalog()?),
        SortOrder::Distance => {
            let origin = origin.resolve(config).await?;
            println!("Distances from {:.4}, {:.4}\n", origin.latitude, origin.longitude);
            webcams::sort_by_distance(webcams::webcam_catalog()?, origin.latitude, origin.longitude)
        }
    };

    if let Some(selector) = open {
        let cam = select_webcam(&cams, selector).with_context(|| {
            format!("No webcam '{selector}'. Use a list position (1-{}) or a location name.", cams.len())
        })?;
        return open_webcam(cam);
    }

    for (i, cam) in cams.iter().enumerate() {
        let key = match sort {
            SortOrder::Visibility => format!("score {:.1}", cam.score),
            SortOrder::Distance => format!("{:.0} km", cam.score),
            SortOrder::Location | SortOrder::Country => String::new(),
        };
        println!(
            "{:>2}. {}, {} ({}) {key}\n    {}",
            i + 1,
            cam.location.name,
            cam.location.country,
            cam.location.timezone,
            cam.url
        );
    }
    Ok(())
}

fn open_webcam(cam: &WebcamEntry) -> anyhow::Result<()> {
    open::that(&cam.url).with_context(|| format!("Failed to open {}", cam.url))?;
    println!("Opened the {} webcam: {}", cam.location.name, cam.url);
    Ok(())
}

/// IP geolocation as coordinates; failures are reported and yield `None`.
async fn locate(config: &Config) -> Option<Coordinates> {
    let http = HttpClient::new(config.http_timeout()).ok()?;
    match IpApiLocator::new(config.endpoints.geolocation.clone(), http).locate().await {
        Ok(geo) => Some(Coordinates { latitude: geo.latitude, longitude: geo.longitude }),
        Err(err) if err.is_network() => {
            println!("Location lookup failed, no network? ({err}); using home coordinates.");
            None
        }
        Err(err) => {
            println!("Location lookup failed ({err}); using home coordinates.");
            None
        }
    }
}

async fn show_location(config: &Config) -> anyhow::Result<()> {
    let http = HttpClient::new(config.http_timeout())?;
    let locator = IpApiLocator::new(config.endpoints.geolocation.clone(), http);

    let geo = match locator.locate().await {
        Ok(geo) => geo,
        Err(err) => {
            println!("Location: data unavailable ({err})");
            return Ok(());
        }
    };

    println!("You appear to be near {}", geo.label());
    println!("Coordinates: {:.4}, {:.4}", geo.latitude, geo.longitude);
    if is_northern_hemisphere(geo.latitude) {
        println!("Look north for the aurora borealis.");
    } else {
        println!("Look south for the aurora australis.");
    }

    let nearest = webcams::sort_by_distance(webcams::webcam_catalog()?, geo.latitude, geo.longitude);
    if let Some(cam) = nearest.first() {
        println!(
            "Nearest aurora webcam: {}, {} ({:.0} km)",
            cam.location.name, cam.location.country, cam.score
        );
    }
    let from_home = haversine_km(geo.latitude, geo.longitude, config.home.latitude, config.home.longitude);
    println!("Distance from configured home: {from_home:.0} km");
    Ok(())
}

async fn configure(mut config: Config) -> anyhow::Result<()> {
    let use_ip = Confirm::new("Take home coordinates from IP geolocation?")
        .with_default(false)
        .prompt()?;

    let located = if use_ip { locate(&config).await } else { None };
    match located {
        Some(coords) => {
            println!("Located at {:.4}, {:.4}", coords.latitude, coords.longitude);
            config.home = coords;
        }
        None => {
            config.home.latitude = CustomType::<f64>::new("Home latitude:")
                .with_default(config.home.latitude)
                .with_error_message("Please enter a number")
                .with_validator(within(-90.0..=90.0, "Latitude must be between -90 and 90"))
                .prompt()?;
            config.home.longitude = CustomType::<f64>::new("Home longitude:")
                .with_default(config.home.longitude)
                .with_error_message("Please enter a number")
                .with_validator(within(-180.0..=180.0, "Longitude must be between -180 and 180"))
                .prompt()?;
        }
    }

    config.kp_alert_threshold = CustomType::<f64>::new("Kp alert threshold (0-9):")
        .with_default(config.kp_alert_threshold)
        .with_error_message("Please enter a number")
        .with_validator(within(0.0..=9.0, "The Kp scale runs from 0 to 9"))
        .prompt()?;

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Prompt validator accepting values inside `range`.
fn within(
    range: RangeInclusive<f64>,
    message: &'static str,
) -> impl Fn(&f64) -> Result<Validation, CustomUserError> + Clone {
    move |value: &f64| {
        Ok(if range.contains(value) {
            Validation::Valid
        } else {
            Validation::Invalid(message.into())
        })
    }
}
