//! Dashboard state driven by key presses.
//!
//! `key_message` maps a key to a [`Message`], `App::update` applies it and may
//! return an [`Effect`] the event loop has to await.

use aurora_core::{Dashboard, Tab, WebcamEntry};
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NextTab,
    PrevTab,
    Select(Tab),
    Refresh,
    RefreshAll,
    Up,
    Down,
    OpenWebcam,
    Quit,
}

/// Work that leaves the update step: network refreshes and the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Refresh(Tab),
    RefreshAll,
    Open(String),
}

impl Effect {
    /// Status line shown while the effect runs.
    pub fn progress(&self) -> String {
        match self {
            Effect::Refresh(tab) => format!("Refreshing {tab}..."),
            Effect::RefreshAll => "Refreshing all tabs...".to_string(),
            Effect::Open(url) => format!("Opening {url}..."),
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    tab: Tab,
    webcam_row: usize,
    status: Option<String>,
    running: bool,
}

impl App {
    pub fn new(dashboard: Dashboard, tab: Tab) -> Self {
        Self { dashboard, tab, webcam_row: 0, status: None, running: true }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn webcam_row(&self) -> usize {
        self.webcam_row
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn selected_webcam(&self) -> Option<&WebcamEntry> {
        self.dashboard.webcams.data()?.get(self.webcam_row)
    }

    pub fn update(&mut self, message: Message) -> Option<Effect> {
        match message {
            Message::Quit => self.running = false,
            Message::NextTab => self.tab = step(self.tab, 1),
            Message::PrevTab => self.tab = step(self.tab, -1),
            Message::Select(tab) => self.tab = tab,
            Message::Refresh => return Some(Effect::Refresh(self.tab)),
            Message::RefreshAll => return Some(Effect::RefreshAll),
            Message::Up if self.tab == Tab::Webcams => {
                self.webcam_row = self.webcam_row.saturating_sub(1);
            }
            Message::Down if self.tab == Tab::Webcams => {
                if self.webcam_row + 1 < self.webcam_count() {
                    self.webcam_row += 1;
                }
            }
            Message::OpenWebcam if self.tab == Tab::Webcams => match self.selected_webcam() {
                Some(cam) => return Some(Effect::Open(cam.url.clone())),
                None => self.set_status("No webcam selected. Press r to load the list."),
            },
            Message::Up | Message::Down | Message::OpenWebcam => {}
        }
        None
    }

    pub async fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Refresh(tab) => {
                self.dashboard.refresh(tab).await;
                let status = match self.dashboard.status(tab) {
                    (label, Some(error)) => format!("{tab}: {label} ({error})"),
                    (label, None) => format!("{tab}: {label}"),
                };
                self.set_status(status);
            }
            Effect::RefreshAll => {
                self.dashboard.refresh_all().await;
                let failed = Tab::all()
                    .iter()
                    .filter(|tab| self.dashboard.status(**tab).1.is_some())
                    .count();
                self.set_status(match failed {
                    0 => "All tabs refreshed".to_string(),
                    n => format!("All tabs refreshed, {n} without fresh data"),
                });
            }
            Effect::Open(url) => match open::that(&url) {
                Ok(()) => self.set_status(format!("Opened {url}")),
                Err(err) => {
                    warn!(url = %url, error = %err, "could not open browser");
                    self.set_status(format!("Could not open {url}: {err}"));
                }
            },
        }
        self.webcam_row = self.webcam_row.min(self.webcam_count().saturating_sub(1));
    }

    fn webcam_count(&self) -> usize {
        self.dashboard.webcams.data().map_or(0, Vec::len)
    }
}

/// Position of `tab` in the tab bar.
pub fn tab_index(tab: Tab) -> usize {
    Tab::all().iter().position(|t| *t == tab).unwrap_or(0)
}

fn step(tab: Tab, delta: isize) -> Tab {
    let all = Tab::all();
    let next = (tab_index(tab) as isize + delta).rem_euclid(all.len() as isize);
    all[next as usize]
}

pub fn key_message(key: KeyEvent) -> Option<Message> {
    let message = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Message::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Message::Quit,
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Message::NextTab,
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => Message::PrevTab,
        KeyCode::Char(c @ '1'..='9') => {
            let tab = Tab::all().get(c as usize - '1' as usize)?;
            Message::Select(*tab)
        }
        KeyCode::Char('r') | KeyCode::F(5) => Message::Refresh,
        KeyCode::Char('R') => Message::RefreshAll,
        KeyCode::Up | KeyCode::Char('k') => Message::Up,
        KeyCode::Down | KeyCode::Char('j') => Message::Down,
        KeyCode::Enter | KeyCode::Char('o') => Message::OpenWebcam,
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use aurora_core::{
        DashboardSettings, FetchError, FetchResult, ForecastSeries, ImageSource, KpReading, Location,
        SolarWind, SpaceWeatherSource, WebcamEntry,
        model::OvationGrid,
        overlay::RenderOptions,
        solar::SUN_IMAGES,
    };

    use super::*;

    /// Every fetch fails, as with no network.
    #[derive(Debug)]
    pub struct Offline;

    fn down<T>() -> FetchResult<T> {
        Err(FetchError::Unavailable("offline".into()))
    }

    #[async_trait]
    impl SpaceWeatherSource for Offline {
        async fn current_kp(&self) -> FetchResult<KpReading> {
            down()
        }

        async fn short_term_forecast(&self) -> FetchResult<ForecastSeries> {
            down()
        }

        async fn long_term_forecast(&self) -> FetchResult<ForecastSeries> {
            down()
        }

        async fn ovation_grid(&self) -> FetchResult<OvationGrid> {
            down()
        }

        async fn solar_wind(&self) -> FetchResult<SolarWind> {
            down()
        }
    }

    #[async_trait]
    impl ImageSource for Offline {
        async fn fetch_image(&self, _url: &str) -> FetchResult<Vec<u8>> {
            down()
        }
    }

    pub fn offline_app(tab: Tab) -> App {
        let dir = std::env::temp_dir().join(format!("aurora-cli-{}", std::process::id()));
        let settings = DashboardSettings {
            kp_alert_threshold: 5.0,
            image_dir: dir.join("images"),
            map_path: dir.join("map.png"),
            render: RenderOptions { width: 180, ..RenderOptions::default() },
            sun_images: SUN_IMAGES[..1].to_vec(),
        };
        App::new(Dashboard::new(Box::new(Offline), Box::new(Offline), settings), tab)
    }

    pub fn webcam(name: &str, timezone: &str) -> WebcamEntry {
        WebcamEntry {
            location: Location {
                name: name.into(),
                country: "Norway".into(),
                latitude: 69.65,
                longitude: 18.96,
                timezone: timezone.into(),
                webcam_url: None,
            },
            url: format!("https://example.org/{}", name.to_lowercase()),
            score: -12.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use aurora_core::TabState;

    use super::{testing::*, *};

    fn press(code: KeyCode) -> Option<Message> {
        key_message(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn keys_map_to_messages() {
        assert_eq!(press(KeyCode::Char('q')), Some(Message::Quit));
        assert_eq!(press(KeyCode::Char('3')), Some(Message::Select(Tab::ShortForecast)));
        assert_eq!(press(KeyCode::Char('7')), Some(Message::Select(Tab::Webcams)));
        assert_eq!(press(KeyCode::Char('8')), None);
        assert_eq!(press(KeyCode::Char('r')), Some(Message::Refresh));
        assert_eq!(press(KeyCode::Enter), Some(Message::OpenWebcam));
        assert_eq!(press(KeyCode::Char('x')), None);
        assert_eq!(
            key_message(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Message::Quit)
        );
    }

    #[test]
    fn tabs_cycle_in_both_directions() {
        let mut app = offline_app(Tab::Kp);
        app.update(Message::PrevTab);
        assert_eq!(app.tab(), Tab::Webcams);
        app.update(Message::NextTab);
        app.update(Message::NextTab);
        assert_eq!(app.tab(), Tab::Map);
    }

    #[test]
    fn refresh_targets_the_visible_tab() {
        let mut app = offline_app(Tab::SolarWind);
        assert_eq!(app.update(Message::Refresh), Some(Effect::Refresh(Tab::SolarWind)));
        assert_eq!(app.update(Message::RefreshAll), Some(Effect::RefreshAll));
        assert_eq!(app.update(Message::Quit), None);
        assert!(!app.is_running());
    }

    #[test]
    fn webcam_selection_stays_in_range_and_opens_stream() {
        let mut app = offline_app(Tab::Webcams);
        app.dashboard.webcams =
            TabState::Displayed(vec![webcam("Tromso", "Europe/Oslo"), webcam("Alta", "Europe/Oslo")]);

        app.update(Message::Down);
        app.update(Message::Down);
        assert_eq!(app.webcam_row(), 1);
        assert_eq!(app.update(Message::OpenWebcam), Some(Effect::Open("https://example.org/alta".into())));

        app.update(Message::Up);
        app.update(Message::Up);
        assert_eq!(app.webcam_row(), 0);
    }

    #[test]
    fn open_needs_a_loaded_list_on_the_webcam_tab() {
        let mut app = offline_app(Tab::Kp);
        assert_eq!(app.update(Message::OpenWebcam), None);
        assert_eq!(app.status(), None);

        app.update(Message::Select(Tab::Webcams));
        assert_eq!(app.update(Message::OpenWebcam), None);
        assert!(app.status().is_some_and(|s| s.contains("No webcam selected")));
    }

    #[tokio::test]
    async fn failed_refresh_is_reported_in_status() {
        let mut app = offline_app(Tab::Kp);
        app.apply(Effect::Refresh(Tab::Kp)).await;
        assert_eq!(app.dashboard.kp.label(), "unavailable");
        assert!(app.status().is_some_and(|s| s.starts_with("Kp Index: unavailable")));

        app.apply(Effect::RefreshAll).await;
        assert_eq!(app.status(), Some("All tabs refreshed, 7 without fresh data"));
    }
}
