//! Drawing of the dashboard tabs.

use aurora_core::{
    ForecastHorizon, ForecastSeries, KpReading, SolarWind, Tab, TabState, WebcamEntry,
    dashboard::MapView,
    kp::{KpLevel, interpret_kp, visibility_zone},
    model::DownloadedImage,
    overlay::ProbabilityBand,
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Gauge, List, ListItem, Paragraph, Row, Sparkline, Table,
        TableState, Tabs, Wrap,
    },
};

use crate::app::{App, tab_index};

const KEYS: &str = "←/→ tabs  1-7 jump  r refresh  R refresh all  ↑/↓ select  Enter open  q quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, body, footer] =
        Layout::vertical([Constraint::Length(2), Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());

    let titles: Vec<String> =
        Tab::all().iter().enumerate().map(|(i, tab)| format!("{} {tab}", i + 1)).collect();
    let tabs = Tabs::new(titles)
        .select(tab_index(app.tab()))
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM))
        .divider(" | ");
    frame.render_widget(tabs, header);

    let dash = &app.dashboard;
    let title = app.tab().title();
    match app.tab() {
        Tab::Kp => draw_state(frame, body, title, &dash.kp, |frame, area, reading| {
            draw_kp(frame, area, reading, dash.kp_alert())
        }),
        Tab::Map => draw_state(frame, body, title, &dash.map, draw_map),
        Tab::ShortForecast => draw_state(frame, body, title, &dash.short_forecast, draw_forecast),
        Tab::LongForecast => draw_state(frame, body, title, &dash.long_forecast, draw_forecast),
        Tab::SolarWind => draw_state(frame, body, title, &dash.solar_wind, draw_solar_wind),
        Tab::SunImages => draw_state(frame, body, title, &dash.sun_images, |frame, area, images| {
            draw_sun_images(frame, area, images)
        }),
        Tab::Webcams => draw_state(frame, body, title, &dash.webcams, |frame, area, cams| {
            draw_webcams(frame, area, cams, app.webcam_row())
        }),
    }

    let (label, _) = dash.status(app.tab());
    let footer_line = Line::from(vec![
        Span::styled(format!(" {label} "), Style::default().fg(Color::Black).bg(Color::Gray)),
        Span::raw(" "),
        Span::raw(app.status().unwrap_or(KEYS).to_string()),
    ]);
    frame.render_widget(Paragraph::new(footer_line), footer);
}

/// Data of a tab, or its placeholder when there is none.
fn draw_state<T>(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    state: &TabState<T>,
    draw: impl FnOnce(&mut Frame, Rect, &T),
) {
    let block = Block::default().title(format!(" {title} ")).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(data) = state.data() else {
        frame.render_widget(placeholder(state), inner);
        return;
    };

    let content = match state.error() {
        Some(error) => {
            let [notice, rest] = Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);
            let text = format!("Showing earlier data, refresh failed: {error}");
            frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Red)), notice);
            rest
        }
        None => inner,
    };
    draw(frame, content, data);
}

fn placeholder<T>(state: &TabState<T>) -> Paragraph<'static> {
    let text = match state {
        TabState::Idle => "Not loaded yet. Press r to refresh.".to_string(),
        TabState::Fetching { .. } => "Fetching...".to_string(),
        _ => format!("Data unavailable: {}", state.error().unwrap_or("no data")),
    };
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
}

fn kp_color(level: KpLevel) -> Color {
    match level {
        KpLevel::Green => Color::Green,
        KpLevel::Yellow => Color::Yellow,
        KpLevel::Orange => Color::Rgb(255, 165, 0),
        KpLevel::Red => Color::Red,
        KpLevel::DarkRed => Color::Rgb(139, 0, 0),
    }
}

fn draw_kp(frame: &mut Frame, area: Rect, reading: &KpReading, alert: bool) {
    let color = kp_color(KpLevel::from_kp(reading.kp));
    let [gauge_area, text_area] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    let gauge = Gauge::default()
        .block(Block::default().title("Kp (0-9)"))
        .gauge_style(Style::default().fg(color))
        .ratio((reading.kp / 9.0).clamp(0.0, 1.0))
        .label(format!("{:.2}", reading.kp));
    frame.render_widget(gauge, gauge_area);

    let mut lines = Vec::new();
    if alert {
        lines.push(Line::styled(
            format!("ALERT: Kp {:.2} is at or above your alert threshold", reading.kp),
            Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    lines.extend([
        Line::from(vec![
            Span::raw("Current Kp index: "),
            Span::styled(format!("{:.2}", reading.kp), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(format!("Measured at {} UTC", reading.time.format("%Y-%m-%d %H:%M"))),
        Line::from(""),
        Line::from(visibility_zone(reading.kp)),
        Line::from(interpret_kp(reading.kp)),
    ]);
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), text_area);
}

fn draw_map(frame: &mut Frame, area: Rect, view: &MapView) {
    let mut lines = vec![Line::from(format!("Aurora map saved to {}", view.path.display()))];
    if let Some(run) = view.overlay.forecast_time {
        lines.push(Line::from(format!("Forecast for {} UTC", run.format("%Y-%m-%d %H:%M"))));
    }
    if let Some(observed) = view.overlay.observation_time {
        lines.push(Line::from(format!("Observed at  {} UTC", observed.format("%Y-%m-%d %H:%M"))));
    }
    lines.push(Line::from(format!("Grid cells drawn: {}", view.overlay.plotted)));
    lines.push(Line::from(""));

    for band in [ProbabilityBand::High, ProbabilityBand::Moderate, ProbabilityBand::Low, ProbabilityBand::Faint] {
        let [r, g, b] = band.color().0;
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
            Span::raw(band.label()),
        ]));
    }
    lines.push(Line::from(""));
    lines.extend(Tab::Map.help().unwrap_or_default().lines().map(Line::from));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn draw_forecast(frame: &mut Frame, area: Rect, series: &ForecastSeries) {
    let [chart_area, summary] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
    let label_format = match series.horizon {
        ForecastHorizon::ThreeDay => "%d %Hh",
        ForecastHorizon::TwentySevenDay => "%d %b",
    };

    let bars: Vec<Bar> = series
        .points
        .iter()
        .map(|point| {
            let color = kp_color(KpLevel::from_kp(point.kp));
            Bar::default()
                .value((point.kp.clamp(0.0, 9.0) * 100.0).round() as u64)
                .text_value(format!("{:.1}", point.kp))
                .label(Line::from(point.time.format(label_format).to_string()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let count = series.points.len().max(1) as u16;
    let bar_width = (chart_area.width.saturating_sub(count) / count).clamp(1, 8);
    let chart = BarChart::default()
        .block(Block::default().title(series.horizon.title()))
        .data(BarGroup::default().bars(&bars))
        .max(900)
        .bar_width(bar_width)
        .bar_gap(1);
    frame.render_widget(chart, chart_area);

    if let Some(max) = series.max_kp() {
        let level = KpLevel::from_kp(max);
        let line = Line::from(vec![
            Span::raw("Highest Kp: "),
            Span::styled(format!("{max:.2} ({level})"), Style::default().fg(kp_color(level))),
        ]);
        frame.render_widget(Paragraph::new(line), summary);
    }
}

fn draw_solar_wind(frame: &mut Frame, area: Rect, wind: &SolarWind) {
    let [speed, density, bz, bt, summary] = Layout::vertical([
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Ratio(1, 4),
        Constraint::Length(2),
    ])
    .areas(area);

    let speeds: Vec<f64> = wind.plasma.iter().map(|p| p.speed).collect();
    let densities: Vec<f64> = wind.plasma.iter().map(|p| p.density).collect();
    let bzs: Vec<f64> = wind.mag.iter().map(|m| m.bz).collect();
    let bts: Vec<f64> = wind.mag.iter().map(|m| m.bt).collect();

    for (slot, label, unit, values, color) in [
        (speed, "Speed", "km/s", &speeds, Color::Yellow),
        (density, "Density", "p/cc", &densities, Color::Cyan),
        (bz, "Bz", "nT", &bzs, Color::Magenta),
        (bt, "Bt", "nT", &bts, Color::Green),
    ] {
        draw_series(frame, slot, label, unit, values, color);
    }

    if let Some(latest) = wind.latest() {
        let mut lines = vec![Line::from(format!(
            "Latest ({} UTC): speed {:.0} km/s, density {:.1} p/cc, Bz {:+.1} nT, Bt {:.1} nT",
            latest.time.format("%Y-%m-%d %H:%M"),
            latest.speed,
            latest.density,
            latest.bz,
            latest.bt,
        ))];
        if latest.bz < 0.0 {
            lines.push(Line::styled("Bz is southward, which favours aurora.", Style::default().fg(Color::Green)));
        }
        frame.render_widget(Paragraph::new(lines), summary);
    }
}

/// One solar wind quantity as a sparkline over its own range; the newest samples are kept.
fn draw_series(frame: &mut Frame, area: Rect, label: &str, unit: &str, values: &[f64], color: Color) {
    let shown = &values[values.len().saturating_sub(area.width as usize)..];
    let low = shown.iter().copied().fold(f64::INFINITY, f64::min);
    let high = shown.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let title = match shown.last() {
        Some(last) => format!("{label}: {last:.1} {unit} (range {low:.1} to {high:.1})"),
        None => format!("{label}: no data"),
    };
    // Offset by the minimum so negative Bz still draws.
    let heights: Vec<u64> = shown.iter().map(|v| ((v - low) * 10.0).round() as u64).collect();

    let sparkline = Sparkline::default()
        .block(Block::default().title(title))
        .data(&heights)
        .style(Style::default().fg(color));
    frame.render_widget(sparkline, area);
}

fn draw_sun_images(frame: &mut Frame, area: Rect, images: &[DownloadedImage]) {
    let items: Vec<ListItem> = images
        .iter()
        .map(|image| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<14}", image.name), Style::default().fg(Color::Yellow)),
                Span::raw(image.path.display().to_string()),
            ]))
        })
        .collect();
    let list = List::new(items).block(Block::default().title(format!("{} images saved", images.len())));
    frame.render_widget(list, area);
}

fn draw_webcams(frame: &mut Frame, area: Rect, cams: &[WebcamEntry], selected: usize) {
    let [table_area, hint] = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);

    let header = Row::new(["#", "Location", "Country", "Timezone", "Score", "Stream"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = cams.iter().enumerate().map(|(i, cam)| {
        Row::new([
            (i + 1).to_string(),
            cam.location.name.clone(),
            cam.location.country.clone(),
            cam.location.timezone.clone(),
            format!("{:.1}", cam.score),
            cam.url.clone(),
        ])
    });
    let widths = [
        Constraint::Length(3),
        Constraint::Length(20),
        Constraint::Length(16),
        Constraint::Length(22),
        Constraint::Length(7),
        Constraint::Min(10),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = TableState::default().with_selected(Some(selected));
    frame.render_stateful_widget(table, table_area, &mut state);

    frame.render_widget(
        Paragraph::new("Best chance first. Enter opens the selected stream in your browser.")
            .style(Style::default().fg(Color::Gray)),
        hint,
    );
}

#[cfg(test)]
mod tests {
    use aurora_core::{ForecastPoint, model::{MagReading, PlasmaReading}};
    use chrono::{TimeZone, Utc};
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::app::testing::{offline_app, webcam};

    fn render(app: &App) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal
    }

    fn text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn idle_tab_shows_placeholder_and_tab_bar() {
        let screen = text(&render(&offline_app(Tab::Kp)));
        assert!(screen.contains("1 Kp Index"));
        assert!(screen.contains("7 Webcams"));
        assert!(screen.contains("Not loaded yet. Press r to refresh."));
    }

    #[test]
    fn failed_tab_shows_unavailable() {
        let mut app = offline_app(Tab::SolarWind);
        app.dashboard.solar_wind = TabState::Error("offline".into());
        let screen = text(&render(&app));
        assert!(screen.contains("Data unavailable: offline"));
    }

    #[test]
    fn forecast_bars_take_the_kp_colour() {
        let start = Utc.with_ymd_and_hms(2030, 3, 1, 0, 0, 0).unwrap();
        let mut app = offline_app(Tab::ShortForecast);
        app.dashboard.short_forecast = TabState::Displayed(ForecastSeries {
            horizon: ForecastHorizon::ThreeDay,
            points: [2.0, 6.67, 4.33]
                .iter()
                .enumerate()
                .map(|(i, kp)| ForecastPoint {
                    time: start + chrono::Duration::hours(3 * i as i64),
                    kp: *kp,
                    observed: None,
                })
                .collect(),
        });

        let terminal = render(&app);
        let screen = text(&terminal);
        assert!(screen.contains("3-Day Kp Forecast"));
        assert!(screen.contains("Highest Kp: 6.67 (red)"));

        let cells = terminal.backend().buffer().content();
        assert!(cells.iter().any(|c| c.symbol() == "█" && c.fg == Color::Red));
        assert!(cells.iter().any(|c| c.symbol() == "█" && c.fg == Color::Green));
    }

    #[test]
    fn stale_solar_wind_keeps_data_and_notes_failure() {
        let time = Utc.with_ymd_and_hms(2030, 3, 1, 12, 0, 0).unwrap();
        let mut app = offline_app(Tab::SolarWind);
        app.dashboard.solar_wind = TabState::Stale {
            data: SolarWind {
                plasma: vec![PlasmaReading { time, density: 4.2, speed: 610.0, temperature: None }],
                mag: vec![MagReading { time, bz: -7.5, bt: 9.1 }],
            },
            error: "HTTP 503".into(),
        };

        let screen = text(&render(&app));
        assert!(screen.contains("refresh failed: HTTP 503"));
        assert!(screen.contains("speed 610 km/s"));
        assert!(screen.contains("southward"));
    }

    #[test]
    fn webcam_table_lists_timezones() {
        let mut app = offline_app(Tab::Webcams);
        app.dashboard.webcams =
            TabState::Displayed(vec![webcam("Tromso", "Europe/Oslo"), webcam("Fairbanks", "America/Anchorage")]);

        let screen = text(&render(&app));
        assert!(screen.contains("Timezone"));
        assert!(screen.contains("America/Anchorage"));
        assert!(screen.contains("> 1"));
    }
}
