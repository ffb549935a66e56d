//! Scrub through a track interactively on the terminal with the tui crate
use crate::config::ViewerConfig;
use crate::gps::BoundingBox;
use crate::track::{Trackpoint, TrackViewer};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::debug;
use std::io;
use std::time::Duration;
use tui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    symbols,
    text::{Span, Spans},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph, Wrap},
    Terminal,
};

/// Slider change requested by a key press
#[derive(Clone, Copy, Debug, PartialEq)]
enum ScrubAction {
    Step(f64),
    Jump(f64),
    Quit,
    Ignore,
}

fn key_action(key: KeyEvent, step: f64) -> ScrubAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return ScrubAction::Quit;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => ScrubAction::Quit,
        KeyCode::Right | KeyCode::Up | KeyCode::Char('l') => ScrubAction::Step(step),
        KeyCode::Left | KeyCode::Down | KeyCode::Char('h') => ScrubAction::Step(-step),
        KeyCode::PageUp => ScrubAction::Step(10.0 * step),
        KeyCode::PageDown => ScrubAction::Step(-10.0 * step),
        KeyCode::Home => ScrubAction::Jump(0.0),
        KeyCode::End => ScrubAction::Jump(100.0),
        _ => ScrubAction::Ignore,
    }
}

/// Interactive slider over a loaded track
#[derive(Debug)]
pub struct TerminalScrubber {
    step: f64,
    missing_description: String,
    slider: f64,
}

impl TerminalScrubber {
    pub fn new(config: &ViewerConfig) -> Self {
        TerminalScrubber {
            step: config.scrub_step(),
            missing_description: config.missing_description().to_string(),
            slider: 0.0,
        }
    }

    /// Current slider value as a percentage of the track distance
    pub fn slider(&self) -> f64 {
        self.slider
    }

    /// Move the slider and update the viewer. Returns false if the key ends the session.
    fn handle_key(&mut self, key: KeyEvent, viewer: &mut TrackViewer) -> bool {
        let slider = match key_action(key, self.step) {
            ScrubAction::Quit => return false,
            ScrubAction::Ignore => return true,
            ScrubAction::Step(delta) => self.slider + delta,
            ScrubAction::Jump(value) => value,
        };
        self.slider = slider.max(0.0).min(100.0);
        if !viewer.on_slider_input(self.slider) {
            debug!("Slider at {:.1}% left the position unchanged", self.slider);
        }
        true
    }

    /// Take over the terminal until the user quits, restoring it afterwards
    pub fn run(&mut self, viewer: &mut TrackViewer) -> Result<(), Box<dyn std::error::Error>> {
        viewer.on_slider_input(self.slider);
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let result = self.event_loop(viewer);

        disable_raw_mode()?;
        execute!(stdout, LeaveAlternateScreen)?;
        result
    }

    fn event_loop(&mut self, viewer: &mut TrackViewer) -> Result<(), Box<dyn std::error::Error>> {
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let trace: Vec<(f64, f64)> = viewer
            .track()
            .points()
            .iter()
            .map(Trackpoint::location)
            .map(|l| (l.longitude(), l.latitude()))
            .collect();
        let waypoints: Vec<(f64, f64)> = viewer
            .track()
            .waypoints()
            .iter()
            .map(|w| (w.location().longitude(), w.location().latitude()))
            .collect();
        let bounds = viewer.track().bounds();
        let mut popups: Vec<Spans> = viewer
            .track()
            .waypoints()
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Spans::from(format!(
                    "{}. {}: {}",
                    i + 1,
                    w.name().unwrap_or("Waypoint"),
                    w.popup_text(&self.missing_description)
                ))
            })
            .collect();
        popups.push(Spans::from(Span::styled(
            "←/→ step  PgUp/PgDn jump  Home/End ends  q quit",
            Style::default().fg(Color::DarkGray),
        )));

        loop {
            let position: Vec<(f64, f64)> = viewer
                .state()
                .marker()
                .map(|l| vec![(l.longitude(), l.latitude())])
                .unwrap_or_default();
            let info = viewer.state().info().to_string();
            let slider = self.slider;
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(
                        [
                            Constraint::Min(10),
                            Constraint::Length(3),
                            Constraint::Length(popups.len() as u16 + 3),
                        ]
                        .as_ref(),
                    )
                    .split(f.size());

                let datasets = vec![
                    Dataset::default()
                        .name("track")
                        .marker(symbols::Marker::Braille)
                        .graph_type(GraphType::Line)
                        .style(Style::default().fg(Color::Cyan))
                        .data(&trace),
                    Dataset::default()
                        .name("waypoints")
                        .marker(symbols::Marker::Dot)
                        .graph_type(GraphType::Scatter)
                        .style(Style::default().fg(Color::Yellow))
                        .data(&waypoints),
                    Dataset::default()
                        .name("position")
                        .marker(symbols::Marker::Block)
                        .graph_type(GraphType::Scatter)
                        .style(Style::default().fg(Color::Red))
                        .data(&position),
                ];
                let ((x_min, x_max), (y_min, y_max)) = chart_bounds(bounds.as_ref());
                let chart = Chart::new(datasets)
                    .block(Block::default().title("Track").borders(Borders::ALL))
                    .x_axis(
                        Axis::default()
                            .title(Span::styled("longitude", Style::default().fg(Color::Red)))
                            .style(Style::default().fg(Color::White))
                            .bounds([x_min, x_max])
                            .labels(vec![
                                Span::from(format!("{:.4}", x_min)),
                                Span::from(format!("{:.4}", x_max)),
                            ]),
                    )
                    .y_axis(
                        Axis::default()
                            .title(Span::styled("latitude", Style::default().fg(Color::Red)))
                            .style(Style::default().fg(Color::White))
                            .bounds([y_min, y_max])
                            .labels(vec![
                                Span::from(format!("{:.4}", y_min)),
                                Span::from(format!("{:.4}", y_max)),
                            ]),
                    );
                f.render_widget(chart, chunks[0]);

                let gauge = Gauge::default()
                    .block(Block::default().title("Position").borders(Borders::ALL))
                    .gauge_style(Style::default().fg(Color::Cyan))
                    .ratio(slider / 100.0)
                    .label(Span::from(format!("{:.1}%", slider)));
                f.render_widget(gauge, chunks[1]);

                let mut lines = vec![Spans::from(info.clone())];
                lines.extend(popups.iter().cloned());
                let paragraph = Paragraph::new(lines)
                    .block(Block::default().title("Info").borders(Borders::ALL))
                    .wrap(Wrap { trim: true });
                f.render_widget(paragraph, chunks[2]);
            })?;

            if event::poll(Duration::from_millis(250))? {
                if let Event::Key(key) = event::read()? {
                    if !self.handle_key(key, viewer) {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Chart axes fit to the track with a small margin, (longitude, latitude) ranges
fn chart_bounds(bounds: Option<&BoundingBox>) -> ((f64, f64), (f64, f64)) {
    match bounds {
        Some(b) => {
            let pad_lon = ((b.max_lon() - b.min_lon()) * 0.05).max(1e-4);
            let pad_lat = ((b.max_lat() - b.min_lat()) * 0.05).max(1e-4);
            (
                (b.min_lon() - pad_lon, b.max_lon() + pad_lon),
                (b.min_lat() - pad_lat, b.max_lat() + pad_lat),
            )
        }
        None => ((-180.0, 180.0), (-90.0, 90.0)),
    }
}
