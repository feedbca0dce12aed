use std::{fmt::Write as _, str::FromStr};

use anyhow::{anyhow, bail, Error, Result};
use chrono::DateTime;

use crate::{
    db::SleepNight,
    tracker::{
        QualityEvent, RowStyle, SleepNightAdapter, SleepQualityViewModel, TrackerEvent,
        TrackerSnapshot,
    },
    AppState,
};

pub const HELP: &str = "commands: start | stop | rate <0-5> | clear | list | show <id> | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Rate(i32),
    Clear,
    List,
    Show(i64),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut parts = input.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();
        let argument = parts.next();
        if parts.next().is_some() {
            bail!("too many arguments for '{name}'");
        }

        let command = match (name.as_str(), argument) {
            ("start", None) => Command::Start,
            ("stop", None) => Command::Stop,
            ("rate", Some(value)) => Command::Rate(
                value
                    .parse()
                    .map_err(|_| anyhow!("rating must be a number, got '{value}'"))?,
            ),
            ("clear", None) => Command::Clear,
            ("list", None) => Command::List,
            ("show", Some(value)) => Command::Show(
                value
                    .parse()
                    .map_err(|_| anyhow!("night id must be a number, got '{value}'"))?,
            ),
            ("help", None) => Command::Help,
            ("quit" | "exit", None) => Command::Quit,
            ("rate" | "show", None) => bail!("'{name}' needs an argument"),
            ("start" | "stop" | "clear" | "list" | "help" | "quit" | "exit", Some(_)) => {
                bail!("'{name}' takes no arguments")
            }
            (other, _) => bail!("unknown command '{other}'"),
        };
        Ok(command)
    }
}

/// Text front-end over the tracker screens. Each handled command returns
/// the lines to print.
pub struct Shell {
    state: AppState,
    adapter: SleepNightAdapter,
    pending_rating: Option<i64>,
}

impl Shell {
    pub fn new(state: AppState) -> Self {
        let adapter = SleepNightAdapter::new(state.settings.settings().low_quality_threshold);
        Self {
            state,
            adapter,
            pending_rating: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Night the next `rate` command applies to.
    pub fn pending_rating(&self) -> Option<i64> {
        self.pending_rating
    }

    pub async fn handle(&mut self, command: Command) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        let tracker = &self.state.tracker;

        match command {
            Command::Start => {
                if let Some(night) = tracker.on_start_tracking().await? {
                    lines.push(format!("Tracking night {}", night.night_id));
                }
            }
            Command::Stop => {
                if tracker.on_stop_tracking().await?.is_none() {
                    lines.push("No night in progress".into());
                }
            }
            Command::Rate(quality) => {
                let night_key = self
                    .pending_rating
                    .ok_or_else(|| anyhow!("no night is waiting for a rating"))?;
                let rating = SleepQualityViewModel::new(self.state.db.clone(), night_key);
                rating.on_set_sleep_quality(quality).await?;
                self.pending_rating = None;

                for event in rating.drain_events().await {
                    match event {
                        QualityEvent::NavigateToSleepTracker => {
                            lines.push(format!("Night {night_key} rated {quality}"));
                            tracker.refresh_history().await?;
                        }
                    }
                }
            }
            Command::Clear => tracker.on_clear().await?,
            Command::List | Command::Quit => {}
            Command::Show(night_id) => tracker.on_sleep_night_clicked(night_id),
            Command::Help => lines.push(HELP.into()),
        }

        for event in self.state.tracker.drain_events().await {
            match event {
                TrackerEvent::NavigateToSleepQuality(night) => {
                    lines.push(format!(
                        "Night {} stopped; rate it with `rate <0-5>`",
                        night.night_id
                    ));
                    self.pending_rating = Some(night.night_id);
                }
                TrackerEvent::ShowSnackbar => {
                    lines.push("All sleep data has been cleared".into());
                    self.pending_rating = None;
                }
                TrackerEvent::NavigateToSleepDetail(night_id) => {
                    match self.state.db.get_night(night_id).await? {
                        Some(night) => lines.push(describe_night(&night)),
                        None => lines.push(format!("Night {night_id} not found")),
                    }
                }
            }
        }

        let snapshot = self.state.tracker.snapshot().await;
        self.adapter.set_data(snapshot.nights.clone());
        if self.adapter.take_redraw() || command == Command::List {
            lines.extend(self.render_rows());
        }
        lines.push(render_buttons(&snapshot));

        Ok(lines)
    }

    fn render_rows(&self) -> Vec<String> {
        if self.adapter.item_count() == 0 {
            return vec!["(no nights recorded)".into()];
        }

        self.adapter
            .rows()
            .into_iter()
            .map(|row| {
                let marker = match row.style {
                    RowStyle::Flagged => " !",
                    RowStyle::Normal => "",
                };
                format!("#{:<4} quality {}{}", row.night_id, row.quality_text, marker)
            })
            .collect()
    }
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

fn describe_night(night: &SleepNight) -> String {
    let mut line = format!(
        "Night {}: started {}",
        night.night_id,
        format_millis(night.start_time_milli)
    );
    if night.is_in_progress() {
        line.push_str(", still in progress");
    } else {
        let _ = write!(line, ", ended {}", format_millis(night.end_time_milli));
    }
    if night.is_rated() {
        let _ = write!(line, ", quality {}", night.sleep_quality);
    }
    line
}

fn render_buttons(snapshot: &TrackerSnapshot) -> String {
    let mut buttons = Vec::new();
    if snapshot.start_visible {
        buttons.push("start");
    }
    if snapshot.stop_visible {
        buttons.push("stop");
    }
    if snapshot.clear_visible {
        buttons.push("clear");
    }
    format!("[{}]", buttons.join("] ["))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("start".parse::<Command>().unwrap(), Command::Start);
        assert_eq!("  STOP ".parse::<Command>().unwrap(), Command::Stop);
        assert_eq!("rate 4".parse::<Command>().unwrap(), Command::Rate(4));
        assert_eq!("show 12".parse::<Command>().unwrap(), Command::Show(12));
        assert_eq!("exit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_bad_input() {
        assert!("".parse::<Command>().is_err());
        assert!("rate".parse::<Command>().is_err());
        assert!("rate high".parse::<Command>().is_err());
        assert!("start now".parse::<Command>().is_err());
        assert!("snooze".parse::<Command>().is_err());
    }

    #[test]
    fn describes_stopped_night() {
        let night = SleepNight {
            night_id: 3,
            start_time_milli: 0,
            end_time_milli: 60_000,
            sleep_quality: 4,
        };
        let line = describe_night(&night);
        assert!(line.starts_with("Night 3: started 1970-01-01T00:00:00"));
        assert!(line.contains("ended 1970-01-01T00:01:00"));
        assert!(line.ends_with("quality 4"));
    }

    #[test]
    fn buttons_follow_snapshot() {
        let snapshot = TrackerSnapshot::default();
        assert_eq!(render_buttons(&snapshot), "[start]");
    }
}
