//! The interactive dashboard: a prompt loop over the same operations the
//! one-shot commands use.

use std::process::ExitCode;

use anyhow::Context;
use inquire::{InquireError, Text};
use weatherboard_core::{Dashboard, KeyValueStore, Notice, Presenter};

use crate::render::TerminalPresenter;

const HELP: &str = "city name | #N = saved location | :here | :fav | :rm <name> | :q";

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Search(String),
    Pick(usize),
    Here,
    Favorites,
    Remove(String),
    Quit,
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let line = line.trim();

        if let Some(index) = line.strip_prefix('#') {
            return match index.trim().parse::<usize>() {
                Ok(n) => Input::Pick(n),
                Err(_) => Input::Unknown(line.to_string()),
            };
        }

        let Some(command) = line.strip_prefix(':') else {
            return Input::Search(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match (name, arg) {
            ("q" | "quit", _) => Input::Quit,
            ("here", _) => Input::Here,
            ("fav" | "favorites", _) => Input::Favorites,
            ("rm" | "remove", arg) if !arg.is_empty() => Input::Remove(arg.to_string()),
            _ => Input::Unknown(line.to_string()),
        }
    }
}

pub async fn run<S: KeyValueStore>(
    dashboard: &Dashboard<S, TerminalPresenter>,
) -> anyhow::Result<ExitCode> {
    let presenter = dashboard.presenter();

    // Failures below are shown as notices by the dashboard; the loop carries on.
    dashboard.show_favorites();
    let _ = dashboard.restore_last_search().await;

    loop {
        let help = presenter.active_notice().unwrap_or_else(|| HELP.to_string());

        let line = match Text::new("City:").with_help_message(&help).prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read input"),
        };

        match Input::parse(&line) {
            Input::Search(city) => {
                let _ = dashboard.search(&city).await;
            }
            Input::Pick(n) => match dashboard.favorites().get(n.wrapping_sub(1)) {
                Some(city) => {
                    let _ = dashboard.search(city).await;
                }
                None => presenter.show_notice(&Notice::new(format!("No saved location #{n}"))),
            },
            Input::Here => {
                let _ = dashboard.search_here().await;
            }
            Input::Favorites => {
                dashboard.show_favorites();
            }
            Input::Remove(name) => {
                let _ = dashboard.remove_favorite(&name);
            }
            Input::Unknown(command) => {
                presenter.show_notice(&Notice::new(format!("Unknown command: {command}")));
            }
            Input::Quit => break,
        }
    }

    Ok(ExitCode::SUCCESS)
}
