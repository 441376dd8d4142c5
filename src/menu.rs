use anyhow::{Context, Result};
use dialoguer::{Input, Select};

use tailscope_console::Session;

use crate::commands::Shell;

const ITEMS: [&str; 8] = [
    "Open log file",
    "Show all entries",
    "Search",
    "Errors and warnings",
    "Last N minutes",
    "Summary",
    "Tail",
    "Quit",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuChoice {
    Open,
    ShowAll,
    Search,
    Errors,
    Recent,
    Summary,
    Tail,
    Quit,
}

impl MenuChoice {
    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Open,
            1 => Self::ShowAll,
            2 => Self::Search,
            3 => Self::Errors,
            4 => Self::Recent,
            5 => Self::Summary,
            6 => Self::Tail,
            _ => Self::Quit,
        }
    }
}

/// Parse a minutes answer; only whole non-negative numbers are accepted
fn parse_minutes(input: &str) -> Result<u32, String> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("'{}' is not a whole number of minutes", input.trim()))
}

/// Interactive loop until the user picks Quit or cancels the menu
pub fn run(shell: &Shell, mut session: Option<Session>) -> Result<()> {
    loop {
        let title = match &session {
            Some(s) => format!("tailscope: {}", s.path().display()),
            None => "tailscope: no file open".to_string(),
        };

        let selection = Select::new()
            .with_prompt(title)
            .items(&ITEMS)
            .default(0)
            .interact_opt()
            .context("failed to read menu selection")?;

        let choice = selection.map_or(MenuChoice::Quit, MenuChoice::from_index);
        match choice {
            MenuChoice::Quit => return Ok(()),
            MenuChoice::Open => {
                let path: String = Input::new()
                    .with_prompt("Log file path")
                    .interact_text()
                    .context("failed to read file path")?;
                match shell.open(path.trim()) {
                    Ok(opened) => {
                        println!(
                            "Loaded {} entries ({})",
                            opened.entries().len(),
                            opened.grammar()
                        );
                        session = Some(opened);
                    }
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            _ => {
                let Some(current) = session.as_mut() else {
                    println!("Open a log file first.");
                    continue;
                };
                if let Err(e) = dispatch(shell, current, choice) {
                    eprintln!("Error: {:#}", e);
                }
            }
        }
    }
}

fn dispatch(shell: &Shell, session: &mut Session, choice: MenuChoice) -> Result<()> {
    match choice {
        MenuChoice::ShowAll => shell.show_all(session),
        MenuChoice::Search => {
            let query: String = Input::new()
                .with_prompt("Search text")
                .allow_empty(true)
                .interact_text()
                .context("failed to read search text")?;
            shell.search(session, &query)
        }
        MenuChoice::Errors => shell.errors(session),
        MenuChoice::Recent => {
            let answer: String = Input::new()
                .with_prompt("Minutes")
                .default("60".to_string())
                .validate_with(|input: &String| parse_minutes(input).map(|_| ()))
                .interact_text()
                .context("failed to read minutes")?;
            let minutes = parse_minutes(&answer).map_err(anyhow::Error::msg)?;
            shell.recent(session, minutes)
        }
        MenuChoice::Summary => {
            shell.summary(session);
            Ok(())
        }
        MenuChoice::Tail => {
            let filter: String = Input::new()
                .with_prompt("Only show entries containing (empty for all)")
                .allow_empty(true)
                .interact_text()
                .context("failed to read tail filter")?;
            shell.tail(session, Some(&filter))
        }
        MenuChoice::Open | MenuChoice::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_minutes(" 15 "), Ok(15));
        assert!(parse_minutes("-5").is_err());
        assert!(parse_minutes("soon").is_err());
        assert!(parse_minutes("").is_err());
    }

    #[test]
    fn test_menu_indices_cover_items() {
        assert_eq!(MenuChoice::from_index(0), MenuChoice::Open);
        assert_eq!(MenuChoice::from_index(ITEMS.len() - 1), MenuChoice::Quit);
        assert_eq!(MenuChoice::from_index(99), MenuChoice::Quit);
    }
}
