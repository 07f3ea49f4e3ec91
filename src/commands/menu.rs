//! Interactive, menu-driven mode
//!
//! Menus are a static tree. Each level lists its entries sorted by name and
//! numbered from 1; `0` goes back a level and `q` quits.

use anyhow::{Context as _, Result};
use chrono::Local;
use colored::Colorize;
use console::Term;
use dialoguer::Input;
use wapi::AttributeType;

use crate::Context;
use crate::commands::{attributes, cleanup, networks, provider, views};
use crate::export;
use crate::paths;
use crate::session::Session;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ListAttributes,
    ListMissing,
    Analyze,
    CreateMissing,
    ExportAnalysis,
    DeleteAttribute,
    ListNetworks,
    DeleteNetwork,
    ListViews,
    ChangeView,
    Sync,
    Search,
    Audit,
    Cleanup,
}

impl Action {
    /// Values asked for before the action runs
    fn prompts(self) -> &'static [&'static str] {
        match self {
            Action::DeleteAttribute => &["name"],
            Action::DeleteNetwork => &["cidr"],
            Action::Search => &["term"],
            Action::Cleanup => &["file"],
            _ => &[],
        }
    }
}

enum Entry {
    Group {
        name: &'static str,
        help: &'static str,
        children: &'static [Entry],
    },
    Action {
        name: &'static str,
        help: &'static str,
        action: Action,
    },
}

impl Entry {
    fn name(&self) -> &'static str {
        match self {
            Entry::Group { name, .. } | Entry::Action { name, .. } => *name,
        }
    }

    fn help(&self) -> &'static str {
        match self {
            Entry::Group { help, .. } | Entry::Action { help, .. } => *help,
        }
    }
}

const ATTRIBUTES: &[Entry] = &[
    Entry::Action {
        name: "list",
        help: "List attribute definitions on the appliance",
        action: Action::ListAttributes,
    },
    Entry::Action {
        name: "list-missing",
        help: "List tag keys with no attribute definition",
        action: Action::ListMissing,
    },
    Entry::Action {
        name: "analyze",
        help: "Missing keys, similar names and tag usage",
        action: Action::Analyze,
    },
    Entry::Action {
        name: "create-missing",
        help: "Create definitions for every missing tag key",
        action: Action::CreateMissing,
    },
    Entry::Action {
        name: "export",
        help: "Write the analysis to JSON and CSV",
        action: Action::ExportAnalysis,
    },
    Entry::Action {
        name: "delete",
        help: "Delete an attribute definition",
        action: Action::DeleteAttribute,
    },
];

const NETWORKS: &[Entry] = &[
    Entry::Action {
        name: "list",
        help: "List networks in the current view",
        action: Action::ListNetworks,
    },
    Entry::Action {
        name: "delete",
        help: "Delete a network by CIDR",
        action: Action::DeleteNetwork,
    },
];

const HOME: &[Entry] = &[
    Entry::Group {
        name: "attributes",
        help: "Extensible attribute definitions vs. AWS tags",
        children: ATTRIBUTES,
    },
    Entry::Group {
        name: "networks",
        help: "Networks on the appliance",
        children: NETWORKS,
    },
    Entry::Action {
        name: "views",
        help: "List network views",
        action: Action::ListViews,
    },
    Entry::Action {
        name: "change-view",
        help: "Switch to another network view",
        action: Action::ChangeView,
    },
    Entry::Action {
        name: "sync",
        help: "Create appliance networks for exported VPCs",
        action: Action::Sync,
    },
    Entry::Action {
        name: "search",
        help: "Search the export by id, CIDR, tag key or tag value",
        action: Action::Search,
    },
    Entry::Action {
        name: "audit",
        help: "Compare exported VPCs with appliance networks",
        action: Action::Audit,
    },
    Entry::Action {
        name: "cleanup",
        help: "Delete the attributes and networks listed in a TOML file",
        action: Action::Cleanup,
    },
];

#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Quit,
    Back,
    Select(usize),
    Invalid,
}

fn parse_choice(input: &str, count: usize) -> Choice {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }
    match input.parse::<usize>() {
        Ok(0) => Choice::Back,
        Ok(n) if n <= count => Choice::Select(n - 1),
        _ => Choice::Invalid,
    }
}

/// Entries below `path`, sorted by name
fn level(path: &[&'static str]) -> Vec<&'static Entry> {
    let mut entries: &'static [Entry] = HOME;
    for part in path {
        let children = entries.iter().find_map(|entry| match entry {
            Entry::Group { name, children, .. } if name == part => Some(*children),
            _ => None,
        });
        match children {
            Some(children) => entries = children,
            None => break,
        }
    }
    let mut sorted: Vec<&'static Entry> = entries.iter().collect();
    sorted.sort_by_key(|entry| entry.name());
    sorted
}

fn breadcrumbs(view: &str, path: &[&str]) -> String {
    let view = format!("[{view}]");
    let mut parts = vec!["Home", view.as_str()];
    parts.extend_from_slice(path);
    parts.join(" > ")
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display(term: &Term, session: &Session, path: &[&'static str], entries: &[&Entry]) {
    let _ = term.clear_screen();
    println!(
        "{}\n",
        breadcrumbs(&session.client().view().to_string(), path).bold()
    );
    for (i, entry) in entries.iter().enumerate() {
        let marker = if matches!(entry, Entry::Group { .. }) {
            " >"
        } else {
            ""
        };
        println!("{}. {}{}", i + 1, capitalize(entry.name()), marker);
        println!("   - {}", entry.help().dimmed());
    }
    println!("\n0. Back");
    println!("q. Quit");
}

pub fn run(ctx: &Context, session: &mut Session) -> Result<()> {
    let term = Term::stdout();
    let mut path: Vec<&'static str> = Vec::new();

    loop {
        let entries = level(&path);
        display(&term, session, &path, &entries);

        let Ok(input) = Input::<String>::new()
            .with_prompt("\nEnter your choice")
            .allow_empty(true)
            .interact_text()
        else {
            break;
        };

        let index = match parse_choice(&input, entries.len()) {
            Choice::Quit => break,
            Choice::Back => {
                if path.pop().is_none() {
                    break;
                }
                continue;
            }
            Choice::Invalid => {
                println!("Invalid choice. Press Enter to continue...");
                let _ = term.read_line();
                continue;
            }
            Choice::Select(index) => index,
        };

        match entries[index] {
            Entry::Group { name, .. } => path.push(*name),
            Entry::Action { name, action, .. } => {
                let Some(args) = ask_args(*action) else {
                    println!("\nCommand cancelled.");
                    continue;
                };
                println!("\nExecuting: {name}\n");
                if let Err(err) = execute(ctx, session, *action, &args) {
                    log::error!("Error executing {name}: {err:#}");
                    ui::error(&format!("{err:#}"));
                }
                println!("\nPress Enter to return to the menu...");
                let _ = term.read_line();
            }
        }
    }

    println!("Exiting interactive menu.");
    Ok(())
}

/// `None` when a prompt was interrupted
fn ask_args(action: Action) -> Option<Vec<String>> {
    action
        .prompts()
        .iter()
        .map(|name| {
            Input::<String>::new()
                .with_prompt(format!("Enter value for '{name}'"))
                .interact_text()
                .ok()
                .map(|value| value.trim().to_string())
        })
        .collect()
}

fn execute(ctx: &Context, session: &mut Session, action: Action, args: &[String]) -> Result<()> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
    match action {
        Action::ListAttributes => attributes::list(ctx, session),
        Action::ListMissing => attributes::list_missing(ctx, session),
        Action::Analyze => attributes::analyze(ctx, session, false),
        Action::CreateMissing => {
            attributes::create_missing(ctx, session, AttributeType::String, None)
        }
        Action::ExportAnalysis => {
            let base: String = Input::new()
                .with_prompt("Base filename for the export")
                .default(export::default_base_name(Local::now()))
                .interact_text()
                .context("Failed to read file name")?;
            attributes::export(ctx, session, Some(base))
        }
        Action::DeleteAttribute => attributes::delete(ctx, session, vec![arg(0)]),
        Action::ListNetworks => networks::list(ctx, session, None),
        Action::DeleteNetwork => networks::delete(ctx, session, vec![arg(0)]),
        Action::ListViews => views::run(ctx, session),
        Action::ChangeView => session.change_view(ctx),
        Action::Sync => provider::sync(ctx, session),
        Action::Search => provider::search(ctx, session, &arg(0), false),
        Action::Audit => provider::audit(ctx, session),
        Action::Cleanup => cleanup::run(ctx, session, &paths::expand(&arg(0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("q", 3), Choice::Quit);
        assert_eq!(parse_choice(" Q ", 3), Choice::Quit);
        assert_eq!(parse_choice("0", 3), Choice::Back);
        assert_eq!(parse_choice("1", 3), Choice::Select(0));
        assert_eq!(parse_choice("3", 3), Choice::Select(2));
        assert_eq!(parse_choice("4", 3), Choice::Invalid);
        assert_eq!(parse_choice("", 3), Choice::Invalid);
        assert_eq!(parse_choice("two", 3), Choice::Invalid);
    }

    #[test]
    fn test_home_level_sorted() {
        let names: Vec<&str> = level(&[]).iter().map(|e| e.name()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"attributes"));
        assert!(names.contains(&"cleanup"));
    }

    #[test]
    fn test_group_level() {
        let names: Vec<&str> = level(&["networks"]).iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["delete", "list"]);
    }

    #[test]
    fn test_breadcrumbs() {
        assert_eq!(breadcrumbs("All", &[]), "Home > [All]");
        assert_eq!(
            breadcrumbs("prod", &["attributes"]),
            "Home > [prod] > attributes"
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("list-missing"), "List-missing");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_prompts() {
        assert_eq!(Action::Search.prompts(), &["term"]);
        assert!(Action::Audit.prompts().is_empty());
    }
}
