//! Line-driven booth: one command per stdin line.

use std::path::PathBuf;

use photostrip_capture_engine::{BoothEvent, BoothView, PhotoBooth};
use photostrip_common::config::AppConfig;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "Commands: capture | retake | edit | back | style <name> | styles | \
download | dismiss | status | help | quit";

enum Command {
    Event(BoothEvent),
    Download,
    Styles,
    Status,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(w, r)| (w, r.trim()))
        .unwrap_or((line, ""));

    let command = match word.to_ascii_lowercase().as_str() {
        "capture" | "c" => Command::Event(BoothEvent::Capture),
        "retake" | "r" => Command::Event(BoothEvent::Retake),
        "edit" | "e" => Command::Event(BoothEvent::Edit),
        "back" | "b" => Command::Event(BoothEvent::Back),
        "dismiss" => Command::Event(BoothEvent::DismissNotice),
        "style" if rest.is_empty() => return Err("usage: style <name>".to_string()),
        "style" => Command::Event(BoothEvent::SelectStyle(rest.to_string())),
        "styles" => Command::Styles,
        "download" | "d" => Command::Download,
        "status" | "s" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(command)
}

fn print_view(view: &BoothView) {
    println!("Mode: {} | Style: {}", view.mode, view.style_name);
    let slots: Vec<String> = view.slots.iter().map(ToString::to_string).collect();
    println!("Strip: {}", slots.join(" | "));
    let actions: Vec<String> = view.actions.iter().map(ToString::to_string).collect();
    println!("Actions: {}", actions.join(", "));
    if let Some(notice) = &view.notice {
        println!("[!] {} (type 'dismiss' to close)", notice.message);
    }
}

pub async fn run(
    config: &AppConfig,
    images: Vec<PathBuf>,
    synthetic: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config)?;
    let camera = super::open_camera(&images, synthetic)?;
    let exporter = super::build_exporter(config, output)?;
    let mut booth = PhotoBooth::new(catalog, camera);

    println!("Photostrip booth. {HELP}");
    print_view(&booth.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}. {HELP}");
                continue;
            }
        };

        match command {
            Command::Event(event) => {
                if let Err(e) = booth.handle(event) {
                    println!("Rejected: {e}");
                }
            }
            Command::Download => match booth.download(&exporter).await {
                Ok(artifact) => println!(
                    "Saved {} ({}x{})",
                    artifact.filename, artifact.width, artifact.height
                ),
                Err(e) if e.is_rejection() => println!("Rejected: {e}"),
                Err(_) => {}
            },
            Command::Styles => {
                for style in booth.catalog().list() {
                    println!("  {}", style.name);
                }
                continue;
            }
            Command::Status => {}
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
        }
        print_view(&booth.view());
    }

    tracing::debug!("Booth session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_style_keeps_spaces() {
        match parse("style  Purple Retro ") {
            Ok(Command::Event(BoothEvent::SelectStyle(name))) => assert_eq!(name, "Purple Retro"),
            _ => panic!("expected style selection"),
        }
    }

    #[test]
    fn test_parse_rejects_bare_style_and_unknown() {
        assert!(parse("style").is_err());
        assert!(parse("jump").is_err());
    }

    #[test]
    fn test_parse_aliases() {
        assert!(matches!(parse("C"), Ok(Command::Event(BoothEvent::Capture))));
        assert!(matches!(parse("q"), Ok(Command::Quit)));
        assert!(matches!(parse("download"), Ok(Command::Download)));
    }
}
