//! List the frame style catalog.

use photostrip_common::config::AppConfig;

pub fn run(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.list())?);
        return Ok(());
    }

    println!("Frame styles ({})", catalog.len());
    println!("{}", "=".repeat(50));
    for (index, style) in catalog.list().iter().enumerate() {
        let marker = if index == 0 { " (default)" } else { "" };
        println!("{index:>2}. {}{marker}", style.name);
        println!("      Preview: {}", style.preview.declaration);
        if let Some(text) = &style.preview.text {
            println!("      Text:    {text}");
        }
        println!("      Export:  {}", style.export.css);
    }
    Ok(())
}
