use std::path::Path;

use anyhow::Context;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// A fully derived view, ready to paint.
pub trait Page: Serialize {
    fn markdown(&self) -> String;
}

pub fn render<P: Page>(page: &P, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Markdown => Ok(page.markdown()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(page).context("failed to serialize page")?;
            json.push('\n');
            Ok(json)
        }
    }
}

pub fn emit<P: Page>(page: &P, format: OutputFormat, out: Option<&Path>) -> anyhow::Result<()> {
    let rendered = render(page, format)?;
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Page written to {}.", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}
