use anyhow::{anyhow, Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{self, BindOptions, SplitOptions, HORCRUX_EXT};
use crate::config::Config;

/// Execute the init command
pub fn init() -> Result<()> {
    Config::initialize()?;
    Ok(())
}

/// Execute the split command
pub fn split(
    config: Config,
    file: PathBuf,
    total: Option<u8>,
    threshold: Option<u8>,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("{}", style("Split a file into horcruxes").bold().green());

    // Prompt for anything the flags left out, seeded with config defaults
    let total = match total {
        Some(n) => n,
        None => Input::new()
            .with_prompt("How many horcruxes do you want to split this file into?")
            .default(config.default_total)
            .validate_with(|n: &u8| {
                if *n >= 2 {
                    Ok(())
                } else {
                    Err("you need at least 2 horcruxes")
                }
            })
            .interact_text()?,
    };

    let threshold = match threshold {
        Some(k) => k,
        None => Input::new()
            .with_prompt("How many horcruxes should be required to reconstruct it?")
            .default(config.default_threshold.min(total))
            .validate_with(move |k: &u8| {
                if *k < 2 {
                    Err("the threshold must be at least 2".to_string())
                } else if *k > total {
                    Err(format!("the threshold cannot exceed the total ({total})"))
                } else {
                    Ok(())
                }
            })
            .interact_text()?,
    };

    let pb = spinner("Splitting...");

    let opts = SplitOptions {
        total,
        threshold,
        output_dir: output,
    };
    let written = api::split(&file, &opts)?;

    pb.finish_and_clear();

    println!(
        "{}",
        style(format!(
            "Created {} horcruxes (any {} can restore the file):",
            written.len(),
            threshold
        ))
        .green()
    );
    for path in &written {
        println!("  {}", path.display());
    }

    Ok(())
}

/// Execute the bind command
pub fn bind(sources: Vec<PathBuf>, output: Option<PathBuf>, force: bool) -> Result<()> {
    let paths = collect_horcrux_paths(&sources)?;

    if paths.is_empty() {
        return Err(anyhow!(
            "no .{HORCRUX_EXT} files found in the given location(s)"
        ));
    }

    println!(
        "{}",
        style(format!("Binding {} horcruxes...", paths.len())).bold()
    );

    let pb = spinner("Reconstructing...");

    let opts = BindOptions {
        output,
        overwrite: force,
    };
    let restored = api::bind(&paths, &opts)?;

    pb.finish_and_clear();

    println!(
        "{}",
        style(format!("Restored {}", restored.display())).green().bold()
    );

    Ok(())
}

/// Resolve the bind sources into a flat list of fragment files. A directory
/// is scanned (non-recursively) for `*.horcrux`; a file is taken as-is.
fn collect_horcrux_paths(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for source in sources {
        if source.is_dir() {
            let entries = std::fs::read_dir(source)
                .with_context(|| format!("failed to read directory {}", source.display()))?;

            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.is_file() && p.extension().map_or(false, |ext| ext == HORCRUX_EXT)
                })
                .collect();
            found.sort();
            paths.extend(found);
        } else {
            paths.push(source.clone());
        }
    }

    Ok(paths)
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message);
    pb
}
