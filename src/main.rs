//! Livemark - live-preview decisions for a markdown file.
//!
//! Prints the overlay instructions a live-preview editor would draw for the
//! given selection.
//!
//! # Usage
//!
//! ```bash
//! livemark README.md
//! livemark --cursor 120 README.md
//! livemark --cursor 10..42 --cursor 300 --json README.md
//! livemark --drag --format html README.md
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use livemark::changes::EditOperation;
use livemark::config::{
    ConfigFlags, OutputFormat, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use livemark::perf;
use livemark::selection::{Selection, SelectionRange};
use livemark::session::{Message, Session};
use livemark::view::View;

/// Show which markdown elements a live-preview editor renders
#[derive(Parser, Debug)]
#[command(name = "livemark", version, about, long_about = None)]
struct Cli {
    /// Markdown file to inspect
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Selection range as OFFSET or FROM..TO (character offsets, repeatable)
    #[arg(long = "cursor", value_name = "RANGE", value_parser = parse_range)]
    cursors: Vec<SelectionRange>,

    /// Build as if a pointer drag were in progress
    #[arg(long)]
    drag: bool,

    /// Start with live preview disabled (everything stays source)
    #[arg(long)]
    source_mode: bool,

    /// Show line numbers in rendered code blocks
    #[arg(long)]
    line_numbers: bool,

    /// Hide the copy button on rendered code blocks
    #[arg(long)]
    no_copy_button: bool,

    /// Do not load images
    #[arg(long)]
    no_images: bool,

    /// Language for fenced code without an info string
    #[arg(long, value_name = "LANG")]
    default_language: Option<String>,

    /// Directory relative image paths resolve against
    #[arg(long, value_name = "PATH")]
    base_path: Option<PathBuf>,

    /// Print the overlay set as JSON
    #[arg(long)]
    json: bool,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed build and update events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_range(s: &str) -> Result<SelectionRange, String> {
    let parse = |part: &str| {
        part.trim()
            .parse::<usize>()
            .map_err(|err| format!("invalid offset '{part}': {err}"))
    };
    match s.split_once("..") {
        Some((anchor, head)) => Ok(SelectionRange::new(parse(anchor)?, parse(head)?)),
        None => Ok(SelectionRange::cursor(parse(s)?)),
    }
}

fn print_overlays(session: &mut Session, format: OutputFormat) -> Result<()> {
    let overlays = session.overlays();
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&overlays).context("Failed to encode overlays")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for overlay in overlays.iter() {
                println!("{overlay}");
            }
        }
        OutputFormat::Html => {
            for overlay in overlays.iter() {
                println!("{overlay}");
                if let Some(view) = overlay.view() {
                    if let View::Image(image) = view {
                        image.load_now(session.image_loader());
                    }
                    println!("    {}", session.render_view(view));
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("LIVEMARK_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    // Verify file exists
    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }

    let mut session = Session::open(&cli.file, effective.preview_options())?;
    if effective.source_mode {
        session.update(Message::SetLivePreview(false));
    }
    if !cli.cursors.is_empty() {
        let selection = Selection::new(cli.cursors.clone());
        session.update(Message::Edit(EditOperation::new().with_selection(selection)));
    }
    if cli.drag {
        session.update(Message::PointerDown);
        // Overlays are frozen mid-drag until something forces a rebuild.
        session.update(Message::Edit(EditOperation::new().with_reconfigured()));
    }

    print_overlays(&mut session, effective.output_format())?;
    if perf::is_enabled() {
        for (name, stats) in perf::summary() {
            eprintln!(
                "[perf] total {name}: {} calls, {:.2} ms ({:.3} ms avg)",
                stats.calls,
                stats.total_ms,
                stats.mean_ms()
            );
        }
    }
    Ok(())
}
