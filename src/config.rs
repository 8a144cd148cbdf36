use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::preview::{CodeBlockOptions, PreviewOptions};

/// How the CLI prints the overlay set.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One instruction per line.
    Text,
    Json,
    /// Instructions plus the HTML of every embedded view.
    Html,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub source_mode: bool,
    pub line_numbers: bool,
    pub no_copy_button: bool,
    pub no_images: bool,
    pub json: bool,
    pub perf: bool,
    pub format: Option<OutputFormat>,
    pub default_language: Option<String>,
    pub base_path: Option<PathBuf>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            source_mode: self.source_mode || other.source_mode,
            line_numbers: self.line_numbers || other.line_numbers,
            no_copy_button: self.no_copy_button || other.no_copy_button,
            no_images: self.no_images || other.no_images,
            json: self.json || other.json,
            perf: self.perf || other.perf,
            format: other.format.or(self.format),
            default_language: other
                .default_language
                .clone()
                .or_else(|| self.default_language.clone()),
            base_path: other.base_path.clone().or_else(|| self.base_path.clone()),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Builder options these flags describe.
    pub fn preview_options(&self) -> PreviewOptions {
        let mut options = PreviewOptions {
            code_block: CodeBlockOptions {
                line_numbers: self.line_numbers,
                copy_button: !self.no_copy_button,
                ..CodeBlockOptions::default()
            },
            ..PreviewOptions::default()
        };
        if let Some(language) = &self.default_language {
            options.code_block.default_language.clone_from(language);
        }
        options.image.autoload = !self.no_images;
        options.image.base_path = self
            .base_path
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned());
        options
    }

    /// `--json` is shorthand for `--format json`.
    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            Some(format) => format,
            None if self.json => OutputFormat::Json,
            None => OutputFormat::Text,
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("livemark").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("livemark")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("livemark").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("livemark").join("config");
        }
    }

    PathBuf::from(".livemarkrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".livemarkrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# livemark defaults (saved with --save)".to_string());
    let switches = [
        (flags.source_mode, "--source-mode"),
        (flags.line_numbers, "--line-numbers"),
        (flags.no_copy_button, "--no-copy-button"),
        (flags.no_images, "--no-images"),
        (flags.json, "--json"),
        (flags.perf, "--perf"),
    ];
    lines.extend(
        switches
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, flag)| (*flag).to_string()),
    );
    if let Some(format) = flags.format {
        lines.push(format!("--format {}", format_name(format)));
    }
    if let Some(language) = &flags.default_language {
        lines.push(format!("--default-language {language}"));
    }
    if let Some(path) = &flags.base_path {
        lines.push(format!("--base-path {}", path.display()));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        match name {
            "--source-mode" => flags.source_mode = true,
            "--line-numbers" => flags.line_numbers = true,
            "--no-copy-button" => flags.no_copy_button = true,
            "--no-images" => flags.no_images = true,
            "--json" => flags.json = true,
            "--perf" => flags.perf = true,
            "--format" | "--default-language" | "--base-path" | "--render-debug-log" => {
                let value = match inline_value {
                    Some(value) => Some(value.to_string()),
                    None => {
                        let next = tokens.get(i + 1).cloned();
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: String) {
    match name {
        "--format" => flags.format = parse_format(&value),
        "--default-language" => flags.default_language = Some(value),
        "--base-path" => flags.base_path = Some(PathBuf::from(value)),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_format(s: &str) -> Option<OutputFormat> {
    match s {
        "text" => Some(OutputFormat::Text),
        "json" => Some(OutputFormat::Json),
        "html" => Some(OutputFormat::Html),
        _ => None,
    }
}

const fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
        OutputFormat::Html => "html",
    }
}
