use std::io::Write;
use std::path::Path;

#[cfg(feature = "colored-output")]
use colored::*;
use serde::Serialize;
use stream_session::ResolvedStream;

use crate::cli::OutputFormat;
use crate::error::Result;

#[derive(Serialize)]
struct ResolveOutput<'a> {
    status: &'static str,
    token: &'a str,
    mode: String,
    cdn: &'a str,
    link: &'a str,
    play_url: &'a str,
}

pub struct OutputManager {
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    pub fn format_resolved(
        &self,
        token: &str,
        resolved: &ResolvedStream,
        format: OutputFormat,
    ) -> Result<String> {
        let output = ResolveOutput {
            status: "ok",
            token,
            mode: resolved.mode.to_string(),
            cdn: &resolved.location.cdn,
            link: &resolved.location.link,
            play_url: &resolved.play_url,
        };

        match format {
            OutputFormat::Pretty => Ok(self.format_pretty(&output)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&output)? + "\n"),
            OutputFormat::JsonCompact => Ok(serde_json::to_string(&output)? + "\n"),
        }
    }

    fn format_pretty(&self, output: &ResolveOutput<'_>) -> String {
        let mut text = String::new();
        text.push_str(&self.colorize("Resolved stream:", Color::Green, true));
        text.push('\n');
        for (label, value, color) in [
            ("Token", output.token, Color::Cyan),
            ("Mode", output.mode.as_str(), Color::Cyan),
            ("CDN", output.cdn, Color::Cyan),
            ("Link", output.link, Color::Blue),
            ("Play URL", output.play_url, Color::Blue),
        ] {
            text.push_str(&format!(
                "  {}: {}\n",
                self.colorize(label, Color::Yellow, false),
                self.colorize(value, color, false)
            ));
        }
        text
    }

    fn colorize(&self, text: &str, color: Color, bold: bool) -> String {
        #[cfg(feature = "colored-output")]
        {
            if self.colored {
                let colored_text = match color {
                    Color::Green => text.green(),
                    Color::Yellow => text.yellow(),
                    Color::Blue => text.blue(),
                    Color::Cyan => text.cyan(),
                };
                return if bold {
                    colored_text.bold().to_string()
                } else {
                    colored_text.to_string()
                };
            }
        }

        let _ = (color, bold, self.colored);
        text.to_string()
    }
}

#[derive(Clone, Copy)]
enum Color {
    Green,
    Yellow,
    Blue,
    Cyan,
}

pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
        }
        None => {
            print!("{content}");
            std::io::stdout().flush()?;
        }
    }
    Ok(())
}
