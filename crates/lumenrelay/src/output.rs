use std::io::IsTerminal;
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// What `send` delivered to the strip relay.
#[derive(Debug, Serialize)]
pub struct SentFrame<'a> {
    pub socket: &'a Path,
    pub pixels: usize,
    pub bytes: usize,
}

pub fn print_sent(sent: &SentFrame<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(sent).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SOCKET", "PIXELS", "BYTES"])
                .add_row(vec![
                    sent.socket.display().to_string(),
                    sent.pixels.to_string(),
                    sent.bytes.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "sent {} pixels ({} bytes) to {}",
                sent.pixels,
                sent.bytes,
                sent.socket.display()
            );
        }
        OutputFormat::Raw => {
            println!("{}", sent.bytes);
        }
    }
}
