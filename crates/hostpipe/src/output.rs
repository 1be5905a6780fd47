use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use hostpipe_launcher::ResolvedHost;
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

#[derive(Serialize)]
struct MessageOutput<'a> {
    host: &'a str,
    index: usize,
    size: usize,
    message: serde_json::Value,
    timestamp: String,
}

/// Print one message received from `host`.
pub fn print_message(payload: &[u8], index: usize, host: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                host,
                index,
                size: payload.len(),
                message: payload_value(payload),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "HOST", "SIZE", "MESSAGE"])
                .add_row(vec![
                    index.to_string(),
                    host.to_string(),
                    payload.len().to_string(),
                    payload_preview(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{index} host={host} size={} message={}",
                payload.len(),
                payload_preview(payload)
            );
        }
        OutputFormat::Raw => {
            print_raw(payload);
            print_raw(b"\n");
        }
    }
}

#[derive(Serialize)]
struct ManifestOutput<'a> {
    name: &'a str,
    description: &'a str,
    manifest: String,
    executable: String,
    allowed_origins: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    origin: Option<&'a str>,
}

/// Print a resolved manifest. `origin` is the origin it was checked against, if any.
pub fn print_manifest(resolved: &ResolvedHost, origin: Option<&str>, format: OutputFormat) {
    let manifest = &resolved.manifest;
    let out = ManifestOutput {
        name: &manifest.name,
        description: &manifest.description,
        manifest: resolved.manifest_path.display().to_string(),
        executable: resolved.executable.display().to_string(),
        allowed_origins: &manifest.allowed_origins,
        origin,
    };

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["name", out.name])
                .add_row(vec!["description", out.description])
                .add_row(vec!["manifest", out.manifest.as_str()])
                .add_row(vec!["executable", out.executable.as_str()])
                .add_row(vec!["allowed_origins".to_string(), out.allowed_origins.join("\n")]);
            if let Some(origin) = origin {
                table.add_row(vec!["origin", origin]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "name={} executable={} manifest={} allowed_origins=[{}]",
                out.name,
                out.executable,
                out.manifest,
                out.allowed_origins.join(", ")
            );
        }
        OutputFormat::Raw => {
            println!("{}", out.executable);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Messages are JSON by convention; anything else is shown as a string.
fn payload_value(payload: &[u8]) -> serde_json::Value {
    serde_json::from_slice(payload)
        .unwrap_or_else(|_| serde_json::Value::String(payload_preview(payload)))
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_payloads_are_embedded_as_values() {
        assert_eq!(payload_value(br#"{"a":1}"#), serde_json::json!({"a": 1}));
    }

    #[test]
    fn other_payloads_fall_back_to_strings() {
        assert_eq!(payload_value(b"not json"), serde_json::json!("not json"));
        assert_eq!(
            payload_value(&[0xff, 0xfe]),
            serde_json::json!("<binary 2 bytes>")
        );
    }
}
