//! Server telemetry from `INFO`.
//!
//! Parses the `# Section` / `key:value` text returned by `INFO` and renders
//! byte counts and uptimes in human units.

use crate::client::FerriteClient;
use crate::error::Result;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Sections shown by the telemetry view, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoSection {
    Server,
    Memory,
    Clients,
    Stats,
    Keyspace,
    Persistence,
}

impl InfoSection {
    pub const ALL: [InfoSection; 6] = [
        Self::Server,
        Self::Memory,
        Self::Clients,
        Self::Stats,
        Self::Keyspace,
        Self::Persistence,
    ];

    /// Section name as passed to `INFO`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Memory => "memory",
            Self::Clients => "clients",
            Self::Stats => "stats",
            Self::Keyspace => "keyspace",
            Self::Persistence => "persistence",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Server => "Server",
            Self::Memory => "Memory",
            Self::Clients => "Clients",
            Self::Stats => "Stats",
            Self::Keyspace => "Keyspace",
            Self::Persistence => "Persistence",
        }
    }
}

impl std::str::FromStr for InfoSection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown info section: {s}. Expected one of: {}",
                    Self::ALL.map(|s| s.as_str()).join(", ")
                )
            })
    }
}

impl fmt::Display for InfoSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One `key:value` line of a section, with its display form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoField {
    pub key: String,
    pub value: String,
    pub display: String,
}

/// Collects the fields listed under `# <section>` (case-insensitive) up to
/// the next header.
pub fn parse_info_section(info: &str, section: &str) -> Vec<InfoField> {
    let mut fields = Vec::new();
    let mut in_section = false;

    for line in info.lines() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('#') {
            if in_section {
                break;
            }
            in_section = header.trim().eq_ignore_ascii_case(section);
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            let (key, value) = (key.trim(), value.trim());
            fields.push(InfoField {
                key: key.to_string(),
                value: value.to_string(),
                display: format_info_value(key, value),
            });
        }
    }

    fields
}

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Formats a field value for display.
///
/// Integer byte counts under keys mentioning `memory` are scaled to GB, MB or
/// KB; `uptime_in_seconds` becomes `Nd Nh`, `Nh Nm` or `Nm Ns`. Everything
/// else is returned as is.
pub fn format_info_value(key: &str, value: &str) -> String {
    if key.contains("memory") && !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(bytes) = value.parse::<u64>() {
            let bytes = bytes as f64;
            if bytes > GB {
                return format!("{:.2} GB", bytes / GB);
            }
            if bytes > MB {
                return format!("{:.2} MB", bytes / MB);
            }
            if bytes > KB {
                return format!("{:.2} KB", bytes / KB);
            }
        }
    }

    if key == "uptime_in_seconds" {
        if let Ok(secs) = value.parse::<u64>() {
            return format_uptime(secs);
        }
    }

    value.to_string()
}

fn format_uptime(secs: u64) -> String {
    if secs > 86_400 {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
    } else if secs > 3600 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

fn version_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"ferrite_version:([^\r\n]+)").ok())
        .as_ref()
}

/// Extracts the server version from `INFO server` text.
pub fn server_version(info: &str) -> String {
    version_regex()
        .and_then(|re| re.captures(info))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fetches and parses one section.
pub async fn fetch_section(
    client: &dyn FerriteClient,
    section: InfoSection,
) -> Result<Vec<InfoField>> {
    let info = client.info(Some(section.as_str())).await?;
    Ok(parse_info_section(&info, section.as_str()))
}

/// Renders sections as an aligned text report.
pub fn render_report(sections: &[(InfoSection, Vec<InfoField>)]) -> String {
    let width = sections
        .iter()
        .flat_map(|(_, fields)| fields.iter().map(|f| f.key.len()))
        .max()
        .unwrap_or(0);

    sections
        .iter()
        .map(|(section, fields)| {
            let body = fields
                .iter()
                .map(|f| format!("  {:<width$}  {}", f.key, f.display))
                .collect::<Vec<_>>()
                .join("\n");
            if body.is_empty() {
                format!("{section}:")
            } else {
                format!("{section}:\n{body}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
