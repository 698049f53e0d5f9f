//! Output formatting for check reports and type lookups.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;

use structurebot_lib::time::format_remaining;
use structurebot_lib::{Finding, StructureStatus, Type};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Result of a `check` run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub corporation: String,
    pub checked_at: DateTime<Utc>,
    pub structures: Vec<StructureStatus>,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} structures for {} as of {}:",
            self.structures.len(),
            self.corporation,
            self.checked_at.format("%Y-%m-%d %H:%M UTC")
        );

        for status in &self.structures {
            let fuel = match status.fuel_expires {
                Some(expires) => format_remaining(expires - self.checked_at),
                None => "no fuel".to_string(),
            };
            let core = if status.has_core { "core" } else { "no core" };
            let _ = writeln!(
                out,
                "- {} ({}): {} blocks/h, {}, {}",
                status.name, status.type_name, status.fuel_rate, fuel, core
            );
        }

        if self.findings.is_empty() {
            out.push_str("\nNo issues found.\n");
        } else {
            let _ = writeln!(out, "\nFindings ({}):", self.findings.len());
            for finding in &self.findings {
                let _ = writeln!(out, "- {finding}");
            }
        }
        out
    }

    /// One message per finding, for the notification channel.
    pub fn messages(&self) -> Vec<String> {
        self.findings.iter().map(ToString::to_string).collect()
    }
}

/// Render a resolved type.
pub fn render_type(ty: &Type, format: OutputFormat) -> anyhow::Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(ty)?);
    }

    let optional = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", ty.name, ty.type_id);
    if let Some(group_id) = ty.group_id {
        let _ = writeln!(out, "  group:                 {group_id}");
    }
    let _ = writeln!(
        out,
        "  service fuel per hour: {}",
        optional(ty.attributes.service_fuel_per_hour)
    );
    let _ = writeln!(
        out,
        "  service fuel bonus:    {}",
        optional(ty.attributes.service_fuel_bonus)
    );
    let _ = writeln!(
        out,
        "  base fuel per hour:    {}",
        optional(ty.attributes.base_fuel_per_hour)
    );
    Ok(out)
}
