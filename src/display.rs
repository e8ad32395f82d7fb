//! Output Formatting and Display Management
//!
//! Renders a [`LicenseReport`] either as structured JSON or as colored terminal text.
//!
//! ### JSON Output
//! ```json
//! {
//!   "generatedAt": "2026-01-15T10:30:00Z",
//!   "applicationId": 374,
//!   "rule": { "total_max_install": 2, "max_install_per_category": { "desktop": 1, "laptop": 1, "mobile": 0 } },
//!   "users": [ { "userId": 1, "licenses": 2, "installs": { "desktop": 2, "laptop": 2, "mobile": 0 } } ],
//!   "totalUsers": 1,
//!   "totalInstalls": 4,
//!   "duplicatesRemoved": 1,
//!   "totalLicenses": 2
//! }
//! ```
//!
//! The per-user list is only included when requested.

use crate::calculator::UserAllocation;
use crate::models::{Category, LicenseRule};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseReport {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<u64>,
    pub rule: LicenseRule,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserAllocation>,
    pub total_users: usize,
    pub total_installs: u64,
    pub duplicates_removed: usize,
    pub rows_filtered: usize,
    pub total_licenses: u64,
}

#[derive(Debug, Clone)]
pub struct ReportDisplayManager {
    json_pretty: bool,
    color: bool,
}

impl Default for ReportDisplayManager {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl ReportDisplayManager {
    pub fn new(json_pretty: bool, color: bool) -> Self {
        Self { json_pretty, color }
    }

    pub fn render_json(&self, report: &LicenseReport) -> Result<String> {
        let rendered = if self.json_pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        rendered.context("Failed to serialize license report")
    }

    pub fn render_text(&self, report: &LicenseReport) -> String {
        colored::control::set_override(self.color);

        let mut out = String::new();
        out.push_str(&format!("{}\n", "License Requirement Report".bold()));
        out.push_str(&format!("{}\n", "=".repeat(40)));

        if let Some(app) = report.application_id {
            out.push_str(&format!("Application:       {}\n", app.to_string().cyan()));
        }
        out.push_str(&format!(
            "Rule:              {} installs per license ({})\n",
            report.rule.total_max_install,
            format_caps(&report.rule)
        ));
        out.push_str(&format!("Users:             {}\n", report.total_users));
        out.push_str(&format!("Distinct installs: {}\n", report.total_installs));
        if report.duplicates_removed > 0 {
            out.push_str(&format!(
                "Duplicates:        {}\n",
                report.duplicates_removed.to_string().yellow()
            ));
        }
        if report.rows_filtered > 0 {
            out.push_str(&format!("Other apps:        {}\n", report.rows_filtered));
        }

        if !report.users.is_empty() {
            out.push('\n');
            out.push_str(&format!(
                "{:>10}  {:>8}  {:>8}  {:>8}  {:>8}\n",
                "User", "Desktop", "Laptop", "Mobile", "Licenses"
            ));
            for user in &report.users {
                out.push_str(&format!(
                    "{:>10}  {:>8}  {:>8}  {:>8}  {:>8}\n",
                    user.user_id,
                    user.installs[Category::Desktop],
                    user.installs[Category::Laptop],
                    user.installs[Category::Mobile],
                    user.licenses
                ));
            }
        }

        out.push('\n');
        out.push_str(&format!(
            "{} {}\n",
            "Minimum licenses required:".bold(),
            report.total_licenses.to_string().green().bold()
        ));

        out
    }

    pub fn display(&self, report: &LicenseReport, json_output: bool) -> Result<()> {
        if json_output {
            println!("{}", self.render_json(report)?);
        } else {
            print!("{}", self.render_text(report));
        }
        Ok(())
    }
}

fn format_caps(rule: &LicenseRule) -> String {
    rule.max_install_per_category
        .iter()
        .map(|(category, cap)| format!("{} {}", category, cap))
        .collect::<Vec<_>>()
        .join(", ")
}
