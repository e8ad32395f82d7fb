#![allow(dead_code)]

use anyhow::Result;
use flex_license::{Category, DemandSummary, LicenseRule};
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADER: &str = "ComputerID,UserID,ApplicationID,ComputerType";

/// Total cap 2, one Desktop and one Laptop per license, no Mobile.
pub fn default_rule() -> LicenseRule {
    LicenseRule::new(2, [(Category::Desktop, 1), (Category::Laptop, 1)])
}

pub fn summary(user_id: u64, desktop: u32, laptop: u32, mobile: u32) -> DemandSummary {
    DemandSummary::new(
        user_id,
        [
            (Category::Desktop, desktop),
            (Category::Laptop, laptop),
            (Category::Mobile, mobile),
        ]
        .into_iter()
        .collect(),
    )
}

pub fn create_test_csv(dir: &Path, filename: &str, rows: &[&str]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    let mut content = String::from(HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

pub fn create_rule_file(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("rule.toml");
    fs::write(
        &path,
        "total_max_install = 2\n\n[max_install_per_category]\ndesktop = 1\nlaptop = 1\n",
    )?;
    Ok(path)
}
