//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::{Local, NaiveDate};
use miette::Result;
use std::io::Write;

use crate::cli::GlobalOpts;
use crate::core::Config;
use crate::entities::product::{find_product, Product};
use crate::store::HttpStore;

/// Effective configuration for this invocation, CLI flags applied last
pub fn load_config(global: &GlobalOpts) -> Config {
    Config::load().with_overrides(global.api_url.clone(), global.timeout)
}

/// HTTP client for the configured backend
pub fn open_store(config: &Config) -> Result<HttpStore> {
    HttpStore::from_config(config).map_err(|e| miette::miette!("{}", e))
}

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Look up a product by code or store key, with a helpful error
pub fn resolve_product<'a>(products: &'a [Product], reference: &str) -> Result<&'a Product> {
    find_product(products, reference).ok_or_else(|| {
        miette::miette!(
            "No product found matching '{}'. Use 'gatepass product list' to see product codes.",
            reference
        )
    })
}

/// Split a `CODE=QTY` item argument
pub fn parse_item_arg(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((code, qty)) if !code.trim().is_empty() => Ok((code.trim(), qty.trim())),
        _ => Err(miette::miette!(
            "Invalid item '{}'. Expected CODE=QTY, e.g. PRD-0001=4",
            arg
        )),
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Write rows as CSV to stdout
pub fn write_csv<I, R>(header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let stdout = std::io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    writer
        .write_record(header)
        .map_err(|e| miette::miette!("{}", e))?;
    for row in rows {
        let row: Vec<String> = row.into_iter().collect();
        writer
            .write_record(&row)
            .map_err(|e| miette::miette!("{}", e))?;
    }
    writer.flush().map_err(|e| miette::miette!("{}", e))?;
    Ok(())
}

/// Escape pipes so a value can sit inside a markdown table cell
pub fn escape_md(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Write a file, creating parent directories as needed
pub fn write_output_file(path: &std::path::Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| miette::miette!("{}", e))?;
        }
    }
    let mut file = std::fs::File::create(path)
        .map_err(|e| miette::miette!("Cannot write {}: {}", path.display(), e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| miette::miette!("Cannot write {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("पावरग्रिड सबस्टेशन", 6), "पाव...");
    }

    #[test]
    fn test_parse_item_arg() {
        assert_eq!(parse_item_arg("PRD-0001=4").unwrap(), ("PRD-0001", "4"));
        assert_eq!(parse_item_arg(" PRD-0001 = 4 ").unwrap(), ("PRD-0001", "4"));
        assert_eq!(parse_item_arg("PRD-0001=").unwrap(), ("PRD-0001", ""));
        assert!(parse_item_arg("PRD-0001").is_err());
        assert!(parse_item_arg("=4").is_err());
    }

    #[test]
    fn test_escape_md() {
        assert_eq!(escape_md("a|b"), "a\\|b");
        assert_eq!(escape_md("line\nbreak"), "line break");
    }

    #[test]
    fn test_write_output_file_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes/nested/qr.svg");
        write_output_file(&path, "<svg/>").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "<svg/>");
    }
}
