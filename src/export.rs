//! Rendering of listing pages.
//!
//! Provides conversion of a result page to:
//! - JSON - the `{data, total, page, pageSize}` envelope plus export metadata
//! - Markdown - a header and an escaped summary table
//! - Plain Text - simple, copy-paste friendly blocks

use chrono::Utc;
use serde::Serialize;

use crate::model::{InfraRecord, Organization};
use crate::search::page::Page;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// JSON for programmatic consumption
    #[default]
    Json,
    /// Markdown table
    Markdown,
    /// Plain text for simple copy-paste
    #[value(name = "text")]
    PlainText,
}

impl ExportFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Markdown => "Markdown",
            Self::PlainText => "Plain Text",
        }
    }
}

/// Options for export customization
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Free-text query shown in the header
    pub query: Option<String>,
    /// Maximum cell length in Markdown/text output (0 = unlimited)
    pub max_cell_len: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            query: None,
            max_cell_len: 80,
        }
    }
}

/// A record that can be summarized as a titled row of labelled cells.
pub trait ExportRow: Serialize {
    fn row_id(&self) -> &str;
    fn title(&self) -> &str;
    fn cells(&self) -> Vec<(&'static str, &str)>;
}

impl ExportRow for Organization {
    fn row_id(&self) -> &str {
        &self.org_id
    }

    fn title(&self) -> &str {
        &self.org_name
    }

    fn cells(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Type", self.functional_type.as_str()),
            ("Sizing", self.sizing.as_str()),
            ("HQ City", self.hq_city.as_str()),
            ("HQ Country", self.hq_country.as_str()),
            ("Region", self.hq_sales_region.as_str()),
            ("Services", self.services.as_str()),
        ]
    }
}

impl ExportRow for InfraRecord {
    fn row_id(&self) -> &str {
        &self.infra_id
    }

    fn title(&self) -> &str {
        &self.infra_name
    }

    fn cells(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Parent", self.parent_org.as_str()),
            ("Type", self.infra_type.as_str()),
            ("License", self.license.as_str()),
            ("Pricing", self.pricing.as_str()),
            ("Released", self.release_date.as_str()),
        ]
    }
}

/// Render a listing page in the requested format
pub fn export_page<T: ExportRow>(
    page: &Page<&T>,
    format: ExportFormat,
    options: &ExportOptions,
) -> String {
    match format {
        ExportFormat::Json => export_json(page, options),
        ExportFormat::Markdown => export_markdown(page, options),
        ExportFormat::PlainText => export_plain_text(page, options),
    }
}

/// Escape special Markdown characters to prevent formatting issues or injection.
fn escape_markdown(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace('*', "\\*")
        .replace('_', "\\_")
        .replace('[', "\\[")
        .replace(']', "\\]")
        .replace('<', "\\<")
        .replace('>', "\\>")
        .replace('`', "\\`")
}

fn showing_line<T>(page: &Page<T>) -> String {
    format!(
        "{} of {} (page {}, {} per page)",
        page.data.len(),
        page.total,
        page.page,
        page.page_size
    )
}

fn export_markdown<T: ExportRow>(page: &Page<&T>, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("# Search Results\n\n");

    if let Some(query) = options.query.as_deref().filter(|q| !q.trim().is_empty()) {
        output.push_str(&format!("**Query:** `{}`\n\n", query.replace('`', "")));
    }

    output.push_str(&format!(
        "**Results:** {} | **Exported:** {}\n\n",
        showing_line(page),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let Some(first) = page.data.first() else {
        output.push_str("_No results._\n");
        return output;
    };

    let labels: Vec<&str> = first.cells().iter().map(|(label, _)| *label).collect();
    output.push_str("| # | ID | Name |");
    for label in &labels {
        output.push_str(&format!(" {label} |"));
    }
    output.push('\n');
    output.push_str(&"|---".repeat(labels.len() + 3));
    output.push_str("|\n");

    let offset = (page.page - 1).saturating_mul(page.page_size);
    for (i, row) in page.data.iter().enumerate() {
        output.push_str(&format!(
            "| {} | {} | {} |",
            offset + i + 1,
            escape_markdown(row.row_id()),
            escape_markdown(&truncate_text(row.title(), options.max_cell_len))
        ));
        for (_, value) in row.cells() {
            output.push_str(&format!(
                " {} |",
                escape_markdown(&truncate_text(value, options.max_cell_len))
            ));
        }
        output.push('\n');
    }

    output
}

fn export_json<T: ExportRow>(page: &Page<&T>, options: &ExportOptions) -> String {
    let export_data = serde_json::json!({
        "query": options.query,
        "exportedAt": Utc::now().to_rfc3339(),
        "data": page.data,
        "total": page.total,
        "page": page.page,
        "pageSize": page.page_size,
    });

    serde_json::to_string_pretty(&export_data).unwrap_or_else(|_| "{}".to_string())
}

fn export_plain_text<T: ExportRow>(page: &Page<&T>, options: &ExportOptions) -> String {
    let mut output = String::new();

    output.push_str("SEARCH RESULTS\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');

    if let Some(query) = options.query.as_deref().filter(|q| !q.trim().is_empty()) {
        output.push_str(&format!("Query: {query}\n"));
    }

    output.push_str(&format!(
        "Results: {} | Exported: {}\n",
        showing_line(page),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let offset = (page.page - 1).saturating_mul(page.page_size);
    for (i, row) in page.data.iter().enumerate() {
        output.push_str(&format!("[{}] {}\n", offset + i + 1, row.title()));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("ID: {}\n", row.row_id()));
        for (label, value) in row.cells() {
            if value.trim().is_empty() {
                continue;
            }
            output.push_str(&format!(
                "{label}: {}\n",
                truncate_text(value, options.max_cell_len)
            ));
        }
        output.push('\n');
    }

    output
}

/// Truncate text to max length (in characters), adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return text.to_string();
    }

    let char_count = text.chars().count();
    if char_count <= max_len {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::page::paginate;

    fn sample_org() -> Organization {
        Organization {
            id: 1,
            org_id: "o1".to_string(),
            org_name: "Pixel_Works [Studio]".to_string(),
            functional_type: "Post House".to_string(),
            sizing: "51-100".to_string(),
            hq_city: "London".to_string(),
            hq_country: "United Kingdom".to_string(),
            hq_sales_region: "EMEA".to_string(),
            services: "VFX|Color".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_export_format_name() {
        assert_eq!(ExportFormat::Json.name(), "JSON");
        assert_eq!(ExportFormat::PlainText.name(), "Plain Text");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 100), "short");
        assert_eq!(truncate_text("this is long text", 10), "this is...");
        assert_eq!(truncate_text("any", 0), "any");
    }

    #[test]
    fn test_export_json_keeps_listing_envelope() {
        let org = sample_org();
        let page = paginate(vec![&org], 1, 25);
        let output = export_page(&page, ExportFormat::Json, &ExportOptions::default());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["total"], 1);
        assert_eq!(value["pageSize"], 25);
        assert_eq!(value["data"][0]["ORG_ID"], "o1");
        assert!(value["exportedAt"].is_string());
    }

    #[test]
    fn test_export_markdown_escapes_cells() {
        let org = sample_org();
        let page = paginate(vec![&org], 1, 25);
        let options = ExportOptions {
            query: Some("pixel".to_string()),
            ..ExportOptions::default()
        };
        let output = export_page(&page, ExportFormat::Markdown, &options);

        assert!(output.contains("# Search Results"));
        assert!(output.contains("**Query:** `pixel`"));
        assert!(output.contains("Pixel\\_Works \\[Studio\\]"));
        assert!(output.contains("VFX\\|Color"));
        assert!(output.contains("| 1 | o1 |"));
    }

    #[test]
    fn test_export_markdown_empty_page() {
        let page: Page<&Organization> = paginate(Vec::new(), 1, 25);
        let output = export_page(&page, ExportFormat::Markdown, &ExportOptions::default());
        assert!(output.contains("_No results._"));
        assert!(output.contains("0 of 0"));
    }

    #[test]
    fn test_export_plain_text_numbers_across_pages() {
        let orgs: Vec<Organization> = (0..3)
            .map(|i| Organization {
                org_id: format!("o{i}"),
                org_name: format!("Org {i}"),
                ..Default::default()
            })
            .collect();
        let page = paginate(orgs.iter().collect(), 2, 2);
        let output = export_page(&page, ExportFormat::PlainText, &ExportOptions::default());

        assert!(output.contains("SEARCH RESULTS"));
        assert!(output.contains("[3] Org 2"));
        assert!(output.contains("1 of 3 (page 2, 2 per page)"));
        // empty cells are omitted
        assert!(!output.contains("Sizing:"));
    }

    #[test]
    fn test_infra_rows_export() {
        let infra = InfraRecord {
            infra_id: "i1".to_string(),
            infra_name: "Maya".to_string(),
            pricing: "$10,001+".to_string(),
            ..Default::default()
        };
        let page = paginate(vec![&infra], 1, 10);
        let output = export_page(&page, ExportFormat::PlainText, &ExportOptions::default());
        assert!(output.contains("[1] Maya"));
        assert!(output.contains("Pricing: $10,001+"));
    }
}
