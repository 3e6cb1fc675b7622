//! `pubcat cite`: offline citation for one record.

use anyhow::Result;
use chrono::Utc;

use pubcat_core::citation::{csl_json, fallback_citation, CitationSource, CitationStyle};

use crate::config::Config;
use crate::get::{get_record, page_url};

/// Run `pubcat cite`.
pub fn run_cite(config: &Config, id: &str, style: &str, csl: bool) -> Result<()> {
    let record = get_record(config, id)?;
    let url = if record.zenodo_html.is_empty() {
        page_url(config, &record)
    } else {
        record.zenodo_html.clone()
    };
    let source = CitationSource::from_record(&record, &config.citation.publisher, &url);

    if csl {
        println!("{}", serde_json::to_string_pretty(&csl_json(&source))?);
        return Ok(());
    }

    let style = CitationStyle::parse(style);
    println!("{}", fallback_citation(&source, style, Utc::now().date_naive()));
    Ok(())
}
