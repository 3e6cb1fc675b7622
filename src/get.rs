//! Record lookup by identifier.
//!
//! Used by `pubcat get` (summary or JSON-LD) and `pubcat cite`.

use anyhow::{bail, Context, Result};

use pubcat_core::browse::card::record_categories;
use pubcat_core::linked_data::report_json_ld;
use pubcat_core::models::CanonicalRecord;
use pubcat_core::search::with_path_prefix;
use pubcat_core::text::strip_markup;

use crate::config::Config;
use crate::index_cmd::read_records;

/// Accept `987` or `zenodo-987`.
pub fn parse_record_id(id: &str) -> Result<u64> {
    let id = id.trim();
    let digits = id.strip_prefix("zenodo-").unwrap_or(id);
    digits
        .parse()
        .with_context(|| format!("invalid record id '{}'. Use a Zenodo id like 987 or zenodo-987.", id))
}

/// Find a record in the configured records file.
pub fn get_record(config: &Config, id: &str) -> Result<CanonicalRecord> {
    let zenodo_id = parse_record_id(id)?;
    let records = read_records(&config.paths.records)?;
    match records.into_iter().find(|r| r.zenodo_id == zenodo_id) {
        Some(record) => Ok(record),
        None => bail!("record not found: zenodo-{}", zenodo_id),
    }
}

/// Absolute URL of the record's report page when `site.base_url` is set,
/// otherwise the prefixed site path.
pub fn page_url(config: &Config, record: &CanonicalRecord) -> String {
    let path = with_path_prefix(&config.site.path_prefix, &record.report_url());
    match &config.site.base_url {
        Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
        None => path,
    }
}

/// Run `pubcat get`.
pub fn run_get(config: &Config, id: &str, jsonld: bool) -> Result<()> {
    let record = get_record(config, id)?;

    if jsonld {
        let Some(doc) = report_json_ld(&record) else {
            bail!(
                "{} is a '{}' record; linked data is only produced for Zenodo reports",
                record.document_id(),
                record.record_type
            );
        };
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!("--- Record ---");
    println!("id:           {}", record.document_id());
    println!(
        "title:        {}",
        if record.title.is_empty() { "(untitled)" } else { record.title.as_str() }
    );
    println!("type:         {}", record.record_type);
    if !record.published.is_empty() {
        println!("published:    {}", record.published);
    }
    if !record.creators.is_empty() {
        println!("creators:     {}", record.creators.join("; "));
    }
    if !record.doi.is_empty() {
        println!("doi:          {}", record.doi);
    }
    println!("page:         {}", page_url(config, &record));
    if !record.zenodo_html.is_empty() {
        println!("zenodo:       {}", record.zenodo_html);
    }
    let categories = record_categories(&record);
    if !categories.is_empty() {
        println!("categories:   {}", categories.join(", "));
    }
    if record.is_annual_report() {
        println!("series:       annual report");
    }
    if let Some(license) = &record.license {
        let name = if license.title.is_empty() { &license.id } else { &license.title };
        println!("license:      {}", name);
    }
    if !record.funders.is_empty() {
        let names: Vec<&str> = record
            .funders
            .iter()
            .map(|f| if f.name.is_empty() { f.id.as_str() } else { f.name.as_str() })
            .collect();
        println!("funders:      {}", names.join("; "));
    }
    println!();

    let description = strip_markup(&record.description);
    if !description.is_empty() {
        println!("--- Description ---");
        println!("{}", description);
        println!();
    }

    if !record.files.is_empty() {
        println!("--- Files ({}) ---", record.files.len());
        for file in &record.files {
            println!("{}  {}", file.key, file.url);
        }
        println!();
    }

    Ok(())
}
