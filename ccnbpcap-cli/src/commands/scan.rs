use super::read_input;
use anyhow::{Context, Result};
use ccnbpcap_core::content::{parse_content_object, RecordKind};
use ccnbpcap_core::scanner::{scan_with_stats, ScanStats};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

/// Bytes of content shown in a record preview
const PREVIEW_LEN: usize = 16;

/// One record as reported by `scan`
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordSummary {
    pub offset: usize,
    pub size: usize,
    pub kind: String,
    /// Name component count, ContentObjects only
    pub components: Option<usize>,
    /// Content value length, ContentObjects only
    pub content_len: Option<usize>,
    /// Hex of the first bytes of the content value
    pub preview: Option<String>,
}

/// List the records of `input`
///
/// Records found before a split error are still reported; the returned
/// stats carry the error.
pub fn execute(input: &str, output: Option<&str>, stats_only: bool) -> Result<ScanStats> {
    info!("Scanning: {}", input);

    let data = read_input(input)?;

    info!("Input size: {} bytes", data.len());

    let (records, stats) = scan_with_stats(&data);

    // Print statistics
    println!("\n=== Scan Results ===");
    println!("Bytes scanned:     {} bytes", stats.bytes_scanned);
    println!("Records found:     {}", stats.records_found);
    println!("Bytes in records:  {} bytes", stats.bytes_in_records);
    println!("Coverage:          {:.2}%", stats.coverage());
    if let Some(e) = &stats.error {
        println!("Stopped ({}):  {}", e.kind(), e);
    }
    println!();

    if stats_only {
        return Ok(stats);
    }

    let summaries: Vec<RecordSummary> = records
        .iter()
        .map(|record| {
            let bytes = record.bytes(&data);
            let kind = RecordKind::of(bytes);
            let parsed = kind
                .is_content_object()
                .then(|| parse_content_object(bytes).ok())
                .flatten();

            RecordSummary {
                offset: record.offset,
                size: record.size,
                kind: kind.to_string(),
                components: parsed.as_ref().map(|p| p.components.len()),
                content_len: parsed.as_ref().map(|p| p.value.len()),
                preview: parsed.as_ref().map(|p| {
                    let value = &bytes[p.value.clone()];
                    hex::encode(&value[..value.len().min(PREVIEW_LEN)])
                }),
            }
        })
        .collect();

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&summaries)
            .with_context(|| "Failed to serialize record list")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Record list written to: {}", output_path);
    } else {
        println!("=== Records ===");
        for record in &summaries {
            print!("{} @ offset {}: {} bytes", record.kind, record.offset, record.size);
            if let (Some(components), Some(len)) = (record.components, record.content_len) {
                print!(", {} name components, {} content bytes", components, len);
            }
            println!();
        }
    }

    Ok(stats)
}
