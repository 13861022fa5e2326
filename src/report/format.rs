// src/report/format.rs
// =============================================================================
// CSV encodings.
//
// Report:     url,status,state,parent,failureDetails
// Links file: url,parent
// =============================================================================

use csv::{ReaderBuilder, Writer};
use std::io::{Read, Write};

use crate::model::{LinkRecord, ValidationResult};

pub const REPORT_HEADER: [&str; 5] = ["url", "status", "state", "parent", "failureDetails"];
pub const LINKS_HEADER: [&str; 2] = ["url", "parent"];

/// Writes the header and one row per result. Output depends only on the input.
pub fn write_report_rows<'a, W, I>(writer: W, results: I) -> csv::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ValidationResult>,
{
    let mut out = Writer::from_writer(writer);
    out.write_record(REPORT_HEADER)?;

    for result in results {
        let details = result
            .failure_details
            .as_ref()
            .map(|d| d.to_json())
            .unwrap_or_default();
        let state = result.state.to_string();
        out.write_record([
            result.url.as_str(),
            result.status.report_value().as_str(),
            state.as_str(),
            result.parent.as_str(),
            details.as_str(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

pub fn write_links<W: Write>(writer: W, records: &[LinkRecord]) -> csv::Result<()> {
    let mut out = Writer::from_writer(writer);
    out.write_record(LINKS_HEADER)?;
    for record in records {
        out.write_record([record.url.as_str(), record.parent.as_str()])?;
    }
    out.flush()?;
    Ok(())
}

/// Reads a links file. The header row is skipped; a missing parent column
/// yields an empty parent and blank URLs are ignored.
pub fn read_links<R: Read>(reader: R) -> csv::Result<Vec<LinkRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let url = row.get(0).unwrap_or_default();
        if url.is_empty() {
            continue;
        }
        records.push(LinkRecord::new(url, row.get(1).unwrap_or_default()));
    }
    Ok(records)
}
