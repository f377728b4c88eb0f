//! Console and CSV rendering of scan results.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use records_core::Tally;
use records_fhir::{CategoryReport, Listing, Series, SkippedFile, VitalsReport};
use serde::Serialize;

pub fn listing<T: Serialize>(listing: &Listing<T>, csv_format: bool) -> anyhow::Result<()> {
    let mut writer = row_writer(csv_format);
    for record in &listing.records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    skipped(&listing.skipped);
    Ok(())
}

pub fn series(series: &Series, after: Option<DateTime<Utc>>, csv_format: bool) -> anyhow::Result<()> {
    skipped(&series.skipped);

    if series.observations.is_empty() {
        println!("No data was found for stat {}", series.query.code);
        if let Some(after) = after {
            println!("In the range of values after {}", after.format("%Y-%m-%d"));
        }
        println!("You can use --list-vitals or --generic <category> to see what stats are in your data.");
        return Ok(());
    }

    if !series.is_homogeneous() {
        tracing::warn!(query = %series.query, "Observations differ in their components");
    }

    if csv_format {
        let mut writer = row_writer(true);
        for observation in &series.observations {
            let mut fields = vec![observation.name.clone(), observation.date.clone()];
            for value in &observation.data {
                fields.push(value.value.to_string());
                fields.push(value.unit.clone());
                fields.push(value.name.clone());
            }
            writer.write_record(&fields)?;
        }
        writer.flush()?;
        return Ok(());
    }

    for observation in &series.observations {
        let values: Vec<String> = observation
            .data
            .iter()
            .map(|value| format!(" {:6.1} {}", value.value, value.unit))
            .collect();
        println!("{:10}: {} - {}", observation.name, observation.date, values.join(","));
    }
    Ok(())
}

pub fn codes(report: &VitalsReport) {
    println!(
        "Files with a category of '{}' contain these codes:",
        report.category
    );
    for code in report.codes.ranked() {
        println!("{:6} {code}", report.codes.get(&code));
    }
    skipped(&report.skipped);
}

pub fn categories(dir: &Path, report: &CategoryReport) {
    println!("Categories found in {} files in {}", report.file_count, dir.display());
    for (index, label) in report.ranked.iter().enumerate() {
        println!("{index:3}: {label:.<32}: {:>6}", weight(report.weights.get(label)));
    }
    println!("{:>45}", "======");
    println!(
        "     Total categories found..........: {:>6}",
        weight(report.weights.total())
    );
    skipped(&report.skipped);
}

pub fn prefixes(dir: &Path, prefixes: &Tally) {
    println!("File prefixes found in {}", dir.display());
    for (prefix, count) in prefixes.iter() {
        println!("{count:6} {prefix}");
    }
}

fn weight(value: f64) -> String {
    let value = (value * 10.0).round() / 10.0;
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn skipped(files: &[SkippedFile]) {
    if !files.is_empty() {
        eprintln!(
            "{} file(s) could not be read and were skipped; rerun with -v for details.",
            files.len()
        );
    }
}

/// Comma-separated with every field quoted, or tab-separated for the console.
fn row_writer(csv_format: bool) -> csv::Writer<io::Stdout> {
    let mut builder = csv::WriterBuilder::new();
    builder.has_headers(false);
    if csv_format {
        builder.quote_style(csv::QuoteStyle::Always);
    } else {
        builder.delimiter(b'\t').quote_style(csv::QuoteStyle::Never);
    }
    builder.from_writer(io::stdout())
}
