use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use records_core::{parse_after_bound, ScanConfig, ScanMode, StatInfo};
use records_fhir::{
    extract_all_values, list_categories, list_conditions, list_medications, list_prefixes,
    list_procedures, list_vitals, observation_files,
};
use tracing_subscriber::EnvFilter;

mod print;

#[derive(Parser, Debug)]
#[command(
    name = "records-cli",
    about = "Explore an exported clinical-records directory.",
    after_help = "Example: records-cli --stat Weight --after 2023-01-01"
)]
struct Args {
    /// Directory holding the exported `*.json` records.
    #[arg(long, default_value = "export/apple_health_export/clinical-records")]
    dir: PathBuf,

    /// JSON file with scan settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop at the first unreadable file instead of skipping it.
    #[arg(long)]
    strict: bool,

    /// Increase log detail (-v for debug, -vv for trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print category labels ranked by weight.
    #[arg(long)]
    categories: bool,

    /// With --categories, count only the first label of each file.
    #[arg(long, requires = "categories")]
    only_first: bool,

    /// With --categories, scan only files starting with this resource kind.
    #[arg(long, requires = "categories")]
    prefix: Option<String>,

    /// Count files per resource kind.
    #[arg(short, long)]
    document_types: bool,

    /// List codes found in the default category.
    #[arg(short, long)]
    list_vitals: bool,

    /// Print one code from the default category, e.g. "Blood Pressure".
    #[arg(short, long)]
    stat: Option<String>,

    /// `category#code` to print a series, or a bare category to list its codes.
    #[arg(short, long)]
    generic: Option<String>,

    /// Only keep values strictly later than this date (YYYY-MM-DD).
    #[arg(long)]
    after: Option<String>,

    /// Print rows as CSV.
    #[arg(long)]
    csv_format: bool,

    /// Print conditions.
    #[arg(short, long)]
    conditions: bool,

    /// Print allergies.
    #[arg(short, long)]
    allergies: bool,

    /// Print procedures.
    #[arg(short, long)]
    procedures: bool,

    /// Print active medications.
    #[arg(short, long)]
    medicines: bool,

    /// Print all medications, including completed and stopped ones.
    #[arg(long)]
    medicines_all: bool,
}

impl Args {
    fn has_action(&self) -> bool {
        self.categories
            || self.document_types
            || self.list_vitals
            || self.stat.is_some()
            || self.generic.is_some()
            || self.conditions
            || self.allergies
            || self.procedures
            || self.medicines
            || self.medicines_all
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.has_action() {
        eprintln!(
            "Select at least one of --categories, --document-types, --list-vitals, --stat, \
             --generic, --conditions, --allergies, --procedures, --medicines, --medicines-all."
        );
        return Ok(());
    }

    let mut config = load_config(args.config.as_deref())?;
    if args.strict {
        config.mode = ScanMode::Strict;
    }
    let after = args
        .after
        .as_deref()
        .map(parse_after_bound)
        .transpose()
        .context("invalid --after date")?;
    let dir = args.dir.as_path();
    let csv = args.csv_format;

    if args.conditions {
        let listing = list_conditions(dir, "Condition", &config)?;
        print::listing(&listing, csv)?;
    }

    if args.allergies {
        let listing = list_conditions(dir, "AllergyIntolerance", &config)?;
        print::listing(&listing, csv)?;
    }

    if args.procedures {
        let listing = list_procedures(dir, &config)?;
        print::listing(&listing, csv)?;
    }

    if args.medicines || args.medicines_all {
        let listing = list_medications(dir, args.medicines_all, &config)?;
        print::listing(&listing, csv)?;
    }

    if let Some(code) = &args.stat {
        let query = StatInfo::new(config.default_category.clone(), code.clone());
        print_stat(dir, &query, after, &config, csv)?;
    }

    if args.list_vitals {
        print_codes(dir, &config.default_category, &config)?;
    }

    if let Some(generic) = &args.generic {
        if generic.contains('#') {
            let query: StatInfo = generic.parse()?;
            print_stat(dir, &query, after, &config, csv)?;
        } else {
            print_codes(dir, generic, &config)?;
        }
    }

    if args.categories {
        let report = list_categories(dir, args.only_first, args.prefix.as_deref(), &config)?;
        print::categories(dir, &report);
    }

    if args.document_types {
        let prefixes = list_prefixes(dir)?;
        print::prefixes(dir, &prefixes);
    }

    Ok(())
}

fn print_stat(
    dir: &Path,
    query: &StatInfo,
    after: Option<chrono::DateTime<chrono::Utc>>,
    config: &ScanConfig,
    csv: bool,
) -> anyhow::Result<()> {
    let files = observation_files(dir, config)?;
    let series = extract_all_values(&files, query, after, config)?;
    print::series(&series, after, csv)
}

fn print_codes(dir: &Path, category: &str, config: &ScanConfig) -> anyhow::Result<()> {
    let files = observation_files(dir, config)?;
    let report = list_vitals(&files, category, config)?;
    print::codes(&report);
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ScanConfig> {
    let Some(path) = path else {
        return Ok(ScanConfig::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid config file {}", path.display()))
}

/// Log level used when `RUST_LOG` is unset.
fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

fn init_logging(verbosity: u8) {
    let level = default_level(verbosity);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
