#![forbid(unsafe_code)]
//! # Interview Report CLI
//!
//! Command-line front end for the `interview_report` crate. Loads the phrase
//! table (and optionally the example-phrase table) once and prints or exports
//! one report table.
//!
//! ## Example
//! ```bash
//! cargo run --release -- data/phrases.csv --report sentiment --export-format csv
//! ```
//!
//! See `--help` for all available options.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::error;

use interview_report::{
    Basis, Dataset, ExportFormat, Metric, Report, ReportOptions, STUDY_INTERVIEWS, Taxonomy, Z_95,
    print_skipped_rows, run_report, save_table, write_table,
};

/// Exit status when a source cannot be loaded.
const EXIT_STARTUP: i32 = 2;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Phrase table (CSV with num_entrevista, frase, Tipo, categorias1, categorias2, sent_robertuito)
    phrases: PathBuf,

    /// Optional example-phrase table (CSV with tipo, frase)
    #[arg(long)]
    examples: Option<PathBuf>,

    /// Which table to produce
    #[arg(long, value_enum, default_value = "categories")]
    report: Report,

    /// Topic taxonomy for categories and phrases reports
    #[arg(long, value_enum, default_value = "questions")]
    taxonomy: Taxonomy,

    /// Emit the categories table in long form (one row per category and metric)
    #[arg(long, default_value_t = false)]
    long: bool,

    /// Metrics to keep in long form, comma separated
    #[arg(long, value_enum, value_delimiter = ',', num_args = 0.., default_values_t = vec![Metric::PhraseCount, Metric::PatientCount])]
    metrics: Vec<Metric>,

    /// Metric to sort categories by (descending)
    #[arg(long, value_enum, default_value = "phrase-count")]
    sort_by: Metric,

    /// Count the sentiment distribution per phrase or per interview mean
    #[arg(long, value_enum, default_value = "phrases")]
    basis: Basis,

    /// Topic code to list phrases for (phrases report)
    #[arg(long, required_if_eq("report", "phrases"))]
    category: Option<i64>,

    /// Example kind to list (examples report); all kinds if omitted
    #[arg(long)]
    kind: Option<String>,

    /// Number of interviews in the study
    #[arg(long, default_value_t = STUDY_INTERVIEWS)]
    total_interviews: u64,

    /// Gaussian quantile for confidence half-widths
    #[arg(long, default_value_t = Z_95)]
    z: f64,

    /// Output format (txt prints to stdout; csv, tsv, json write a file)
    #[arg(long, value_enum, default_value = "txt")]
    export_format: ExportFormat,

    /// Directory for exported files
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl Cli {
    fn options(&self) -> ReportOptions {
        ReportOptions {
            report: self.report,
            taxonomy: self.taxonomy,
            metrics: self.metrics.clone(),
            long_form: self.long,
            sort_by: self.sort_by,
            basis: self.basis,
            category: self.category,
            kind: self.kind.clone(),
            total_interviews: self.total_interviews,
            z: self.z,
            export_format: self.export_format,
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let dataset = match Dataset::load(&cli.phrases, cli.examples.as_deref()) {
        Ok(d) => d,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(if e.is_startup() { EXIT_STARTUP } else { 1 });
        }
    };
    if !dataset.skipped.is_empty() {
        print_skipped_rows(&dataset.skipped);
    }

    let options = cli.options();
    let result = run_report(&dataset, &options).and_then(|table| match options.export_format {
        ExportFormat::Txt => write_table(&table, ExportFormat::Txt, std::io::stdout().lock()),
        format => save_table(&table, format, &cli.out_dir).map(|path| {
            println!("{}", path.display());
        }),
    });
    if let Err(e) = result {
        error!("Error: {}", e);
        process::exit(1);
    }
}
