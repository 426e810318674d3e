use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use coord_table::export;
use coord_table::input::read_input_file;
use coord_table::{BatchReport, MatchOrder, PartialMapping, Session, SrsRecord};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "csv2crs",
    version,
    about = "Convert point tables between coordinate reference systems"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Transform every point of a CSV table into another system.
    Convert(ConvertArgs),
    /// Re-export a CSV table in the normalized ID,<label>,X,Y form.
    Export(ExportArgs),
    /// List or search the coordinate system catalog.
    Systems(SystemsArgs),
}

#[derive(Debug, Args)]
struct MappingArgs {
    /// Header of the point label column; auto-detected when omitted.
    #[arg(long)]
    point_column: Option<String>,

    /// Header of the X coordinate column; auto-detected when omitted.
    #[arg(long)]
    x_column: Option<String>,

    /// Header of the Y coordinate column; auto-detected when omitted.
    #[arg(long)]
    y_column: Option<String>,

    /// Keep the first header matching a role instead of the last.
    #[arg(long)]
    first_match: bool,
}

impl MappingArgs {
    fn overrides(&self) -> PartialMapping {
        PartialMapping {
            point_column: self.point_column.clone(),
            x_column: self.x_column.clone(),
            y_column: self.y_column.clone(),
        }
    }

    fn match_order(&self) -> MatchOrder {
        if self.first_match {
            MatchOrder::FirstWins
        } else {
            MatchOrder::LastWins
        }
    }
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input CSV or TXT path.
    #[arg(short, long)]
    input: PathBuf,

    /// Source coordinate system name or code.
    #[arg(short, long)]
    source: String,

    /// Target coordinate system name or code.
    #[arg(short, long)]
    target: String,

    /// Output CSV path; derived from the system names when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exchange X and Y values before transforming.
    #[arg(long)]
    swap_xy: bool,

    /// JSON file with additional coordinate system records.
    #[arg(long)]
    systems_file: Option<PathBuf>,

    #[command(flatten)]
    mapping: MappingArgs,

    /// Print per-row errors.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Input CSV or TXT path.
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV path; derived from today's date when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    mapping: MappingArgs,
}

#[derive(Debug, Args)]
struct SystemsArgs {
    /// Substring to search for; lists everything when omitted.
    #[arg(short, long)]
    query: Option<String>,

    /// JSON file with additional coordinate system records.
    #[arg(long)]
    systems_file: Option<PathBuf>,
}

fn load_systems_file(session: &mut Session, path: &Path) -> Result<usize> {
    let payload = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read systems file '{}'", path.display()))?;
    let records: Vec<SrsRecord> = serde_json::from_str(&payload)
        .with_context(|| format!("failed to parse systems file '{}'", path.display()))?;
    Ok(session.catalog_mut().import_srs_records(&records))
}

fn load_table(session: &mut Session, input: &Path, mapping: &MappingArgs) -> Result<()> {
    let text = read_input_file(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    session.stage_text(&text)?;
    session.commit_mapping(mapping.overrides())?;
    Ok(())
}

fn print_report(report: &BatchReport, verbose: bool) {
    println!(
        "transformed {}/{} points ({:.2}% success), {} validation error(s)",
        report.stats.success_count,
        report.stats.total,
        report.stats.success_rate_percent,
        report.validation_errors.len()
    );

    if !verbose {
        return;
    }
    for issue in &report.validation_errors {
        eprintln!("  - row {} ({}): {}", issue.point_id, issue.label, issue.message);
    }
    for result in &report.results {
        if let Some(message) = &result.error_message {
            eprintln!("  - row {} ({}): {}", result.point_id, result.label, message);
        }
    }
}

fn run_convert(args: &ConvertArgs) -> Result<BatchReport> {
    let mut session = Session::with_match_order(args.mapping.match_order());
    if let Some(path) = &args.systems_file {
        let imported = load_systems_file(&mut session, path)?;
        println!("imported {imported} coordinate system(s)");
    }

    load_table(&mut session, &args.input, &args.mapping)?;
    if args.swap_xy {
        session
            .table_mut()
            .expect("table was just loaded")
            .swap_xy();
    }

    let report = session.transform(&args.source, &args.target)?;

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(export::results_filename(
            &report.source_name,
            &report.target_name,
            Local::now().date_naive(),
        ))
    });
    let csv = export::results_to_csv(&report.results, &report.source_name, &report.target_name)?;
    std::fs::write(&output, csv)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    println!("wrote {}", output.display());

    Ok(report)
}

fn run_export(args: &ExportArgs) -> Result<usize> {
    let mut session = Session::with_match_order(args.mapping.match_order());
    load_table(&mut session, &args.input, &args.mapping)?;

    let table = session.table().expect("table was just loaded");
    let csv = table
        .to_csv()
        .map_err(|_| anyhow::anyhow!("the table is empty, nothing to export"))?;

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(export::points_filename(
            "координаты",
            Local::now().date_naive(),
        ))
    });
    std::fs::write(&output, csv)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    println!("wrote {}", output.display());

    Ok(table.len())
}

fn run_systems(args: &SystemsArgs) -> Result<usize> {
    let mut session = Session::new();
    if let Some(path) = &args.systems_file {
        load_systems_file(&mut session, path)?;
    }

    let systems = match &args.query {
        Some(query) => session.catalog().search(query),
        None => session.catalog().all().iter().collect(),
    };

    for system in &systems {
        println!(
            "{}\t{}\t{}\t{}",
            system.display_name,
            system.code,
            system.kind.label(),
            system.description
        );
    }

    Ok(systems.len())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coord_table=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Convert(args) => match run_convert(args) {
            Ok(report) => {
                print_report(&report, args.verbose);
                if report.stats.success_count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Export(args) => match run_export(args) {
            Ok(rows) => {
                println!("exported {rows} row(s)");
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
        Commands::Systems(args) => match run_systems(args) {
            Ok(count) => {
                if count > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
