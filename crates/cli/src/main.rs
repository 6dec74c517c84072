//! licencias - navigation licence documents from the command line
//!
//! Usage: licencias [OPTIONS] <COMMAND>

use anyhow::Context;
use clap::{Parser, Subcommand};
use licencia::{
    ArtifactOutcome, CatalogLoader, FieldStore, FormRecord, GenerationRequest, Generator,
    GeneratorConfig, JsonCatalogFile, RunReport, Selection,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_CATALOG: &str = "catalogo.json";

#[derive(Parser, Debug)]
#[command(name = "licencias")]
#[command(version, about = "Navigation licence certificates from practice forms", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON for scripting
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging when RUST_LOG is not set
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the fields read from a practice form
    Fields {
        /// Filled practice form
        pdf: PathBuf,
    },
    /// List the instructors and vessels of the catalog
    Catalog {
        /// Catalog JSON file
        #[arg(long, default_value = DEFAULT_CATALOG)]
        catalog: PathBuf,
    },
    /// Generate certificates, the updated form and the roster
    Generate {
        /// Filled practice form
        pdf: PathBuf,
        /// Instructor to sign, by name or identifier
        #[arg(long)]
        instructor: Option<String>,
        /// Vessel used, by name or registration
        #[arg(long)]
        vessel: Option<String>,
        /// Catalog JSON file
        #[arg(long, default_value = DEFAULT_CATALOG)]
        catalog: PathBuf,
        /// Configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory that receives the run directories
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// School logo (JPEG or PNG)
        #[arg(long)]
        logo: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Fields { pdf } => show_fields(&pdf, cli.json),
        Commands::Catalog { catalog } => show_catalog(catalog, cli.json),
        Commands::Generate {
            pdf,
            instructor,
            vessel,
            catalog,
            config,
            output,
            logo,
        } => {
            let mut settings = match config {
                Some(path) => GeneratorConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => GeneratorConfig::default(),
            };
            if let Some(output) = output {
                settings.output_root = output;
            }
            if logo.is_some() {
                settings.logo = logo;
            }

            let generator = Generator::new(settings, JsonCatalogFile::new(catalog));
            let report = generator.run(&GenerationRequest {
                source: pdf,
                selection: Selection {
                    instructor,
                    vessel,
                },
            })?;
            print_report(&report, cli.json)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn show_fields(pdf: &Path, json: bool) -> anyhow::Result<()> {
    let fields = FieldStore::read(pdf)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
        return Ok(());
    }

    for (key, value) in fields.iter() {
        println!("{key:<16} {value}");
    }
    let record = FormRecord::parse(&fields);
    println!();
    println!("{} alumno(s)", record.students.len());
    if !record.unrecognised.is_empty() {
        println!("Campos no reconocidos: {}", record.unrecognised.join(", "));
    }
    Ok(())
}

fn show_catalog(path: PathBuf, json: bool) -> anyhow::Result<()> {
    let catalog = JsonCatalogFile::new(path).load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    println!("Instructores:");
    for instructor in &catalog.instructors {
        println!("  {:<14} {}", instructor.id, instructor.name);
    }
    println!("Embarcaciones:");
    for vessel in &catalog.vessels {
        println!("  {:<14} {}", vessel.registration, vessel.name);
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Directorio: {}", report.output_dir.display());
    println!(
        "Certificados: {}/{}",
        report.certificates_produced(),
        report.students
    );
    for outcome in &report.certificates {
        print_outcome(outcome);
    }
    print_outcome(&report.form);
    print_outcome(&report.roster);
    for warning in &report.warnings {
        println!("Aviso: {warning}");
    }
    Ok(())
}

fn print_outcome(outcome: &ArtifactOutcome) {
    match outcome {
        ArtifactOutcome::Written {
            path,
            missing_fields,
        } if missing_fields.is_empty() => println!("  ok     {}", path.display()),
        ArtifactOutcome::Written {
            path,
            missing_fields,
        } => println!(
            "  ok     {} (sin: {})",
            path.display(),
            missing_fields.join(", ")
        ),
        ArtifactOutcome::Failed { path, reason } => {
            println!("  fallo  {}: {}", path.display(), reason)
        }
    }
}
