mod balance;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use bgc_config::{EvaluationReport, RunConfig, build_cells, build_engine, load_run};
use bgc_core::{Cell, CellAudit, Domain, Engine, Namespace, ProcessCatalog};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bgc", about = "Biogeochemical derivative engine CLI")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a run description and run setup without evaluating
    Check {
        /// Run description (TOML)
        config: PathBuf,
    },

    /// Evaluate every configured cell once and print the derivatives
    Eval {
        /// Run description (TOML)
        config: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Evaluate with the mass-balance audit and fail on any discrepancy
    Balance {
        /// Run description (TOML)
        config: PathBuf,

        /// Relative tolerance on the bracket totals
        #[arg(long, default_value_t = 1e-9)]
        tolerance: f64,
    },

    /// List the built-in processes
    Processes,
}

/// `--verbose` turns on setup and evaluation events of the bgc crates;
/// otherwise `RUST_LOG` applies, falling back to warnings only.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("warn,bgc=debug,bgc_core=debug,bgc_config=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Check { config } => cmd_check(config),
        Commands::Eval {
            config,
            json,
            output,
        } => cmd_eval(config, *json, output.as_deref()),
        Commands::Balance { config, tolerance } => cmd_balance(config, *tolerance),
        Commands::Processes => cmd_processes(),
    }
}

fn load(path: &Path) -> Result<(RunConfig, Engine)> {
    let config = load_run(path)
        .with_context(|| format!("failed to load run description {}", path.display()))?;
    let engine = build_engine(&config, &ProcessCatalog::standard())
        .with_context(|| format!("setup failed for run '{}'", config.run.name))?;
    Ok((config, engine))
}

fn evaluate(config: &RunConfig, engine: &Engine) -> Result<(Vec<Cell>, Vec<Option<CellAudit>>)> {
    let mut cells = build_cells(config, engine).context("failed to build cells")?;
    let audits = engine.evaluate_cells(&mut cells);
    Ok((cells, audits))
}

fn cmd_check(path: &Path) -> Result<()> {
    let (config, engine) = load(path)?;
    let registry = engine.registry();

    println!("run:          {}", config.run.name);
    println!("tracers:      {}", registry.len(Namespace::Tracer));
    println!("cell vars:    {}", registry.len(Namespace::CellCache));
    println!("model vars:   {}", registry.len(Namespace::ModelCache));
    for domain in Domain::ALL {
        let seq = engine.sequencer(domain);
        let audit = if seq.mass_balance() { " [audited]" } else { "" };
        println!("{:<13} {}{audit}", format!("{domain}:"), seq.ids().join(", "));
    }
    println!("cells:        {}", config.cells.len());
    println!("ok");
    engine.teardown();
    Ok(())
}

fn cmd_eval(path: &Path, json: bool, output: Option<&Path>) -> Result<()> {
    let (config, engine) = load(path)?;
    let (cells, audits) = evaluate(&config, &engine)?;
    let report = EvaluationReport::new(&config.run.name, &engine, &cells, &audits);

    if let Some(out) = output {
        report
            .write_json(out)
            .with_context(|| format!("failed to write report to {}", out.display()))?;
        tracing::info!("wrote report: {}", out.display());
    }

    if json {
        println!("{}", report.to_json().context("failed to serialize report")?);
    } else {
        for cell in &report.cells {
            println!("cell {} ({})", cell.index, cell.domain);
            if cell.derivative.is_empty() {
                println!("  (no change)");
            }
            for (name, rate) in &cell.derivative {
                println!("  {name:<16} {rate:+.6e}");
            }
        }
    }
    engine.teardown();
    Ok(())
}

fn cmd_balance(path: &Path, tolerance: f64) -> Result<()> {
    let (config, engine) = load(path)?;
    if !Domain::ALL
        .iter()
        .any(|&d| engine.sequencer(d).mass_balance())
    {
        bail!(
            "mass balance is not enabled for run '{}' (set run.mass_balance)",
            config.run.name
        );
    }
    let (cells, audits) = evaluate(&config, &engine)?;
    let report = EvaluationReport::new(&config.run.name, &engine, &cells, &audits);
    engine.teardown();

    balance::write_balance(&report, tolerance, &mut std::io::stdout().lock())?;
    Ok(())
}

fn cmd_processes() -> Result<()> {
    let catalog = ProcessCatalog::standard();
    for entry in catalog.entries() {
        let domains: Vec<String> = entry.domains.iter().map(|d| d.suffix().to_string()).collect();
        println!("{:<36} {:<7} {}", entry.id, domains.join("+"), entry.summary);
    }
    Ok(())
}
