//! Command implementations for tabcmp CLI

use crate::cli::{Cli, Commands, OutputFormat};
use crate::comparator::TableComparator;
use crate::config::{RawComparisonConfig, DEFAULT_EXPORT_PATH};
use crate::duckdb_backend::DuckDbWarehouse;
use crate::error::{Result, TabcmpError};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::report::ComparisonReport;
use crate::sink::{sink_for_path, DifferenceSink};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

/// Execute a parsed command line
pub fn execute_command(cli: Cli) -> Result<()> {
    let Cli {
        command,
        config,
        database,
        attach,
        init_sql,
        ..
    } = cli;

    let warehouse_settings = RawComparisonConfig {
        database,
        attach,
        init_sql,
        ..Default::default()
    };

    match command {
        Commands::Compare {
            tables,
            sample_limit,
            output,
            no_export,
            format,
            report,
        } => {
            let overrides = RawComparisonConfig {
                output,
                ..tables.to_raw_config(sample_limit)
            };
            let settings = resolve_settings(config.as_deref(), warehouse_settings, overrides)?;
            compare_command(&settings, no_export, &format, report.as_deref())
        }
        Commands::Schema { tables, format } => {
            let settings =
                resolve_settings(config.as_deref(), warehouse_settings, tables.to_raw_config(None))?;
            schema_command(&settings, &format)
        }
        Commands::Plan {
            tables,
            sample_limit,
            format,
        } => {
            let settings = resolve_settings(
                config.as_deref(),
                warehouse_settings,
                tables.to_raw_config(sample_limit),
            )?;
            plan_command(&settings, &format)
        }
    }
}

/// Config file first, then global flags, then subcommand flags
fn resolve_settings(
    config_path: Option<&Path>,
    warehouse_settings: RawComparisonConfig,
    overrides: RawComparisonConfig,
) -> Result<RawComparisonConfig> {
    let base = match config_path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            RawComparisonConfig::load(path)?
        }
        None => RawComparisonConfig::default(),
    };

    Ok(base.overlay(warehouse_settings).overlay(overrides))
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format).map_err(TabcmpError::invalid_input)
}

/// Open the warehouse, attach databases and run the init script
pub fn open_warehouse(settings: &RawComparisonConfig) -> Result<DuckDbWarehouse> {
    let warehouse = DuckDbWarehouse::open(settings.database.as_deref())?;

    for (alias, path) in settings.attachments()? {
        warehouse.attach(&alias, &path)?;
    }

    if let Some(path) = &settings.init_sql {
        let script = fs::read_to_string(path)
            .with_context(|| format!("Failed to read init SQL '{}'", path.display()))?;
        warehouse.run_script(&script)?;
    }

    Ok(warehouse)
}

/// Run a full comparison
fn compare_command(
    settings: &RawComparisonConfig,
    no_export: bool,
    format: &str,
    report_path: Option<&Path>,
) -> Result<()> {
    let format = parse_format(format)?;
    // Table references are validated before the warehouse is touched
    let config = settings.build()?;
    let warehouse = open_warehouse(settings)?;

    let progress = match format {
        OutputFormat::Pretty => ProgressReporter::new_for_comparison(),
        OutputFormat::Json => ProgressReporter::new_minimal(),
    };
    let mut comparator = TableComparator::new(&warehouse).with_progress(progress);

    let mut sink: Option<Box<dyn DifferenceSink>> = if no_export {
        None
    } else {
        let path = settings
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_PATH));
        Some(sink_for_path(&path))
    };

    let report = match &mut sink {
        Some(sink) => {
            let sink: &mut dyn DifferenceSink = sink.as_mut();
            comparator.run(&config, Some(sink))?
        }
        None => comparator.run(&config, None)?,
    };
    drop(comparator);

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_comparison_report(&report),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&report)?),
    }

    if let Some(path) = report_path {
        write_report(&report, path)?;
    }

    Ok(())
}

/// Write the JSON report, creating parent directories
pub fn write_report(report: &ComparisonReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, JsonFormatter::format(report)?)?;
    log::info!("Report written to {}", path.display());
    Ok(())
}

/// Fetch and reconcile schemas only
fn schema_command(settings: &RawComparisonConfig, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let config = settings.build()?;
    let warehouse = open_warehouse(settings)?;

    let (_, _, schema) = TableComparator::new(&warehouse).analyze_schemas(&config)?;

    match format {
        OutputFormat::Pretty => PrettyPrinter::print_schema_comparison(
            &config.table1().qualified(),
            &config.table2().qualified(),
            &schema,
        ),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&schema)?),
    }

    Ok(())
}

/// Print the queries a comparison would issue
fn plan_command(settings: &RawComparisonConfig, format: &str) -> Result<()> {
    let format = parse_format(format)?;
    let config = settings.build()?;
    let warehouse = open_warehouse(settings)?;

    let (schema, plan) = TableComparator::new(&warehouse).plan(&config)?;
    let table1 = config.table1().qualified();
    let table2 = config.table2().qualified();

    match format {
        OutputFormat::Json => println!("{}", JsonFormatter::format_query_plan(&schema, plan.as_ref())?),
        OutputFormat::Pretty => match &plan {
            Some(plan) => PrettyPrinter::print_query_plan(&table1, &table2, plan),
            None => {
                PrettyPrinter::print_schema_comparison(&table1, &table2, &schema);
                println!("No common columns found; no data query would run");
            }
        },
    }

    Ok(())
}
