//! Command implementations for tabrecon CLI

use crate::cli::{Commands, OutputFormat};
use crate::data;
use crate::engine::ReconEngine;
use crate::error::{ReconError, Result};
use crate::export::{self, ExportFormat, ExportOptions};
use crate::mapping::{auto_map, ColumnMapping, ColumnPair};
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use crate::store::{EvictionPolicy, ResultHandle};
use crate::workspace::ReconWorkspace;
use std::path::{Path, PathBuf};

/// Execute a command
pub fn execute_command(command: Commands, workspace_path: Option<&Path>) -> Result<()> {
    match command {
        Commands::Init { force } => init_command(workspace_path, force),
        Commands::Run {
            source,
            target,
            map,
            auto_map,
            keys,
            case_insensitive,
            page_size,
            format,
        } => run_command(
            workspace_path,
            RunArgs {
                source,
                target,
                map,
                auto_map,
                keys,
                case_insensitive,
                page_size,
            },
            &format,
        ),
        Commands::Page {
            handle,
            page,
            size,
            format,
        } => page_command(workspace_path, &handle, page, size, &format),
        Commands::Show { handle, format } => show_command(workspace_path, &handle, &format),
        Commands::Export {
            handle,
            output,
            format,
            force,
        } => export_command(workspace_path, &handle, &output, format.as_deref(), force),
        Commands::List { format } => list_command(workspace_path, &format),
        Commands::Evict { handle, all } => evict_command(workspace_path, handle.as_deref(), all),
    }
}

/// Inputs of the `run` command
struct RunArgs {
    source: PathBuf,
    target: PathBuf,
    map: Vec<ColumnPair>,
    auto_map: bool,
    keys: Vec<String>,
    case_insensitive: bool,
    page_size: Option<usize>,
}

/// Initialize tabrecon workspace
fn init_command(workspace_path: Option<&Path>, force: bool) -> Result<()> {
    let current_dir = std::env::current_dir()?;
    let root = workspace_path.unwrap_or(&current_dir);

    // Always initialize in the given directory, never a parent workspace
    let workspace = ReconWorkspace::from_root(root.to_path_buf());
    workspace.initialize(force)?;

    println!("✅ Initialized tabrecon workspace at: {}", workspace.root.display());
    println!("📁 Workspace directory: {}", workspace.recon_dir.display());

    Ok(())
}

/// Compare source against target and persist the result
fn run_command(workspace_path: Option<&Path>, args: RunArgs, format: &str) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(ReconError::invalid_input)?;
    let workspace = ReconWorkspace::find_or_create(workspace_path)?;
    let config = workspace.load_config()?;

    let source_path = resolve_input(&workspace, &args.source);
    let target_path = resolve_input(&workspace, &args.target);

    let mut progress = match output_format {
        OutputFormat::Pretty => ProgressReporter::new_for_run(),
        OutputFormat::Json => ProgressReporter::new_minimal(),
    };

    progress.update_load(&format!("Loading {}...", args.source.display()));
    let source = data::load_dataset(&source_path)?;
    progress.update_load(&format!("Loading {}...", args.target.display()));
    let target = data::load_dataset(&target_path)?;
    progress.finish_load(&format!(
        "Loaded {} source rows and {} target rows",
        source.len(),
        target.len()
    ));

    let mapping = build_mapping(source.columns(), target.columns(), &args.map, args.auto_map)?;

    let mut normalizer_config = config.normalizer_config();
    normalizer_config.case_insensitive |= args.case_insensitive;

    let engine = ReconEngine::new(normalizer_config, EvictionPolicy::Manual);
    let receipt = engine.run_comparison(&source, &target, &mapping, &args.keys)?;
    progress.finish_compare(&format!(
        "Found {} discrepancies",
        receipt.summary.total_discrepancies
    ));

    let result = engine.result(&receipt.handle)?;
    workspace.save_result(&receipt.handle, &result)?;
    workspace.prune(config.eviction)?;

    let page_size = args.page_size.unwrap_or(config.default_page_size);
    let page = engine.get_page(&receipt.handle, 1, page_size)?;

    match output_format {
        OutputFormat::Pretty => {
            PrettyPrinter::print_summary(&receipt.handle, &receipt.summary);
            println!();
            PrettyPrinter::print_page(&page, &result.columns);
        }
        OutputFormat::Json => println!("{}", JsonFormatter::format_run(&receipt, &page)?),
    }

    Ok(())
}

/// Explicit pairs first, then case-insensitive name matches for the rest
fn build_mapping(
    source_columns: &[String],
    target_columns: &[String],
    explicit: &[ColumnPair],
    use_auto_map: bool,
) -> Result<ColumnMapping> {
    let mut mapping: ColumnMapping = explicit.to_vec();

    if use_auto_map {
        for pair in auto_map(source_columns, target_columns) {
            let taken = mapping
                .iter()
                .any(|p| p.source == pair.source || p.target == pair.target);
            if !taken {
                mapping.push(pair);
            }
        }
    }

    if mapping.is_empty() {
        return Err(ReconError::invalid_input(
            "No column mapping given. Use --map SRC=TGT or --auto-map",
        ));
    }

    log::debug!(
        "Column mapping: {}",
        mapping
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(mapping)
}

fn resolve_input(workspace: &ReconWorkspace, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.root.join(path)
    }
}

/// Load a persisted result into a fresh engine
fn open_result(workspace: &ReconWorkspace, reference: &str) -> Result<(ReconEngine, ResultHandle)> {
    let config = workspace.load_config()?;
    workspace.prune(config.eviction)?;

    let handle = workspace.resolve_handle(reference)?;
    let result = workspace.load_result(&handle)?;

    let engine = ReconEngine::new(config.normalizer_config(), EvictionPolicy::Manual);
    engine.store().insert(handle.clone(), result);
    Ok((engine, handle))
}

/// Show one page of a stored result
fn page_command(
    workspace_path: Option<&Path>,
    reference: &str,
    page: usize,
    size: Option<usize>,
    format: &str,
) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(ReconError::invalid_input)?;
    let workspace = ReconWorkspace::find_or_create(workspace_path)?;
    let size = match size {
        Some(size) => size,
        None => workspace.load_config()?.default_page_size,
    };

    let (engine, handle) = open_result(&workspace, reference)?;
    let page = engine.get_page(&handle, page, size)?;

    match output_format {
        OutputFormat::Pretty => {
            let result = engine.result(&handle)?;
            PrettyPrinter::print_page(&page, &result.columns);
        }
        OutputFormat::Json => println!("{}", JsonFormatter::format(&page)?),
    }

    Ok(())
}

/// Show the summary of a stored result
fn show_command(workspace_path: Option<&Path>, reference: &str, format: &str) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(ReconError::invalid_input)?;
    let workspace = ReconWorkspace::find_or_create(workspace_path)?;
    let (engine, handle) = open_result(&workspace, reference)?;
    let summary = engine.summary(&handle)?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_summary(&handle, &summary),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&summary)?),
    }

    Ok(())
}

/// Export a stored result to a file
fn export_command(
    workspace_path: Option<&Path>,
    reference: &str,
    output: &Path,
    format: Option<&str>,
    force: bool,
) -> Result<()> {
    let format = format
        .map(ExportFormat::parse)
        .transpose()
        .map_err(ReconError::invalid_input)?;

    let workspace = ReconWorkspace::find_or_create(workspace_path)?;
    let (engine, handle) = open_result(&workspace, reference)?;
    let result = engine.result(&handle)?;

    let output_path = resolve_input(&workspace, output);
    let options = ExportOptions {
        force,
        ..Default::default()
    };
    let written = export::export_to_path(&result, &output_path, format, &options)?;

    println!("✅ Export completed successfully!");
    println!("├─ Result: {}", handle.short());
    println!("├─ Format: {:?}", written);
    println!("├─ Rows: {}", result.rows.len());
    println!("└─ Output: {}", output_path.display());

    Ok(())
}

/// List stored results
fn list_command(workspace_path: Option<&Path>, format: &str) -> Result<()> {
    let output_format = OutputFormat::parse(format).map_err(ReconError::invalid_input)?;
    let workspace = ReconWorkspace::find_or_create(workspace_path)?;
    let results = workspace.list_results()?;

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_result_list(&results),
        OutputFormat::Json => println!("{}", JsonFormatter::format(&results)?),
    }

    Ok(())
}

/// Remove one or all stored results
fn evict_command(workspace_path: Option<&Path>, reference: Option<&str>, all: bool) -> Result<()> {
    let workspace = ReconWorkspace::find_or_create(workspace_path)?;

    if all {
        let removed = workspace.clear_results()?;
        println!("🗑️  Removed {} stored results", removed);
        return Ok(());
    }

    let reference = reference
        .ok_or_else(|| ReconError::invalid_input("Give a result handle or --all"))?;
    let handle = workspace.resolve_handle(reference)?;
    workspace.remove_result(&handle)?;
    println!("🗑️  Removed result {}", handle);

    Ok(())
}
