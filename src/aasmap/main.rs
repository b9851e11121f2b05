use aasmap::api::{CmdMessage, ImportApi, MessageLevel};
use aasmap::codec;
use aasmap::commands;
use aasmap::config::{self, ImportConfig};
use aasmap::error::Result;
use aasmap::import::{ColumnMarkers, InMemoryWorkbook, Mapping, PreObjectImport};
use aasmap::registry::CLASSES_INFO;
use clap::Parser;
use colored::*;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct AppContext {
    api: ImportApi<ColumnMarkers>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Commands::Init = cli.command {
        let dir = cli
            .config
            .clone()
            .unwrap_or_else(|| cwd.join(config::PROJECT_CONFIG_DIR));
        return handle_init(&dir);
    }

    let config_dir = config::config_dir(cli.config.as_deref(), &cwd)?;
    let mut config = ImportConfig::load(&config_dir)?;
    if let Commands::Import {
        skip_failed: true, ..
    } = cli.command
    {
        config.skip_failed_rows = true;
    }
    let ctx = AppContext {
        api: ImportApi::new(config.markers()?, config),
    };

    match cli.command {
        Commands::Show { object } => handle_show(&ctx, &object),
        Commands::Mapping { object, set, json } => {
            handle_mapping(&ctx, &object, set.as_deref(), json)
        }
        Commands::Preview {
            object,
            mapping,
            workbook,
            sheet,
            row,
        } => handle_preview(&ctx, &object, mapping.as_deref(), &workbook, sheet, row),
        Commands::Import {
            object,
            mapping,
            workbook,
            sheet,
            rows,
            output,
            ..
        } => handle_import(&ctx, &object, mapping.as_deref(), &workbook, sheet, rows, output),
        Commands::Init => handle_init(&config_dir),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_template(
    ctx: &AppContext,
    object: &Path,
    mapping: Option<&Path>,
) -> Result<PreObjectImport> {
    let value = codec::load(object)?;
    let mut template = ctx.api.template_for(&value)?;
    if let Some(path) = mapping {
        let mapping = Mapping::from_json(&fs::read_to_string(path)?)?;
        ctx.api.apply_mapping(&mut template, &mapping)?;
    }
    Ok(template)
}

fn handle_show(ctx: &AppContext, object: &Path) -> Result<()> {
    let template = load_template(ctx, object, None)?;
    let ty = template.obj_type();
    println!("{}", template.to_string().bold());

    let hidden: Vec<&str> = CLASSES_INFO.hidden_attrs(ty).into_iter().collect();
    if !hidden.is_empty() {
        println!("{} {}", "hidden:".dimmed(), hidden.join(", "));
    }
    for attr in CLASSES_INFO.iter_attrs(ty) {
        let text = match CLASSES_INFO.add_action_text(ty, Some(attr)) {
            "" => CLASSES_INFO.add_action_text(ty, None),
            text => text,
        };
        let add = CLASSES_INFO
            .add_type(ty, Some(attr))
            .or_else(|| CLASSES_INFO.add_type(ty, None))
            .map(|t| format!(" ({})", t))
            .unwrap_or_default();
        println!("{} {}: {}{}", "children:".dimmed(), attr, text, add);
    }
    if CLASSES_INFO.has_packview_attrs(ty) {
        println!(
            "{} {}",
            "package view:".dimmed(),
            CLASSES_INFO.packview_attrs(ty).join(", ")
        );
    }

    let result = ctx.api.mapping(&template)?;
    if let Some(mapping) = &result.mapping {
        print_mapping(mapping);
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_mapping(ctx: &AppContext, object: &Path, set: Option<&Path>, json: bool) -> Result<()> {
    let template = load_template(ctx, object, set)?;
    let result = ctx.api.mapping(&template)?;
    let mapping = result.mapping.unwrap_or_default();
    if json {
        println!("{}", mapping.to_json_pretty()?);
        return Ok(());
    }
    print_mapping(&mapping);
    print_messages(&result.messages);
    Ok(())
}

fn handle_preview(
    ctx: &AppContext,
    object: &Path,
    mapping: Option<&Path>,
    workbook: &Path,
    sheet: Option<String>,
    row: Option<usize>,
) -> Result<()> {
    let template = load_template(ctx, object, mapping)?;
    let workbook = InMemoryWorkbook::load(workbook)?;
    let result = ctx
        .api
        .preview_row(&template, &workbook, sheet.as_deref(), row)?;
    print_messages(&result.messages);
    for (_, value) in &result.objects {
        println!("{}", codec::to_string_pretty(value)?);
    }
    Ok(())
}

fn handle_import(
    ctx: &AppContext,
    object: &Path,
    mapping: Option<&Path>,
    workbook: &Path,
    sheet: Option<String>,
    rows: Option<RangeInclusive<usize>>,
    output: Option<PathBuf>,
) -> Result<()> {
    let template = load_template(ctx, object, mapping)?;
    let workbook = InMemoryWorkbook::load(workbook)?;
    let result = ctx
        .api
        .import_rows(&template, &workbook, sheet.as_deref(), rows)?;

    let documents = result
        .objects
        .iter()
        .map(|(row, value)| serde_json::json!({"row": row, "object": codec::to_json(value)}))
        .collect::<Vec<_>>();
    let text = serde_json::to_string_pretty(&documents)?;

    match output {
        Some(path) => {
            fs::write(&path, text)?;
            print_messages(&result.messages);
            println!("{}", format!("Wrote {}", path.display()).dimmed());
        }
        None => {
            println!("{}", text);
            eprint_messages(&result.messages);
        }
    }
    Ok(())
}

fn handle_init(dir: &Path) -> Result<()> {
    let result = commands::init::run(dir)?;
    print_messages(&result.messages);
    Ok(())
}

fn print_mapping(mapping: &Mapping) {
    let entries = mapping.flatten();
    if entries.is_empty() {
        return;
    }
    let paths: Vec<String> = entries
        .iter()
        .map(|(path, _)| if path.is_empty() { ".".to_string() } else { path.clone() })
        .collect();
    let width = paths.iter().map(|p| p.width()).max().unwrap_or(0);
    for (path, (_, marker)) in paths.iter().zip(&entries) {
        let pad = " ".repeat(width - path.width());
        println!("  {}{}  {}", path, pad, marker.yellow());
    }
}

fn styled(message: &CmdMessage) -> ColoredString {
    match message.level {
        MessageLevel::Info => message.content.dimmed(),
        MessageLevel::Success => message.content.green(),
        MessageLevel::Warning => message.content.yellow(),
    }
}

fn print_messages(messages: &[CmdMessage]) {
    for message in messages {
        println!("{}", styled(message));
    }
}

fn eprint_messages(messages: &[CmdMessage]) {
    for message in messages {
        eprintln!("{}", styled(message));
    }
}
