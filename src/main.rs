// talon-search - find the voice command you forgot
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use talon_search_lib::{
    core::{
        scanner, FacetBuilder, ImportMode, ImportSummary, Importer, SearchOptions, SearchScope,
        Searcher, SourceFile,
    },
    logging, Database, Result, SearchError, Settings,
};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();

    let verbose = args.iter().any(|a| a == "--verbose");
    args.retain(|a| a != "--verbose");
    logging::init(verbose);

    if let Err(e) = run(&args).await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> Result<()> {
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];

    match command.as_str() {
        "index" => handle_index(rest).await,
        "import" => handle_import(rest).await,
        "search" => handle_search(rest).await,
        "lists" => handle_lists(rest).await,
        "status" => handle_status().await,
        "clear" => handle_clear(rest).await,
        "config" => handle_config().await,
        "version" | "-v" | "--version" => {
            println!("talon-search v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

async fn handle_index(args: &[String]) -> Result<()> {
    let settings = load_settings()?;
    let root = match args.first() {
        Some(path) => PathBuf::from(path),
        None => settings.resolve_user_folder().ok_or_else(|| {
            SearchError::UserFolderNotFound("no path given and none detected".to_string())
        })?,
    };

    let db = get_database(&settings)?;
    println!("Indexing {} ...", root.display());
    let (commands, lists) = index_folder(&db, &root, ImportMode::Refresh).await?;

    println!("✓ {} commands from {} files", commands.records_imported, commands.files_processed);
    println!("✓ {} list items from {} files", lists.records_imported, lists.files_processed);
    Ok(())
}

async fn handle_import(args: &[String]) -> Result<()> {
    let Some(path) = args.first() else {
        eprintln!("Error: No path provided");
        return Ok(());
    };
    let path = PathBuf::from(path);

    let settings = load_settings()?;
    let db = get_database(&settings)?;

    if path.is_dir() {
        let (commands, lists) = index_folder(&db, &path, ImportMode::Append).await?;
        println!("✓ Added {} commands and {} list items", commands.records_imported, lists.records_imported);
        return Ok(());
    }

    let content = tokio::fs::read_to_string(&path).await?;
    let file = SourceFile::new(path.clone(), content);
    let importer = Importer::new(Arc::clone(&db));

    let summary = match path.extension().and_then(|ext| ext.to_str()) {
        Some("talon") => importer.import_command_files(&[file], ImportMode::Append),
        Some("talon-list") => importer.import_list_files(&[file], ImportMode::Append),
        // anything else is treated as a listName,spokenForm,listValue table
        _ => importer.import_list_table(&file, ImportMode::Append),
    };

    println!(
        "✓ Added {} records ({} total)",
        summary.records_imported, summary.total_in_store
    );
    Ok(())
}

async fn handle_search(args: &[String]) -> Result<()> {
    let settings = load_settings()?;
    let mut options = SearchOptions::default().with_max_results(settings.max_results);
    options.preferred_applications = settings.preferred_applications.clone();
    options.excluded_operating_systems = settings.excluded_operating_systems.clone();

    let mut term_parts = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = args.get(i + 1).cloned();
        match flag {
            "--scope" | "--app" | "--mode" | "--repo" | "--tag" | "--os" | "--title"
            | "--language" | "--limit" => {
                let Some(value) = value else {
                    return Err(SearchError::Config(format!("{} needs a value", flag)));
                };
                match flag {
                    "--scope" => options.scope = value.parse::<SearchScope>()?,
                    "--app" => options.application = Some(value),
                    "--mode" => options.mode = Some(value),
                    "--repo" => options.repository = Some(value),
                    "--tag" => options.tag = Some(value),
                    "--os" => options.operating_system = Some(value),
                    "--title" => options.title = Some(value),
                    "--language" => options.code_language = Some(value),
                    _ => options.max_results = parse_limit(&value)?,
                }
                i += 2;
            }
            arg => {
                term_parts.push(arg.to_string());
                i += 1;
            }
        }
    }
    options.search_term = term_parts.join(" ");

    let db = get_database(&settings)?;
    if db.command_count() == 0 && settings.enable_auto_indexing {
        // First run. Build the index so the search has something to look at.
        if let Some(root) = settings.resolve_user_folder() {
            println!("Index is empty, indexing {} first...", root.display());
            index_folder(&db, &root, ImportMode::Refresh).await?;
        }
    }

    let results = Searcher::new(Arc::clone(&db)).search(&options);

    if results.is_empty() {
        println!("No commands found matching '{}'", options.search_term);
        return Ok(());
    }

    println!("\nFound {} command(s) [scope: {}]:", results.len(), options.scope);
    println!("{}", "=".repeat(60));
    for (i, cmd) in results.iter().enumerate() {
        println!("{:3}. {}  ({})", i + 1, cmd.command, cmd.application);
        if let Some(first_line) = cmd.script.lines().map(str::trim).find(|l| !l.is_empty()) {
            println!("     {}", first_line);
        }
        println!("     {}", cmd.file_path);
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_lists(args: &[String]) -> Result<()> {
    let settings = load_settings()?;
    let mut term = None;
    let mut list_name = None;
    let mut limit = settings.max_results;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--name" => {
                i += 1;
                list_name = args.get(i).cloned();
            }
            "--limit" => {
                i += 1;
                if let Some(value) = args.get(i) {
                    limit = parse_limit(value)?;
                }
            }
            arg => term = Some(arg.to_string()),
        }
        i += 1;
    }

    let db = get_database(&settings)?;

    let items = match (&list_name, &term) {
        (Some(name), _) => db.get_list_items_by_name(name),
        (None, Some(term)) => Searcher::new(Arc::clone(&db)).search_lists(term, limit),
        (None, None) => {
            let names = db.get_list_names();
            if names.is_empty() {
                println!("No lists indexed.");
            } else {
                println!("\n{} list(s):", names.len());
                for name in names {
                    println!("  {}", name);
                }
            }
            return Ok(());
        }
    };

    if items.is_empty() {
        println!("No list items found.");
    } else {
        for item in items.iter().take(limit) {
            println!("  {:<30} {:<25} {}", item.list_name, item.spoken_form, item.list_value);
        }
    }

    Ok(())
}

async fn handle_status() -> Result<()> {
    let settings = load_settings()?;
    let db = get_database(&settings)?;
    let stats = db.stats();
    let facets = FacetBuilder::new(Arc::clone(&db));

    println!("\ntalon-search Status");
    println!("{}", "=".repeat(60));

    println!("\nIndex:");
    match db.path() {
        Some(path) => println!("  Location:    {}", path.display()),
        None => println!("  Location:    in memory only"),
    }
    println!("  Commands:    {}", stats.total_commands);
    println!("  List items:  {}", stats.total_list_items);
    println!("  Lists:       {}", stats.distinct_lists);

    println!("\nUser Folder:");
    match settings.resolve_user_folder() {
        Some(path) => println!("  {}", path.display()),
        None => println!("  Not found"),
    }

    let values = facets.filter_values();
    println!("\nFilters:");
    println!("  Applications:  {}", values.applications.len());
    println!("  Modes:         {}", values.modes.len());
    println!("  Tags:          {}", values.tags.len());
    println!("  Titles:        {}", values.titles.len());
    println!("  OS:            {}", values.operating_systems.join(", "));
    println!("  Languages:     {}", values.code_languages.join(", "));

    let breakdown = facets.repository_breakdown();
    if !breakdown.is_empty() {
        println!("\nRepositories:");
        for (repo, count) in breakdown {
            println!("  {:<30} {}", repo, count);
        }
    }

    println!("{}", "=".repeat(60));
    Ok(())
}

async fn handle_clear(args: &[String]) -> Result<()> {
    let settings = load_settings()?;
    let db = get_database(&settings)?;

    match args.first().map(String::as_str).unwrap_or("all") {
        "commands" => {
            db.clear_all_commands();
            println!("✓ Cleared all commands");
        }
        "lists" => {
            db.clear_all_lists();
            println!("✓ Cleared all list items");
        }
        "all" => {
            db.clear_all_data();
            println!("✓ Cleared the whole index");
        }
        other => {
            eprintln!("Unknown target: {} (use commands, lists or all)", other);
        }
    }

    Ok(())
}

async fn handle_config() -> Result<()> {
    let path = Settings::default_path()?;
    let settings = Settings::load(&path)?;

    println!("Settings file: {}", path.display());
    println!("Index file:    {}", settings.data_path()?.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Scan `root` and load everything under it
async fn index_folder(
    db: &Arc<Database>,
    root: &Path,
    mode: ImportMode,
) -> Result<(ImportSummary, ImportSummary)> {
    let report = scanner::scan(root).await?;
    for (path, reason) in &report.skipped {
        eprintln!("  (skipped {}: {})", path.display(), reason);
    }

    Importer::new(Arc::clone(db)).import_scan(root, &report, mode)
}

fn parse_limit(value: &str) -> Result<usize> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SearchError::Config(format!("invalid limit: {}", value))),
    }
}

fn load_settings() -> Result<Settings> {
    Settings::load(Settings::default_path()?)
}

fn get_database(settings: &Settings) -> Result<Arc<Database>> {
    let (db, err) = Database::open_or_degrade(settings.data_path()?);
    if let Some(e) = err {
        // still usable, just won't survive this run
        eprintln!("Warning: {}", e.user_message());
    }
    Ok(Arc::new(db))
}

fn print_usage() {
    println!(
        r#"talon-search v{} - Find the voice command you forgot

USAGE:
    talon-search <COMMAND> [OPTIONS] [--verbose]

COMMANDS:
    index [path]           Rebuild the index from a Talon user folder
    import <path>          Add a folder, .talon, .talon-list or list table
    search [flags] <term>  Search commands
    lists [term]           Show lists, or search list items
    status                 Show index stats and filters
    clear [target]         Clear commands, lists or all (default: all)
    config                 Show settings
    version                Show version
    help                   Show this help

SEARCH FLAGS:
    --scope <s>            names, script, all (default) or spoken
    --app <name>           Only commands for this application
    --mode <mode>          Mode contains this text
    --repo <name>          Only commands from this repository
    --tag <tag>            Has this tag
    --os <os>              Only this operating system
    --title <text>         Title is exactly this
    --language <lang>      Only this code language
    --limit <n>            Maximum results

LIST FLAGS:
    --name <list>          Show every item of one list
    --limit <n>            Maximum results

EXAMPLES:
    talon-search index
    talon-search search tab
    talon-search search --scope spoken --app chrome left
    talon-search lists --name user.arrow_key
    talon-search status

Set RUST_LOG to control log output.
"#,
        env!("CARGO_PKG_VERSION")
    );
}
