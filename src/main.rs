use clap::Parser;
use tracing_subscriber::EnvFilter;
use venuedex::{
    ConfigDb,
    DataDir,
    Session,
    cli::{CatalogAction, Cli, Command},
    config_db::CATALOG_PATH_SETTING,
    error::{self, Error},
    filter::FilterState,
    mcp,
    render,
};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("VENUEDEX_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let config_db = ConfigDb::open(&data_dir.config_db())?;
    let catalog_path =
        data_dir.catalog_path(cli.catalog.as_deref(), &config_db)?;

    match cli.command {
        Command::Catalog { action } => match action {
            CatalogAction::Show => {
                println!("{}", catalog_path.display());
            }
            CatalogAction::Set { path } => {
                catalog_set(&config_db, &path)?;
            }
            CatalogAction::Clear => {
                if config_db.remove_setting(CATALOG_PATH_SETTING)? {
                    println!(
                        "Cleared stored catalog path; using {}",
                        data_dir.default_catalog().display()
                    );
                } else {
                    println!("No catalog path stored.");
                }
            }
        },
        Command::Mcp => {
            let session = Session::open(&catalog_path, config_db);
            mcp::run_mcp(session)?;
        }
        Command::Search(args) => {
            let session = Session::open(&catalog_path, &config_db);
            let view = session.view(&args.filter());

            if args.json {
                println!("{}", render::format_json(&view)?);
            } else if args.html {
                print!("{}", render::format_html(&view));
            } else {
                print!("{}", render::format_human(&view));
            }
        }
        Command::Select(args) => {
            let mut session = Session::open(&catalog_path, &config_db);
            if let Some(err) = session.load_error() {
                return Err(Error::Catalog(err.to_string()));
            }
            let (identity, selected) = session.toggle(&args.venue())?;
            let verb = if selected { "Selected" } else { "Deselected" };
            println!(
                "{verb} {} ({} selected)",
                identity,
                session.selected_count()
            );
        }
        Command::Selected(args) => {
            let session = Session::open(&catalog_path, &config_db);
            let view = session.view(&FilterState::new());

            if args.json {
                let selected: Vec<render::EntryJson<'_>> = view
                    .selected
                    .iter()
                    .map(|r| render::EntryJson::new(r, ""))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                print!("{}", render::format_selected_human(&view));
            }
        }
        Command::Clear => {
            let mut session = Session::open(&catalog_path, &config_db);
            let count = session.selected_count();
            session.clear_selection()?;
            println!("Cleared {count} selected venue(s)");
        }
        Command::Fields(args) => {
            let session = Session::open(&catalog_path, &config_db);
            if let Some(err) = session.load_error() {
                return Err(Error::Catalog(err.to_string()));
            }
            let names: Vec<&str> = session.catalog().field_names().collect();

            if args.json {
                println!("{}", serde_json::to_string(&names)?);
            } else if names.is_empty() {
                println!("No fields in catalog.");
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        Command::Status(args) => {
            cmd_status(&data_dir, &config_db, &catalog_path, args.json)?;
        }
        Command::Completions(_) => {}
    }

    Ok(())
}

fn catalog_set(
    config_db: &ConfigDb,
    path: &std::path::Path,
) -> error::Result<()> {
    if !path.is_file() {
        return Err(Error::Config(format!(
            "catalog file does not exist: {}",
            path.display()
        )));
    }

    let abs_path = path.canonicalize().map_err(|e| {
        Error::Config(format!("cannot resolve path {}: {e}", path.display()))
    })?;

    // Must parse before it is stored.
    venuedex::Catalog::load(&abs_path)?;

    config_db.set_setting(CATALOG_PATH_SETTING, &abs_path.to_string_lossy())?;
    println!("Catalog set to {}", abs_path.display());
    Ok(())
}

fn cmd_status(
    data_dir: &DataDir,
    config_db: &ConfigDb,
    catalog_path: &std::path::Path,
    json: bool,
) -> error::Result<()> {
    let session = Session::open(catalog_path, config_db);
    let catalog = session.catalog();

    if json {
        let status = serde_json::json!({
            "dataDir": data_dir.root().display().to_string(),
            "catalog": catalog_path.display().to_string(),
            "error": session.load_error(),
            "fields": catalog.fields().len(),
            "entries": catalog.len(),
            "selected": session.selected_count(),
        });
        println!("{status}");
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Catalog: {}", catalog_path.display());
        if let Some(err) = session.load_error() {
            println!("Catalog error: {err}");
        }
        println!("Fields: {}", catalog.fields().len());
        println!("Entries: {}", catalog.len());
        println!("Selected: {}", session.selected_count());
    }
    Ok(())
}
