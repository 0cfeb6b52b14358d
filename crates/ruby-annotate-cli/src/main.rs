use anyhow::{Context, Result};
use ruby_annotate_config::Config;
use ruby_annotate_engine::{Document, Serializer, io};
use std::{env, path::Path, process};

mod script;

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("Config file not found: {}", path.display())),
        None => match Config::load()? {
            Some(config) => Ok(config),
            None => {
                log::info!(
                    "No config file at {}, using defaults",
                    Config::config_path().display()
                );
                Ok(Config::default())
            }
        },
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = env::args();
    let program = args
        .next()
        .unwrap_or_else(|| "ruby-annotate-cli".to_string());
    let invocation = match script::parse_args(args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", script::usage(&program));
            process::exit(1);
        }
    };

    let config = load_config(invocation.config.as_deref())?;
    let hotkeys = config.hotkey_table()?;

    let doc = match &invocation.document {
        Some(path) => io::read_document(path)
            .with_context(|| format!("Failed to load document {}", path.display()))?,
        None => Document::new(),
    };
    let mut doc = doc.with_ruby_seed(config.collapsed_ruby_seed);

    let serializer = Serializer::new(config.serialize_options());
    let rendered = script::run(&mut doc, &invocation.commands, &hotkeys, &serializer)?;

    if let Some(path) = &invocation.save {
        io::write_document(path, &doc)
            .with_context(|| format!("Failed to save document to {}", path.display()))?;
        log::info!("Saved document to {}", path.display());
    }
    if let Some(path) = invocation.out.as_ref().or(config.output_path.as_ref()) {
        io::write_string(path, &rendered.fixed)
            .with_context(|| format!("Failed to write markup to {}", path.display()))?;
        log::info!("Wrote markup to {}", path.display());
    }

    println!("{}", rendered.fixed);
    Ok(())
}
