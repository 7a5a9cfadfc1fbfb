use anyhow::Result;
use clap::{Parser, ValueEnum};
use runner_index::config::load_config;
use runner_index::{ItemType, Loader};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Command,
    Mention,
}

impl From<Kind> for ItemType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Command => ItemType::Command,
            Kind::Mention => ItemType::Mention,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Item type to list
    #[arg(short = 't', long = "type", value_enum, default_value = "command")]
    kind: Kind,

    /// Filter items; `prefix:term` selects prefixed entries
    #[arg(short, long)]
    query: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let mut loader = Loader::from_config(&config);

    let item_type = ItemType::from(args.kind);
    let items = match &args.query {
        Some(query) => loader.search_items(item_type, query),
        None => loader.get_items(item_type),
    };

    for item in &items {
        println!("{}", serde_json::to_string(item)?);
    }
    Ok(())
}
