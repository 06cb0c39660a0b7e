use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;

use meta_graph::{Graph, Resolved};
use meta_ingest::XmlConverter;
use meta_store::{FsDatastore, Node, Store};
use meta_xml::ContextDocument;

use crate::cli::*;
use crate::config::MetaConfig;

type FsStore = Store<FsDatastore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => MetaConfig::load(path)?,
        None => MetaConfig::default(),
    };
    if let Some(dir) = cli.store {
        config.store_dir = dir;
    }
    let backend = FsDatastore::open(&config.store_dir)
        .with_context(|| format!("opening store {}", config.store_dir.display()))?;
    let store = Arc::new(Store::new(backend));

    match cli.command {
        Command::Import(args) => cmd_import(&config, store, args),
        Command::Context(args) => cmd_context(&store, args),
        Command::Get(args) => cmd_get(&store, args),
        Command::Resolve(args) => cmd_resolve(&config, &store, args),
    }
}

fn cmd_import(config: &MetaConfig, store: Arc<FsStore>, args: ImportArgs) -> anyhow::Result<()> {
    let mut contexts = config.contexts.clone();
    contexts.extend(args.contexts);
    let converter = XmlConverter::new(store, &contexts)?.with_config(config.encoder.clone());
    for path in &args.files {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let root = converter
            .convert(BufReader::new(file))
            .with_context(|| format!("importing {}", path.display()))?;
        println!("{} {}  {}", "✓".green(), root.to_string().yellow(), path.display());
    }
    Ok(())
}

fn cmd_context(store: &FsStore, args: ContextArgs) -> anyhow::Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let terms: BTreeMap<String, String> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON map of names to types", args.file.display()))?;
    let object = ContextDocument::from_terms(terms).to_object()?;
    store.put(&object)?;
    println!("{}", object.address().to_string().yellow());
    Ok(())
}

fn cmd_get(store: &FsStore, args: GetArgs) -> anyhow::Result<()> {
    let object = store.get(&args.address)?;
    println!("{}", serde_json::to_string_pretty(&object.to_json())?);
    Ok(())
}

fn cmd_resolve(config: &MetaConfig, store: &FsStore, args: ResolveArgs) -> anyhow::Result<()> {
    let path = split_path(&args.path);
    let graph = Graph::open(store, &args.address)?.with_config(config.graph.clone());
    match graph.get(&path)? {
        Resolved::Object(root) => println!("{}", serde_json::to_string_pretty(&root.to_json())?),
        Resolved::Value(Node::Link(address)) => println!("{}", address.to_string().yellow()),
        Resolved::Value(Node::String(s)) => println!("{s}"),
        Resolved::Value(other) => println!("{}", serde_json::to_string_pretty(&other.to_json())?),
    }
    Ok(())
}

fn split_path(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}
