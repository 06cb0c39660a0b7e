use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use meta_types::Address;

#[derive(Parser)]
#[command(
    name = "meta",
    about = "META: content-addressed music metadata",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Store directory, overriding the configuration
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Canonicalize XML documents into the store
    Import(ImportArgs),
    /// Publish a JSON name-to-type map as a context document
    Context(ContextArgs),
    /// Print an object as JSON
    Get(GetArgs),
    /// Resolve a slash-separated path from an object
    Resolve(ResolveArgs),
}

#[derive(Args)]
pub struct ImportArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Context document address, consulted after configured contexts
    #[arg(long = "context")]
    pub contexts: Vec<Address>,
}

#[derive(Args)]
pub struct ContextArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub address: Address,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub address: Address,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use meta_types::{Codec, HashFunction};

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_accepts_repeated_contexts() {
        let a = Address::new(Codec::Node, HashFunction::Blake3, [0xab; 32]).to_string();
        let b = Address::new(Codec::Node, HashFunction::Blake3, [0xcd; 32]).to_string();
        let cli = Cli::try_parse_from([
            "meta", "--store", "/tmp/s", "import", "a.xml", "b.xml", "--context", &a, "--context", &b,
        ])
        .unwrap();
        let Command::Import(args) = cli.command else {
            panic!("expected import");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.contexts.len(), 2);
        assert_eq!(args.contexts[0].to_string(), a);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/s")));
    }

    #[test]
    fn malformed_address_rejected() {
        assert!(Cli::try_parse_from(["meta", "get", "not-an-address"]).is_err());
    }
}
