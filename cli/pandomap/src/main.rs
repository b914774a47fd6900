//! pandomap: command-line interface for the PANDO simulator address map.

mod commands;
mod source;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use pando_addrmap::{AddressMode, AddressType, CoreId};

use source::TopologySource;

#[derive(Parser)]
#[command(
    name = "pandomap",
    version,
    about = "Address map generator for the PANDO simulator"
)]
struct Cli {
    #[command(flatten)]
    source: TopologySource,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for tabular commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the C header with every address field position
    Cheader {
        /// Output file path (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate the firmware linker script
    Ldscript {
        /// Output file path (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Show the position of every address field
    Fields {
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// Show the address range of every memory bank
    Ranges {
        #[arg(long, value_enum, default_value_t)]
        format: Format,
    },
    /// Decode a raw address
    Decode {
        /// Address (decimal, 0x hex, or 0b binary)
        #[arg(value_parser = commands::address::parse_u64)]
        address: u64,
        /// PXN of the issuing core
        #[arg(long, default_value_t = 0)]
        pxn: u64,
        /// Pod of the issuing core
        #[arg(long, default_value_t = 0)]
        pod: u64,
        /// Core id of the issuing core
        #[arg(long, default_value_t = 0)]
        core: u64,
    },
    /// Encode an address from its parts
    Encode {
        /// Memory tier (l1sp, l2sp, dram, ctrl)
        #[arg(long = "type")]
        kind: AddressType,
        /// Addressing mode (absolute, relative)
        #[arg(long, default_value_t = AddressMode::Relative)]
        mode: AddressMode,
        /// Byte offset within the tier
        #[arg(long, value_parser = commands::address::parse_u64)]
        offset: u64,
        #[arg(long)]
        pxn: Option<u64>,
        #[arg(long)]
        pod: Option<u64>,
        #[arg(long)]
        core: Option<u64>,
    },
    /// Validate the selected system definition
    Validate,
    /// Print a template .system.toml
    Template {
        /// System name
        name: String,
    },
    /// List built-in system presets
    Presets,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let source = cli.source;

    match cli.command {
        Commands::Cheader { output } => {
            commands::generate::cheader(&source.resolve()?, output.as_deref())
        }
        Commands::Ldscript { output } => {
            commands::generate::ldscript(&source.resolve()?, output.as_deref())
        }
        Commands::Fields { format } => commands::fields::run(&source.resolve()?, format),
        Commands::Ranges { format } => commands::ranges::run(&source.resolve()?, format),
        Commands::Decode {
            address,
            pxn,
            pod,
            core,
        } => commands::address::decode(
            &source.resolve()?,
            address,
            CoreId::new(pxn, pod, core),
        ),
        Commands::Encode {
            kind,
            mode,
            offset,
            pxn,
            pod,
            core,
        } => commands::address::encode(
            &source.resolve()?,
            kind,
            mode,
            offset,
            [pxn, pod, core],
        ),
        Commands::Validate => commands::system::validate(&source.resolve()?),
        Commands::Template { name } => commands::system::template(&name),
        Commands::Presets => commands::system::presets(&std::env::current_dir()?),
    }
}
