//! goinspect CLI
//!
//! Attributes types to the package-level declarations of a Go package and
//! prints them.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::info;

use goinspect::package::PackageState;
use goinspect::{Config, PackageReport, Session};

/// Static type attribution for Go packages
#[derive(Parser, Debug)]
#[command(name = "goinspect")]
#[command(author = "Z1529")]
#[command(version = "0.1.0")]
#[command(about = "goinspect - static type attribution for Go packages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect a package and list its declarations with their types
    Inspect {
        /// Package path, relative to the root
        path: String,

        /// Directory package paths are resolved against
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Also inspect every package reachable through imports
        #[arg(long)]
        deep: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Include _test files
        #[arg(long)]
        tests: bool,

        /// Parse files on the calling thread
        #[arg(long)]
        sequential: bool,
    },
    /// Print the type of a package-level name or qualified name
    Type {
        /// Package path, relative to the root
        path: String,

        /// Name, e.g. `Config` or `http.Client`
        name: String,

        /// Directory package paths are resolved against
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Inspect { path, root, deep, json, tests, sequential } => {
            let config = Config::default()
                .with_root(root)
                .with_tests(tests)
                .with_parallel(!sequential);
            inspect(config, &path, deep, json)
        }
        Commands::Type { path, name, root } => {
            let mut session = Session::new(Config::default().with_root(root));
            let ty = session
                .lookup(&path, &name)
                .with_context(|| format!("failed to resolve {} in {}", name, path))?;
            match ty {
                Some(ty) => println!("{}", session.type_string(ty)),
                None => bail!("type of {} could not be determined", name),
            }
            Ok(())
        }
        Commands::Version => {
            println!("goinspect 0.1.0");
            println!("License: Apache-2.0");
            Ok(())
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn inspect(config: Config, path: &str, deep: bool, json: bool) -> Result<()> {
    let mut session = Session::new(config);
    let root = if deep { session.inspect_all(path) } else { session.inspect(path) }
        .with_context(|| format!("failed to inspect package {}", path))?;

    let reports: Vec<PackageReport> = if deep {
        session
            .packages()
            .filter(|(_, package)| package.state == PackageState::Inspected)
            .map(|(id, _)| PackageReport::build(&session, id))
            .collect()
    } else {
        vec![PackageReport::build(&session, root)]
    };
    info!("inspected {} package(s)", reports.len());

    if json {
        let out = match reports.as_slice() {
            [single] => single.to_json(),
            all => serde_json::to_string_pretty(all).context("failed to serialize reports")?,
        };
        println!("{}", out);
    } else {
        let listings: Vec<String> = reports.iter().map(PackageReport::to_text).collect();
        print!("{}", listings.join("\n"));
    }
    Ok(())
}
