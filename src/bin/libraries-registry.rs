use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libraries_registry::{
    machine_name, process_libraries, registry_filename, Discovery, JsonFileSource, RegistryConfig,
    RegistryLayout, RegistryStream,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    /// <project>/registry
    Legacy,
    /// <project>/registry/8
    Current,
}

impl From<Layout> for RegistryLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Legacy => RegistryLayout::Legacy,
            Layout::Current => RegistryLayout::Current,
        }
    }
}

#[derive(Parser)]
#[command(name = "libraries-registry")]
#[command(
    version,
    about = "Convert legacy libraries_info definitions into registry files",
    long_about = None
)]
struct Cli {
    /// Project root containing the registry directory
    #[arg(long, global = true, default_value = ".")]
    project_root: PathBuf,

    /// Registry directory layout under the project root
    #[arg(long, global = true, value_enum, default_value = "legacy")]
    layout: Layout,

    /// Use this registry directory instead of one derived from the project root
    #[arg(long, global = true)]
    registry_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every library and write the registry files
    Process {
        /// JSON export(s) of libraries_info data, read in order
        #[arg(short, long = "source", required = true)]
        sources: Vec<PathBuf>,
    },
    /// List registry files
    List,
    /// Print the registry file for a library
    Show {
        /// Library name (normalized to its machine name)
        name: String,
    },
    /// Ask for the public URL of a registry file (always refused)
    Url {
        /// Library name (normalized to its machine name)
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.registry_dir {
        Some(dir) => RegistryConfig::with_root(dir),
        None => RegistryConfig::for_project(&cli.project_root, cli.layout.into()),
    };
    let registry = RegistryStream::new(config);
    info!("{} at {}", registry.name(), registry.directory_path().display());

    match cli.command {
        Commands::Process { sources } => {
            let mut discovery = Discovery::new();
            for source in sources {
                discovery.register(JsonFileSource::new(source));
            }

            let report = process_libraries(&discovery, &registry)
                .context("Failed to process libraries")?;
            for warning in &report.warnings {
                eprintln!("warning: {}", warning);
            }
            for failure in &report.failures {
                eprintln!("error: {}: {}", failure.filename, failure.error);
            }
            println!(
                "{} (finished {})",
                report.summary(),
                report.finished_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        Commands::List => {
            let root = registry.uri("");
            for entry in registry.list(&root).context("Failed to list registry")? {
                if !entry.is_dir {
                    println!("{}", entry.uri);
                }
            }
        }
        Commands::Show { name } => {
            let uri = registry.uri(&registry_filename(&machine_name(&name)));
            let contents = registry
                .read_to_string(&uri)
                .with_context(|| format!("Failed to read {}", uri))?;
            println!("{}", contents);
        }
        Commands::Url { name } => {
            let uri = registry.uri(&registry_filename(&machine_name(&name)));
            let url = registry.external_url(&uri)?;
            println!("{}", url);
        }
    }

    Ok(())
}
