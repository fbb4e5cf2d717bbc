use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use h5p_deps::cache::{CacheStore, GraphCache};
use h5p_deps::config::Config;
use h5p_deps::library::source::HttpLibrarySource;
use h5p_deps::library::{Mode, VersionSpec};
use h5p_deps::registry::loader::RegistryLoader;
use h5p_deps::registry::source::HttpRegistrySource;
use h5p_deps::resolver::DependencyResolver;
use h5p_deps::verify::SetupVerifier;
use h5p_deps::version::VersionResolver;
use h5p_deps::version::vcs::GitTagProvider;

#[derive(Parser)]
#[command(name = "h5p-deps")]
#[command(version, about = "Dependency graph resolver for H5P libraries")]
struct Cli {
    /// Path to a JSON config file overriding the default folders and
    /// endpoints.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a library's full dependency graph and print it as JSON.
    Resolve {
        /// Repo name of the root library, e.g. h5p-accordion.
        library: String,

        /// Resolution mode: view (runtime) or edit (authoring).
        #[arg(long, default_value = "view")]
        mode: Mode,

        /// Requested version or branch for the root ("master" tracks latest).
        #[arg(long = "at", default_value = VersionSpec::LATEST_REF)]
        at: String,

        /// Resolve from local library folders instead of remote sources,
        /// starting at this folder name.
        #[arg(long)]
        folder: Option<String>,

        /// Print the cached graph if one exists, skipping resolution.
        #[arg(long)]
        use_cache: bool,

        /// Refetch the registry snapshot before resolving.
        #[arg(long)]
        refresh_registry: bool,
    },

    /// Check that a library's caches and install folders are in place.
    Verify {
        /// Repo name of the library to check.
        library: String,
    },

    /// List a library repository's version tags, most recent first.
    Tags {
        org: String,
        repo: String,

        /// Pin this major.minor to its latest tagged patch instead of
        /// listing.
        #[arg(long)]
        pin: Option<String>,
    },

    /// Refresh the cached registry snapshot and print a summary.
    Registry {
        /// Refetch even when a snapshot is already cached.
        #[arg(long)]
        refresh: bool,
    },
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    if let Some(path) = dirs::config_dir().map(|dir| dir.join("h5p-deps/config.json"))
        && path.exists()
    {
        return Ok(Config::load(path)?);
    }
    Ok(Config::default())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let store = CacheStore::new(&config.folders.cache);

    match cli.command {
        Command::Resolve {
            library,
            mode,
            at,
            folder,
            use_cache,
            refresh_registry,
        } => {
            let graphs = GraphCache::new(store.clone());
            if use_cache && !refresh_registry && graphs.exists(&library, mode) {
                let graph = graphs.load(&library, mode)?;
                println!("{}", serde_json::to_string_pretty(&graph)?);
                return Ok(());
            }

            let loader = RegistryLoader::new(
                Arc::new(HttpRegistrySource::new(&config.urls.registry)),
                store,
            );
            let registry = loader.get(refresh_registry).await?;
            let source = Arc::new(HttpLibrarySource::new(
                &config.urls,
                &config.folders.libraries,
            ));

            let resolver = DependencyResolver::new(registry, source);
            let graph = resolver
                .resolve(&library, mode, VersionSpec::parse(&at), folder)
                .await?;

            graphs.save(&library, mode, &graph)?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }

        Command::Verify { library } => {
            let graphs = GraphCache::new(store.clone());
            let verifier = SetupVerifier::new(store, graphs, &config.folders.libraries);
            let report = verifier.verify(&library);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.ok {
                std::process::exit(1);
            }
        }

        Command::Tags { org, repo, pin } => {
            let provider = GitTagProvider::new(&config.folders.libraries, &config.urls.clone);
            let resolver = VersionResolver::new(provider);
            match pin {
                Some(major_minor) => {
                    println!("{}", resolver.pin_patch(&org, &repo, &major_minor).await?);
                }
                None => {
                    for tag in resolver.tags(&org, &repo).await? {
                        println!("{tag}");
                    }
                }
            }
        }

        Command::Registry { refresh } => {
            let loader = RegistryLoader::new(
                Arc::new(HttpRegistrySource::new(&config.urls.registry)),
                store,
            );
            let index = loader.get(refresh).await?;
            println!("{} libraries in registry", index.len());
        }
    }

    Ok(())
}
