use std::process;

use clap::{Parser, Subcommand};
use memscope_core::config::EngineConfig;
use memscope_core::render::Renderer;
use memscope_core::{standard_registry, InspectResult};
use memscope_utils::{info, init_logging_with, LogLevel, LoggingConfig};

mod demo;

use demo::Scenario;

/// Render structured views of raw memory through registered type decoders.
#[derive(Parser, Debug)]
#[command(name = "memscope")]
#[command(version)]
#[command(about = "Render structured views of raw memory through registered type decoders", long_about = None)]
struct Cli
{
    /// Deepest level whose children are expanded
    #[arg(long, global = true)]
    max_depth: Option<usize>,
    /// Children expanded per node
    #[arg(long, global = true)]
    max_children: Option<usize>,
    /// Project namespace the catalogue registers under (e.g. BTS)
    #[arg(long, global = true)]
    namespace: Option<String>,
    /// Linear-algebra namespace (e.g. MR::Math)
    #[arg(long, global = true)]
    math_namespace: Option<String>,
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Decode and print a built-in memory image
    Demo
    {
        /// Which value to build
        #[arg(value_enum)]
        scenario: Scenario,
    },
    /// List registered type patterns in lookup order
    Patterns,
}

fn main()
{
    let cli = Cli::parse();

    // Reads RUST_LOG and MEMSCOPE_LOG_* unless --log-level is given
    let mut logging = LoggingConfig::from_env();
    if let Some(level) = cli.log_level {
        logging = logging.with_level(level);
    }
    let _guard = match init_logging_with(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Environment configuration with command-line flags applied on top.
fn engine_config(cli: &Cli) -> InspectResult<EngineConfig>
{
    let mut config = EngineConfig::from_env()?;
    if let Some(depth) = cli.max_depth {
        config.limits.max_depth = depth;
    }
    if let Some(children) = cli.max_children {
        config.limits.max_children = children;
    }
    if let Some(root) = &cli.namespace {
        config.namespace.root = root.trim_end_matches("::").to_string();
    }
    if let Some(math) = &cli.math_namespace {
        config.namespace.math = math.trim_end_matches("::").to_string();
    }
    Ok(config)
}

fn run_command(cli: Cli) -> InspectResult<()>
{
    let config = engine_config(&cli)?;
    let registry = standard_registry(&config.namespace)?;

    match cli.command {
        Commands::Demo { scenario } => {
            info!("Rendering demo {:?} under namespace {}", scenario, config.namespace.root);
            let handle = demo::build(scenario, &config)?;
            let node = Renderer::new(&registry, config.limits).render(&handle);
            print!("{node}");
            Ok(())
        }
        Commands::Patterns => {
            for (index, pattern) in registry.patterns().enumerate() {
                println!("{index:>3}  {pattern}");
            }
            Ok(())
        }
    }
}
