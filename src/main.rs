use anyhow::Result;
use calltrace::cli::{Cli, OutputFormat};
use calltrace::config::CalltraceConfig;
use calltrace::logger::{CallerLogger, TracingSink};
use calltrace::registry::ExportRegistry;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Print the injectable operation allow-list
fn print_exports(registry: &ExportRegistry, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("Injectable operations:");
            for export in registry.exports() {
                match &export.description {
                    Some(description) => println!("  {} - {}", export.name, description),
                    None => println!("  {}", export.name),
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(registry.exports())?);
        }
    }
    Ok(())
}

/// Named probe site, so the emitted record demonstrates resolution end to end
#[inline(never)]
fn probe_site(logger: &CallerLogger) {
    logger.trace_log();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let registry = match &cli.registry {
        Some(path) => ExportRegistry::from_toml(path)?,
        None => ExportRegistry::builtin()?,
    };

    if cli.exports {
        print_exports(&registry, cli.format)?;
    }

    if cli.probe {
        let mut config = CalltraceConfig::load(cli.config.as_deref())?;
        if let Some(strategy) = cli.strategy {
            config.strategy_kind = strategy.into();
        }
        if let Some(depth) = cli.stack_depth {
            config.stack_depth = depth;
        }

        let logger = CallerLogger::new(&config, Box::new(TracingSink));
        probe_site(&logger);
        println!("probe record emitted");
    }

    Ok(())
}
