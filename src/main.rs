use clap::Parser;
use locator_healing::cli::commands::{
    cmd_classify, cmd_heal, cmd_resolve, cmd_scan, cmd_suggest, cmd_verify,
};
use locator_healing::cli::config::{Cli, Commands, load_config, log_directive, resolve_settings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_directive(cli.verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref());
    let settings = resolve_settings(&cli, &config);

    match &cli.command {
        Commands::Scan { document, .. } => {
            cmd_scan(document, &settings, cli.json)?;
        }
        Commands::Classify { text } => {
            cmd_classify(text, &settings, cli.json)?;
        }
        Commands::Resolve {
            document,
            records,
            element,
        } => {
            let all_resolved = cmd_resolve(document, records, element.as_deref(), &settings, cli.json)?;
            if !all_resolved {
                std::process::exit(1);
            }
        }
        Commands::Heal {
            document,
            records,
            output,
        } => {
            cmd_heal(document, records, output.as_deref(), &settings, cli.json)?;
        }
        Commands::Suggest { document, intent } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(cmd_suggest(document, intent, &settings, cli.json))?;
        }
        Commands::Verify {
            document,
            records,
            checks,
        } => {
            let all_passed = cmd_verify(document, records, checks, &settings, cli.verbose, cli.json)?;
            if !all_passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
