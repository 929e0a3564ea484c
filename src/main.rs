use ams_ctl::cli::Args;
use ams_ctl::commands::{run_offline, Session};
use ams_ctl::config::{AppConfig, ServerProfile};
use ams_ctl::Error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;

    if let Some(result) = run_offline(&config, &args.command) {
        return Ok(result?);
    }

    let profile = match (&args.profile, &args.server) {
        (Some(name), _) => config.profiles.get(name)?.clone(),
        (None, Some(address)) => ServerProfile::from_address(address)?,
        (None, None) => {
            let known: Vec<&str> = config.profiles.names().collect();
            return Err(Error::Config(format!(
                "choose a server with --profile <name> or --server <host[:port]> (profiles: {})",
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            ))
            .into());
        }
    };

    let session = Session::new(config, profile)?;
    session.run(args.command).await?;
    anyhow::Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
