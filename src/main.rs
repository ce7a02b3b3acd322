use rmc::config::RmcConfig;
use rmc::logging::initialize_logging;
use rmc::players::create_player;
use rmc::server::{CommandDispatcher, RmcServer};
use clap::Parser;
use log::{error, info};
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Remote music control server", long_about = None)]
struct Args {
    /// Configuration file (default: /etc/rmc/rmc.json merged with ~/.rmc.json)
    #[clap(long, short)]
    config: Option<PathBuf>,

    /// Logging configuration file
    #[clap(long)]
    log_config: Option<PathBuf>,

    /// Enable debug logging
    #[clap(long, short)]
    debug: bool,

    /// Enable trace logging
    #[clap(long, short)]
    verbose: bool,

    /// Listen on this port instead of the configured one
    #[clap(long, short)]
    port: Option<u16>,

    /// Validate the configuration and exit
    #[clap(long)]
    check: bool,
}

fn load_config(args: &Args) -> Result<RmcConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => RmcConfig::from_file(path)?,
        None => RmcConfig::discover()?,
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;

    if let Err(e) = config.validate() {
        let location = args
            .config
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("~/{}", rmc::config::USER_CONFIG_FILE));
        return Err(format!("{}. Please edit {} and restart.", e, location).into());
    }
    if args.check {
        println!("Configuration is valid");
        return Ok(());
    }

    let music_dir = config.music_dir.clone().ok_or("music_dir is not set")?;
    let player = create_player(&config)?;
    let dispatcher = CommandDispatcher::new(music_dir, player, &config.extensions);
    let server = RmcServer::bind(config.listen_address(), dispatcher, config.session_settings())?;

    ctrlc::set_handler(|| {
        info!("Received Ctrl+C, shutting down");
        std::process::exit(0);
    })?;

    info!("rmc {} ready", env!("CARGO_PKG_VERSION"));
    server.run()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = initialize_logging(args.log_config.as_deref(), args.debug, args.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
