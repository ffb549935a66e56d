use log::{debug, error};
use simplelog::{Config as LogConfig, TermLogger, TerminalMode};
use structopt::StructOpt;
use track_scrubber::cli::Cli;
use track_scrubber::config::Config;
use track_scrubber::config_file;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Cli::from_args();

    // an explicitly requested file must exist, the default one is optional
    let config = match opt.config() {
        Some(path) => Config::from_path(path)?,
        None => {
            let path = config_file();
            if path.exists() {
                Config::from_path(&path)?
            } else {
                Config::default()
            }
        }
    };
    TermLogger::init(
        opt.verbosity(config.log_level()),
        LogConfig::default(),
        TerminalMode::Mixed,
    )?;
    debug!("Default configuration file location: {:?}", config_file());

    // execute subcommand
    if let Err(e) = opt.execute_subcommand(config) {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}
