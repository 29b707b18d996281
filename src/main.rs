use clap::Parser;
use env_logger::Env;

use bundle_crc::actions::perform_action;
use bundle_crc::cli::Cli;
use bundle_crc::config::Config;

fn log_level(verbose: u8, quiet: u8) -> &'static str {
    if quiet > 0 {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level(cli.verbose, cli.quiet)))
        .init();

    let config = Config::try_from(cli)?;
    let report = perform_action(&config)?;
    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.render() {
            println!("{line}");
        }
    }

    if report.is_failure() {
        anyhow::bail!("one or more files could not be fixed");
    }
    Ok(())
}
