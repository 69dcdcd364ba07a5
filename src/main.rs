use clap::{Arg, Command};
use theheck::config::Settings;
use theheck::corrector;
use theheck::executor::ExecutionMode;
use theheck::fixer::Fixer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

/// `RUST_LOG` when set, otherwise `debug` or `warn`.
fn log_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "warn" }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("theheck")
        .about("Corrects the previous console command")
        .long_about("theheck re-runs a failed command, asks its rules for corrections and lets you pick one")
        .arg(Arg::new("yes")
            .short('y')
            .long("yes")
            .help("Use the first correction without confirmation")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("debug")
            .short('d')
            .long("debug")
            .help("Enable debug output")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("run")
            .long("run")
            .help("Run the chosen correction instead of printing it")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("config")
            .long("config")
            .help("Show configuration information")
            .action(clap::ArgAction::SetTrue))
        .arg(Arg::new("command")
            .help("The command that failed")
            .num_args(1..)
            .trailing_var_arg(true)
            .allow_hyphen_values(true))
        .get_matches();

    // Logging comes up before settings load so their warnings are reported.
    // The settings file may still turn debug on.
    let early_debug = matches.get_flag("debug")
        || std::env::var("THEHECK_DEBUG").is_ok_and(|value| value.trim().eq_ignore_ascii_case("true"));
    let (filter, filter_handle) = reload::Layer::new(log_filter(early_debug));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    corrector::install_rule_panic_hook();

    let mut settings = Settings::load()?;
    settings.apply_args(matches.get_flag("yes"), matches.get_flag("debug"));
    if settings.debug != early_debug {
        filter_handle.modify(|filter| *filter = log_filter(settings.debug))?;
    }

    if let Err(e) = Settings::init_file() {
        warn!("Could not create settings template: {}", e);
    }

    if matches.get_flag("config") {
        settings.show_config_info()?;
        return Ok(());
    }

    let raw: Vec<String> = matches
        .get_many::<String>("command")
        .unwrap_or_default()
        .map(|s| s.to_string())
        .collect();

    if raw.is_empty() {
        eprintln!("No command provided. Use 'theheck --help' for usage information.");
        return Ok(());
    }

    let mode = if matches.get_flag("run") { ExecutionMode::Run } else { ExecutionMode::Print };

    info!("Correcting: {:?}", raw);

    let fixer = Fixer::new(settings, mode);
    fixer.fix(&raw).await?;

    Ok(())
}
