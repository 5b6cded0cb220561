use color_eyre::eyre::{bail, eyre};
use tracing::info;

use vh_core::models::Website;
use vh_core::services::manager::VirtualHostManager;
use vh_core::services::settings_loader;
use vh_ctl::cli::{self, CliArgs, Command};
use vh_ctl::report;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match cli::parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let _guard = if cli.debug {
        Some(setup_debug_logging())
    } else {
        setup_logging();
        None
    };

    let settings = settings_loader::load(&cli.settings_path)?;
    let mut manager = VirtualHostManager::from_settings(&settings)?;
    manager.reload().await?;

    run(&cli, &mut manager).await
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Configure file-based tracing to `vhctl-debug.log` in CWD.
/// Returns the guard that must be held alive for the duration of the program.
fn setup_debug_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let file_appender = tracing_appender::rolling::never(".", "vhctl-debug.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_ansi(false)
        .init();

    guard
}

async fn run(cli: &CliArgs, manager: &mut VirtualHostManager) -> color_eyre::Result<()> {
    match &cli.command {
        Command::Status => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(manager.config())?);
            } else {
                print!("{}", report::render_status(manager));
            }
        }
        Command::Apply => {
            if !manager.is_configured() {
                bail!("nothing to apply: no saved configuration (run `vhctl init` first)");
            }
            let pass = manager.reconcile().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&pass)?);
            } else {
                print!("{}", report::render_pass(&pass));
            }
            if !pass.is_healthy() {
                info!("pass finished in a degraded state");
            }
        }
        Command::Check => {
            let checks = manager.run_checks().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(checks)?);
            } else {
                print!("{}", report::render_checks(checks));
            }
        }
        Command::Init => {
            if manager.is_configured() {
                println!("already configured");
            } else {
                manager.save().await?;
                println!("created empty configuration");
            }
        }
        Command::AddWebsite(name) => {
            let website = Website::create(name);
            let slug = website.slug.clone();
            manager.config_mut().websites.push(website);
            if let Err(e) = manager.config().validate() {
                manager.config_mut().websites.pop();
                return Err(e.into());
            }
            manager.save().await?;
            println!("added website '{slug}' (maintenance mode on)");
        }
        Command::Enable(slug) | Command::Disable(slug) => {
            let enable = matches!(cli.command, Command::Enable(_));
            let website = manager
                .config_mut()
                .website_mut(slug)
                .ok_or_else(|| eyre!("no website with slug '{slug}'"))?;
            website.enabled = enable;
            manager.save().await?;
            let state = if enable { "enabled" } else { "disabled" };
            println!("{state} '{slug}'");
        }
        Command::Maintenance(slug, on) => {
            let website = manager
                .config_mut()
                .website_mut(slug)
                .ok_or_else(|| eyre!("no website with slug '{slug}'"))?;
            website.maintenance_mode = *on;
            manager.save().await?;
            let state = if *on { "on" } else { "off" };
            println!("maintenance {state} for '{slug}'");
        }
    }
    Ok(())
}
