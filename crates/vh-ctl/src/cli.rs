use std::path::PathBuf;

use vh_core::services::settings_loader::DEFAULT_SETTINGS_PATH;

pub const USAGE: &str = "\
usage: vhctl [--debug] [--json] [--settings <path>] <command>

commands:
  status               show websites, ports and backends
  apply                generate configuration, restart services, run checks
  check                run sanity checks only
  init                 create an empty document if none exists
  add-website <name>   add a website listening on port 80 (in maintenance)
  enable <slug>        enable a website
  disable <slug>       disable a website
  maintenance <slug> <on|off>
                       serve 503 for a website, or take it live";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Apply,
    Check,
    Init,
    AddWebsite(String),
    Enable(String),
    Disable(String),
    Maintenance(String, bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub debug: bool,
    pub json: bool,
    pub settings_path: PathBuf,
    pub command: Command,
}

/// Parse arguments (without the program name).
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut debug = false;
    let mut json = false;
    let mut settings_path = PathBuf::from(DEFAULT_SETTINGS_PATH);
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" => debug = true,
            "--json" => json = true,
            "--settings" => {
                let path = iter.next().ok_or("--settings requires a path")?;
                settings_path = PathBuf::from(path);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{flag}'")),
            other => positional.push(other),
        }
    }

    let command = match positional.as_slice() {
        ["status"] => Command::Status,
        ["apply"] => Command::Apply,
        ["check"] => Command::Check,
        ["init"] => Command::Init,
        ["add-website", name] => Command::AddWebsite(name.to_string()),
        ["enable", slug] => Command::Enable(slug.to_string()),
        ["disable", slug] => Command::Disable(slug.to_string()),
        ["maintenance", slug, "on"] => Command::Maintenance(slug.to_string(), true),
        ["maintenance", slug, "off"] => Command::Maintenance(slug.to_string(), false),
        [] => return Err("missing command".to_string()),
        [command, ..] => return Err(format!("invalid arguments for '{command}'")),
    };

    Ok(CliArgs {
        debug,
        json,
        settings_path,
        command,
    })
}
