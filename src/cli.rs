use anyhow::{bail, Result};

use crate::manifest::{self, ManifestSource};
use crate::unit::ServiceConfig;

/// Parsed command line, before manifest resolution.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub manifest: Option<String>,
    pub server_path: Option<String>,
    pub service_name: Option<String>,
    pub user: Option<String>,
    pub working_dir: Option<String>,
    pub show_help: bool,
}

pub fn print_usage() {
    println!(
        r#"autostart-install - Create and enable a systemd service to auto-start a server binary

Usage:
    autostart-install [OPTIONS] [MANIFEST]

Arguments:
    MANIFEST    Optional YAML/JSON manifest file with the settings below
                (use '-' to read the manifest from stdin)

Options:
    --server-path <path>   Absolute path to the server binary (default: /home/ctf-pi/server)
    --service-name <name>  Systemd service name (default: myserver)
    --user <user>          Linux user to run the service (default: ctf-pi)
    --working-dir <dir>    Working directory for the server (default: /home/ctf-pi)
    -h, --help             Show this help message

If your server uses WEB_ROOT='./build', set --working-dir to the repo root.
Flags override manifest values.
"#
    );
}

/// Parse command line arguments (everything after the program name).
pub fn parse(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.show_help = true,
            "--server-path" => parsed.server_path = Some(flag_value(&mut iter, arg)?),
            "--service-name" => parsed.service_name = Some(flag_value(&mut iter, arg)?),
            "--user" => parsed.user = Some(flag_value(&mut iter, arg)?),
            "--working-dir" => parsed.working_dir = Some(flag_value(&mut iter, arg)?),
            "-" => parsed.manifest = Some("-".into()),
            other if other.starts_with('-') => {
                bail!("Unknown option: {}", other);
            }
            other => {
                if parsed.manifest.is_some() {
                    bail!("Unexpected argument: {}", other);
                }
                parsed.manifest = Some(other.to_string());
            }
        }
    }

    Ok(parsed)
}

fn flag_value<'a, I>(iter: &mut I, flag: &str) -> Result<String>
where
    I: Iterator<Item = &'a String>,
{
    match iter.next() {
        Some(value) => Ok(value.clone()),
        None => bail!("Missing value for {}", flag),
    }
}

/// Resolve the final service configuration: defaults, then manifest, then flags.
pub fn resolve(args: &CliArgs) -> Result<ServiceConfig> {
    let source = ManifestSource::from_arg(args.manifest.as_deref());
    tracing::debug!("manifest source: {:?}", source);

    let m = manifest::load(&source)?;

    Ok(ServiceConfig {
        server_path: args.server_path.clone().unwrap_or(m.server_path),
        service_name: args.service_name.clone().unwrap_or(m.service_name),
        user: args.user.clone().unwrap_or(m.user),
        working_dir: args.working_dir.clone().unwrap_or(m.working_dir),
    })
}
