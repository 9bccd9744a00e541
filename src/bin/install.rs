use anyhow::Result;
use std::env;
use tracing_subscriber::EnvFilter;

use autostart::cli;
use autostart::cmd::HostRunner;
use autostart::install::Installer;
use autostart::paths;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let parsed = cli::parse(&args[1..])?;

    if parsed.show_help {
        cli::print_usage();
        return Ok(());
    }

    let config = cli::resolve(&parsed)?;

    println!("\n=== Autostart Installer ===\n");
    println!("  Service:     {}", config.service_name);
    println!("  Binary:      {}", config.server_path);
    println!("  Run as:      {}", config.user);
    println!("  Working dir: {}", config.working_dir);
    println!();

    preflight();

    println!(
        "Creating systemd service file at {}...",
        paths::unit_path(&config.service_name).display()
    );

    let runner = HostRunner::new();
    let installer = Installer::new(&runner);
    installer.run(&config.service_name, &config.unit_text())?;

    print_success(&config.service_name);

    Ok(())
}

/// Warn early about missing host tools; the install itself will still report
/// the failing step if one is absent.
fn preflight() {
    if which::which("systemctl").is_err() {
        println!("Warning: systemctl not found in PATH, install will likely fail");
    }

    if !nix::unistd::Uid::effective().is_root() && which::which("sudo").is_err() {
        println!("Warning: sudo not found in PATH and not running as root");
    }
}

fn print_success(service_name: &str) {
    println!("\n✓ Service installed and started successfully!");
    println!("\nUseful commands:");
    println!("  Check status: sudo systemctl status {}", service_name);
    println!("  Stop service: sudo systemctl stop {}", service_name);
    println!("  Restart service: sudo systemctl restart {}", service_name);
    println!("  View logs: sudo journalctl -u {} -f", service_name);
}
