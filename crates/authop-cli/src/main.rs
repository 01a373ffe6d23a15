//! authop CLI
//!
//! Renders the OAuth server Deployment from files on disk.

use clap::Parser;

use authop_cli::{Cli, Result};
use authop_common::telemetry::{init_telemetry, TelemetryConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_telemetry(TelemetryConfig {
        service_name: "authop-cli".to_string(),
        json: cli.log_json,
        ..Default::default()
    })?;

    cli.run()
}
