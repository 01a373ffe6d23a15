//! Render command

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use tracing::info;

use authop_common::config::load_document;
use authop_common::{AuthenticationSpec, ProxyStatus, OAUTH_SERVER_IMAGE_ENV};
use authop_deployment::{DeploymentSynthesizer, DeploymentTemplate};

use super::read_file;
use crate::{Error, Result};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Authentication operator spec (YAML or JSON) with logLevel and observedConfig
    #[arg(long)]
    pub operator_config: PathBuf,

    /// Deployment template; defaults to the packaged template
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Cluster proxy status (YAML or JSON)
    #[arg(long)]
    pub proxy: Option<PathBuf>,

    /// Version marker of a resource the Deployment depends on (repeatable)
    #[arg(long = "resource-version", short = 'r')]
    pub resource_versions: Vec<String>,

    /// The bootstrap user still exists
    #[arg(long)]
    pub bootstrap_user_exists: bool,

    /// OAuth server image reference
    #[arg(long, env = OAUTH_SERVER_IMAGE_ENV)]
    pub image: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

pub fn run(args: RenderArgs) -> Result<String> {
    let template = match &args.template {
        Some(path) => DeploymentTemplate::from_yaml(&read_file(path)?)?,
        None => DeploymentTemplate::bundled()?,
    };

    let spec: AuthenticationSpec =
        load_document(&read_file(&args.operator_config)?, "AuthenticationSpec")?;

    let proxy: ProxyStatus = match &args.proxy {
        Some(path) => load_document(&read_file(path)?, "ProxyStatus")?,
        None => ProxyStatus::default(),
    };

    let image = match (&args.image, template.image_is_placeholder()) {
        (Some(image), _) => image.as_str(),
        (None, false) => "",
        (None, true) => {
            return Err(Error::MissingImage {
                env: OAUTH_SERVER_IMAGE_ENV,
            })
        }
    };

    let deployment = DeploymentSynthesizer::new(&template, image)
        .with_proxy(&proxy)
        .with_bootstrap_user_exists(args.bootstrap_user_exists)
        .with_resource_versions(&args.resource_versions)
        .synthesize(&spec)?;

    info!(
        resource_versions = args.resource_versions.len(),
        format = ?args.output,
        "rendered deployment"
    );

    match args.output {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&deployment)?),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&deployment)?),
    }
}
