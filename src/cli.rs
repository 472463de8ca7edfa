// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use cumulo::config::Environment;
use cumulo::output::OutputMode;
use cumulo::types::{RegionName, ResourceGroupName};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cumulo")]
#[command(about = "Bicep deployments with failure-aware retries and region selection")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output mode: normal, quiet, or json
    #[arg(long, global = true, default_value = "normal")]
    pub output: OutputMode,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate, lint, plan, deploy, and verify a template
    Deploy(DeployArgs),

    /// Validate, lint, and preview changes without deploying
    Plan(DeployArgs),

    /// Show the resource group and its latest deployment
    Status(GroupArgs),

    /// Poll the latest deployment until it finishes
    Monitor(GroupArgs),

    /// Classify failed operations of the latest deployment
    Troubleshoot(GroupArgs),

    /// List resources in the resource group
    ListResources(GroupArgs),

    /// Delete the resource group
    Delete {
        #[command(flatten)]
        group: GroupArgs,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Target resource group
    #[arg(short = 'g', long)]
    pub resource_group: ResourceGroupName,

    /// Primary region
    #[arg(short, long)]
    pub location: RegionName,

    /// Target environment: dev, staging, or prod
    #[arg(short, long)]
    pub environment: Environment,

    /// Bicep or ARM template (defaults to the project file's template)
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// Region for machine-learning resources
    #[arg(long)]
    pub location_ml: Option<RegionName>,

    /// Parameters file
    #[arg(short, long)]
    pub parameters: Option<PathBuf>,

    /// Subscription (defaults to AZURE_SUBSCRIPTION_ID)
    #[arg(long)]
    pub subscription_id: Option<String>,

    /// Git commit used to name the deployment
    #[arg(long)]
    pub git_sha: Option<String>,

    /// Continue when the linter reports warnings
    #[arg(long)]
    pub allow_warnings: bool,

    /// Skip post-deployment health verification
    #[arg(long)]
    pub skip_health: bool,

    /// Proceed even when the plan deletes resources
    #[arg(long)]
    pub no_confirm_deletes: bool,
}

#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Target resource group
    #[arg(short = 'g', long)]
    pub resource_group: ResourceGroupName,

    /// Subscription (defaults to AZURE_SUBSCRIPTION_ID)
    #[arg(long)]
    pub subscription_id: Option<String>,
}
