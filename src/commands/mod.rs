// ABOUTME: Command module aggregator for the cumulo CLI.
// ABOUTME: Re-exports deploy, inspection, and delete command handlers.

mod delete;
mod deploy;
mod inspect;

pub use delete::delete;
pub use deploy::{Mode, deploy};
pub use inspect::{list_resources, monitor, status, troubleshoot};

use crate::cli::GroupArgs;
use cumulo::azure::AzCli;
use cumulo::config::resolve_subscription;

/// Build an `az` client scoped to the group's subscription.
fn az_for(args: &GroupArgs) -> AzCli {
    AzCli::new().with_subscription(resolve_subscription(args.subscription_id.clone()))
}
