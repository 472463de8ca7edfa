// ABOUTME: Delete command implementation.
// ABOUTME: Removes the resource group after confirmation.

use super::az_for;
use crate::cli::GroupArgs;
use cumulo::error::{Error, Result};
use cumulo::output::Output;
use std::io::{self, BufRead, Write};

pub async fn delete(args: GroupArgs, yes: bool, output: &Output) -> Result<()> {
    let az = az_for(&args);
    if az.resource_group(&args.resource_group).await?.is_none() {
        return Err(Error::ResourceGroupNotFound(args.resource_group));
    }

    if !yes && !confirm(&format!(
        "Delete resource group '{}' and everything in it? [y/N] ",
        args.resource_group
    ))? {
        return Err(Error::Aborted(format!(
            "deletion of {} not confirmed",
            args.resource_group
        )));
    }

    az.delete_group(&args.resource_group).await?;
    output.success(&format!("Deletion of {} started", args.resource_group));
    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    eprint!("{prompt}");
    io::stderr().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
