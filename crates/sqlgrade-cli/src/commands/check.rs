//! The `sqlgrade check` command.

use anyhow::Result;

use sqlgrade_core::compare;

pub fn execute(
    candidate: String,
    reference: String,
    verbose: bool,
    fail_on_mismatch: bool,
) -> Result<()> {
    let verdict = compare(&candidate, &reference);

    if verdict.is_match {
        println!("MATCH");
    } else {
        println!("NO MATCH");
    }

    if verbose {
        println!("  candidate: {}", verdict.candidate);
        println!("  reference: {}", verdict.reference);
    }

    if fail_on_mismatch && !verdict.is_match {
        std::process::exit(1);
    }

    Ok(())
}
