//! The `sqlgrade normalize` command.

use anyhow::Result;

pub fn execute(sql: String) -> Result<()> {
    println!("{}", sqlgrade_core::normalize(&sql));
    Ok(())
}
