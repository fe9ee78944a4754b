//! `mangabridge id` command.

use crate::ids::fallback_id;

/// Execute the `id` command: print the fallback id generated for `seed`.
///
/// # Errors
///
/// Never fails; returns `Result` to match the other command handlers.
pub fn run(seed: &str) -> Result<(), String> {
    println!("{}", fallback_id(seed));
    Ok(())
}
