use anyhow::Result;
use qrbench_core::model::DEFAULT_TARGETS;

/// Print the built-in benchmark target strings.
pub fn list_targets_command(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&DEFAULT_TARGETS)?);
        return Ok(());
    }

    println!("Default targets ({}):", DEFAULT_TARGETS.len());
    for (i, target) in DEFAULT_TARGETS.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, target);
    }
    Ok(())
}
