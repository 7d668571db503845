use std::path::Path;

use tw_simulation::SimConfig;

/// Print the default configuration as JSON, or write it to `output`.
pub fn run(output: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(&SimConfig::default())
        .map_err(|e| format!("JSON serialization error: {e}"))?;

    if let Some(path) = output {
        std::fs::write(path, format!("{json}\n"))
            .map_err(|e| format!("cannot write to {}: {e}", path.display()))?;
        println!("  Wrote default configuration to {}", path.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
