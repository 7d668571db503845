/// `config` subcommand.
pub mod config;
/// `simulate` subcommand.
pub mod simulate;

use std::path::Path;

use tw_simulation::SimConfig;

/// Read a JSON configuration, or the defaults when no path is given.
fn load_config(path: Option<&Path>) -> Result<SimConfig, String> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let config: SimConfig = serde_json::from_str(&text)
        .map_err(|e| format!("invalid configuration in {}: {e}", path.display()))?;
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Format world hours as "day D, HH:MM".
fn format_time(hours: f64) -> String {
    let day = (hours / 24.0).floor() as u64 + 1;
    let minutes = (hours.rem_euclid(24.0) * 60.0).round() as u64;
    let (hh, mm) = (minutes / 60, minutes % 60);
    if hh >= 24 {
        format!("day {}, 00:00", day + 1)
    } else {
        format!("day {day}, {hh:02}:{mm:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_shown_as_day_and_clock() {
        assert_eq!(format_time(0.0), "day 1, 00:00");
        assert_eq!(format_time(13.5), "day 1, 13:30");
        assert_eq!(format_time(24.0), "day 2, 00:00");
        assert_eq!(format_time(47.9999), "day 3, 00:00");
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(load_config(None).unwrap(), SimConfig::default());
    }
}
