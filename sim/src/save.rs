use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use bevy_log::info;
use buoyancy::PersistedState;
use ron::ser::PrettyConfig;

/// Persisted module states, in module order.
pub fn load_part_state(path: &Path) -> Result<Option<Vec<PersistedState>>, Box<dyn std::error::Error>> {
    if !path.exists() {
        info!(
            "Part state file not found: {}. Starting from config defaults.",
            path.display()
        );
        return Ok(None);
    }

    let contents: String = fs::read_to_string(path)?;
    let states: Vec<PersistedState> = ron::de::from_str(&contents)?;

    info!("Found part state file from disk: {}", path.display());
    Ok(Some(states))
}

pub fn save_part_state(
    states: &[PersistedState],
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let pretty_config = PrettyConfig::new()
        .with_depth_limit(3)
        .with_separate_tuple_members(true)
        .with_enumerate_arrays(true);

    let serialized = ron::ser::to_string_pretty(&states, pretty_config)?;
    let mut file = File::create(path)?;
    file.write_all(serialized.as_bytes())?;
    info!("Part state saved to {}", path.display());
    Ok(())
}
