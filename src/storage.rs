//! JSON persistence of sweep results.
//!
//! One bundle per sweep, pretty-printed for the downstream plotting stage.
//! The point order inside the bundle is the grid order; loading preserves it.

use crate::sweep::SweepResults;

/// Write the results bundle to `path`, creating parent directories.
pub fn save_results(results: &SweepResults, path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let json = serde_json::to_string_pretty(results).expect("Failed to serialize sweep results");
    std::fs::write(path, json).expect("Failed to write sweep results file");
}

/// Load a results bundle. Returns None on a missing or malformed file.
pub fn load_results(path: &str) -> Option<SweepResults> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}
