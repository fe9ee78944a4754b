//! Splits a monolithic cassette YAML file into per-port cassette files.
//!
//! Usage: `cassette_split <input.yaml> <output_dir>`
//!
//! Writes `<output_dir>/<port>.cassette.yaml` for every port with at least
//! one interaction, the layout `MANGABRIDGE_REPLAY=<output_dir>` expects.

use std::collections::BTreeMap;
use std::path::Path;
use std::{env, fs, process};

use chrono::Utc;
use mangabridge::cassette::format::{Cassette, Interaction};

/// A per-port cassette that links back to the original recording session.
#[derive(serde::Serialize)]
struct PerPortCassette {
    name: String,
    recorded_at: chrono::DateTime<Utc>,
    commit: String,
    source_session: String,
    interactions: Vec<Interaction>,
}

fn split_cassette(input: &Path, output_dir: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let cassette = Cassette::from_yaml(&content)
        .map_err(|e| format!("Failed to parse {}: {e}", input.display()))?;

    let mut by_port: BTreeMap<&str, Vec<Interaction>> = BTreeMap::new();
    for interaction in &cassette.interactions {
        by_port.entry(interaction.port.as_str()).or_default().push(interaction.clone());
    }

    fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create {}: {e}", output_dir.display()))?;

    let mut ports = Vec::new();
    for (port, interactions) in by_port {
        // Sequences restart at zero in each per-port file.
        let renumbered = interactions
            .into_iter()
            .zip(0_u64..)
            .map(|(interaction, seq)| Interaction { seq, ..interaction })
            .collect();

        let per_port = PerPortCassette {
            name: format!("{}-{port}", cassette.name),
            recorded_at: cassette.recorded_at,
            commit: cassette.commit.clone(),
            source_session: cassette.name.clone(),
            interactions: renumbered,
        };

        let file_path = output_dir.join(format!("{port}.cassette.yaml"));
        let yaml = serde_yaml::to_string(&per_port)
            .map_err(|e| format!("Failed to serialize cassette for port {port}: {e}"))?;
        fs::write(&file_path, yaml)
            .map_err(|e| format!("Failed to write {}: {e}", file_path.display()))?;

        println!("Wrote {}", file_path.display());
        ports.push(port.to_string());
    }

    Ok(ports)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: cassette_split <input.yaml> <output_dir>");
        process::exit(1);
    }

    if let Err(e) = split_cassette(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
