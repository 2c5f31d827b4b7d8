//! Export and import of evolved agents.
//!
//! An export carries the genome together with the world settings it was
//! scored against, so a replay can rebuild the exact template.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::schema::{AgentSnapshot, Genome, WorldConfig};

/// Exported agent format.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentExport {
    /// Action sequence.
    pub genome: Genome,
    /// World the genome was evolved in.
    pub world: WorldConfig,
    /// Agent metadata.
    pub metadata: AgentMetadata,
}

/// Agent metadata for export.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AgentMetadata {
    /// Fitness score.
    pub fitness: f64,
    /// Generations run before export.
    pub generation: usize,
    pub items_collected: u32,
    pub total_movement_cost: u64,
    pub unique_visited: usize,
    pub revisits: u64,
    pub actions_taken: usize,
    pub won: bool,
}

impl AgentExport {
    /// Build an export from a snapshot.
    pub fn new(snapshot: &AgentSnapshot, world: &WorldConfig, generation: usize) -> Self {
        Self {
            genome: snapshot.genome.clone(),
            world: world.clone(),
            metadata: AgentMetadata {
                fitness: snapshot.fitness,
                generation,
                items_collected: snapshot.items_collected,
                total_movement_cost: snapshot.total_movement_cost,
                unique_visited: snapshot.unique_visited,
                revisits: snapshot.revisits,
                actions_taken: snapshot.actions_taken,
                won: snapshot.won,
            },
        }
    }

    /// Default file name for this export.
    pub fn file_name(&self) -> String {
        format!(
            "agent_gen{}_fit{:.2}.json",
            self.metadata.generation, self.metadata.fitness
        )
    }
}

/// Save an agent export as pretty JSON.
pub fn save_agent<P: AsRef<Path>>(path: P, export: &AgentExport) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(export)?;
    fs::write(path, json)
}

/// Save an agent export into `dir` under its default file name.
pub fn save_agent_in<P: AsRef<Path>>(dir: P, export: &AgentExport) -> io::Result<PathBuf> {
    let path = dir.as_ref().join(export.file_name());
    save_agent(&path, export)?;
    Ok(path)
}

/// Load an agent export from file.
pub fn load_agent<P: AsRef<Path>>(path: P) -> io::Result<AgentExport> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_export() -> AgentExport {
        let snapshot = AgentSnapshot {
            genome: Genome::new(vec![0, 3, 3, 1, 2]),
            fitness: 412.5,
            items_collected: 2,
            total_movement_cost: 17,
            unique_visited: 5,
            revisits: 0,
            actions_taken: 5,
            won: false,
        };
        AgentExport::new(&snapshot, &WorldConfig::default(), 110)
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let export = test_export();

        let path = save_agent_in(dir.path(), &export).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "agent_gen110_fit412.50.json"
        );

        let loaded = load_agent(&path).unwrap();
        assert_eq!(loaded, export);
        assert_eq!(loaded.metadata.actions_taken, 5);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("best.json");
        save_agent(&path, &test_export()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_load_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_agent(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
