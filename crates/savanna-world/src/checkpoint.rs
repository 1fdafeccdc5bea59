//! Checkpoint and restore functionality.

use crate::world::{Snapshot, World};
use rand_chacha::ChaCha8Rng;
use savanna_core::{Error, Result, WorldConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

const MAGIC: &[u8; 4] = b"SVNA";

/// World state plus the generator state needed to resume a run exactly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub version: u32,
    pub timestamp: i64,
    pub config: WorldConfig,
    pub snapshot: Snapshot,
    pub rng: ChaCha8Rng,
}

impl Checkpoint {
    pub const VERSION: u32 = 1;

    pub fn capture(world: &World<ChaCha8Rng>) -> Self {
        Self {
            version: Self::VERSION,
            timestamp: chrono::Utc::now().timestamp(),
            config: world.config().clone(),
            snapshot: world.snapshot(),
            rng: world.rng().clone(),
        }
    }

    /// Rebuild the world this checkpoint was taken from
    pub fn into_world(self) -> Result<World<ChaCha8Rng>> {
        World::restore(self.config, self.snapshot, self.rng)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bincode::serialize(self)?);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let payload = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| Error::InvalidState("not a checkpoint: bad magic bytes".to_string()))?;
        let checkpoint: Checkpoint = bincode::deserialize(payload)?;

        if checkpoint.version != Self::VERSION {
            return Err(Error::InvalidState(format!(
                "checkpoint version {} is not supported (expected {})",
                checkpoint.version,
                Self::VERSION
            )));
        }
        Ok(checkpoint)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.to_bytes()?)?;
        writer.flush()?;

        info!(
            path = %path.display(),
            step = self.snapshot.step,
            entities = self.snapshot.entities.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        let checkpoint = Self::from_bytes(&buffer)?;
        info!(
            path = %path.display(),
            step = checkpoint.snapshot.step,
            timestamp = checkpoint.timestamp,
            "Checkpoint loaded"
        );
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World<ChaCha8Rng> {
        let config = WorldConfig {
            width: 10,
            height: 10,
            initial_grazers: 12,
            initial_hunters: 4,
            ..Default::default()
        };
        World::from_seed(config, 21).unwrap()
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut world = world();
        world.run(5);

        let checkpoint = Checkpoint::capture(&world);
        let restored = Checkpoint::from_bytes(&checkpoint.to_bytes().unwrap()).unwrap();
        assert_eq!(restored, checkpoint);
    }

    #[test]
    fn test_resumed_world_continues_identically() {
        let mut original = world();
        original.run(3);

        let mut resumed = Checkpoint::capture(&original).into_world().unwrap();
        for _ in 0..5 {
            assert_eq!(original.step(), resumed.step());
        }
        assert_eq!(original.snapshot(), resumed.snapshot());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = Checkpoint::capture(&world()).to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            Checkpoint::from_bytes(&bytes),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut checkpoint = Checkpoint::capture(&world());
        checkpoint.version = 99;
        let bytes = checkpoint.to_bytes().unwrap();
        assert!(matches!(
            Checkpoint::from_bytes(&bytes),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.svna");

        let checkpoint = Checkpoint::capture(&world());
        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();

        assert_eq!(loaded, checkpoint);
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.svna");
        std::fs::write(&path, b"SVNA\x01").unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(Error::Serialization(_))
        ));
    }
}
