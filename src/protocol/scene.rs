//! Scene name table

use std::collections::HashMap;

use crate::protocol::command::SceneId;

/// Scene names understood by the node firmware. Several names alias one id.
const DEFAULT_SCENES: &[(&str, u8)] = &[
    ("user", 0),
    ("rgb", 1),
    ("flash", 2),
    ("blink", 2),
    ("redflash", 3),
    ("greenflash", 4),
    ("blueflash", 5),
    ("cyanflash", 6),
    ("magentaflash", 7),
    ("yellowflash", 8),
    ("black", 9),
    ("off", 9),
    ("huecycle", 10),
    ("moodlight", 11),
    ("candle", 12),
    ("water", 13),
    ("neon", 14),
    ("seasons", 15),
    ("thunderstorm", 16),
    ("storm", 16),
    ("stoplight", 17),
    ("sos", 18),
];

/// Read-only mapping from scene name to scene id.
///
/// Built once at startup and handed to the gateway; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct SceneTable {
    scenes: HashMap<String, SceneId>,
}

impl SceneTable {
    /// Build a table from `(name, id)` pairs. Pairs whose id is out of range
    /// are skipped.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, u8)>) -> Self {
        let scenes = pairs
            .into_iter()
            .filter_map(|(name, id)| match SceneId::try_from(id) {
                Ok(id) => Some((name.to_string(), id)),
                Err(id) => {
                    tracing::warn!("Ignoring scene {} with out-of-range id {}", name, id);
                    None
                }
            })
            .collect();
        Self { scenes }
    }

    pub fn lookup(&self, name: &str) -> Option<SceneId> {
        self.scenes.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Scene names sorted alphabetically
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for SceneTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_SCENES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_has_every_firmware_scene() {
        let table = SceneTable::default();
        assert_eq!(table.len(), 22);
        assert_eq!(table.lookup("user").map(SceneId::get), Some(0));
        assert_eq!(table.lookup("sos").map(SceneId::get), Some(18));
    }

    #[test]
    fn aliases_share_ids() {
        let table = SceneTable::default();
        for (alias, canonical) in [("blink", "flash"), ("off", "black"), ("storm", "thunderstorm")] {
            assert_eq!(table.lookup(alias), table.lookup(canonical), "{alias}");
        }
    }

    #[test]
    fn lookup_is_exact() {
        let table = SceneTable::default();
        assert!(table.lookup("Flash").is_none());
        assert!(table.lookup("thunderstorm=").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn out_of_range_ids_are_dropped() {
        let table = SceneTable::from_pairs([("ok", 3), ("bad", 40)]);
        assert_eq!(table.names(), vec!["ok"]);
    }
}
