use anyhow::{Context, Result};
use std::path::Path;

use crate::beatmap::assemble::NoteEvent;
use crate::beatmap::Beatmap;

/// Pretty-printed JSON array of `{"appear_time", "x"}` objects.
pub fn to_json(events: &[NoteEvent]) -> Result<String> {
    serde_json::to_string_pretty(events).context("Failed to serialize beatmap")
}

pub fn write_beatmap(path: &Path, beatmap: &Beatmap) -> Result<()> {
    let json = to_json(&beatmap.events)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write beatmap: {}", path.display()))?;
    log::debug!("Wrote {} events to {}", beatmap.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beatmap(events: Vec<NoteEvent>) -> Beatmap {
        Beatmap { tempo_bpm: 120.0, events }
    }

    #[test]
    fn pretty_prints_two_space_array() {
        let events = vec![
            NoteEvent { appear_time: 0.5, lane: 2 },
            NoteEvent { appear_time: 1.0, lane: 0 },
        ];
        let expected = "[\n  {\n    \"appear_time\": 0.5,\n    \"x\": 2\n  },\n  {\n    \"appear_time\": 1.0,\n    \"x\": 0\n  }\n]";
        assert_eq!(to_json(&events).unwrap(), expected);
    }

    #[test]
    fn empty_beatmap_is_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn writes_file_that_parses_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song_hard.json");
        let map = beatmap(vec![NoteEvent { appear_time: 2.345, lane: 1 }]);
        write_beatmap(&path, &map).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["appear_time"], 2.345);
        assert_eq!(value[0]["x"], 1);
    }

    #[test]
    fn unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.json");
        assert!(write_beatmap(&path, &beatmap(Vec::new())).is_err());
    }
}
