use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use a2ui::models::message::HistoryTurn;

/// Read the turns recorded in `path`, one JSON object per line; a missing file is empty
pub fn load_turns(path: &Path) -> Result<Vec<HistoryTurn>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open transcript {}", path.display()))?;

    let mut turns = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        turns.push(serde_json::from_str(&line)?);
    }
    Ok(turns)
}

/// Rewrite `path` with `turns`
pub fn persist_turns(path: &Path, turns: &[HistoryTurn]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);

    for turn in turns {
        serde_json::to_writer(&mut writer, turn)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_persist_and_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sessions").join("hub.jsonl");
        let turns = vec![
            HistoryTurn::new("user", "Find me Chinese food\nin New York"),
            HistoryTurn::new("model", "Here are some options."),
        ];

        persist_turns(&path, &turns)?;
        assert_eq!(fs::read_to_string(&path)?.lines().count(), 2);
        assert_eq!(load_turns(&path)?, turns);
        Ok(())
    }

    #[test]
    fn test_missing_transcript_is_empty() -> Result<()> {
        let dir = tempdir()?;
        assert!(load_turns(&dir.path().join("none.jsonl"))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupt_transcript() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "{not json}\n")?;
        assert!(load_turns(&path).is_err());
        Ok(())
    }
}
