use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use motiontrail::{EffectController, ParameterWrite};
use serde::Serialize;

pub fn slot_file_name(index: usize) -> String {
    format!("slot-{index:02}.png")
}

/// Saves every slot inside the active delay window plus the final effect
/// configuration as `effect.json`. Returns the written image paths.
pub fn export_history(controller: &EffectController, directory: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory).with_context(|| {
        format!(
            "failed to prepare export directory at {}",
            directory.display()
        )
    })?;

    let mut written = Vec::new();
    for index in 0..controller.delay_count() {
        let Some(slot) = controller.ring().slot_at(index) else {
            continue;
        };
        let path = directory.join(slot_file_name(index));
        slot.image()
            .save(&path)
            .with_context(|| format!("failed to write slot image to {}", path.display()))?;
        written.push(path);
    }

    let config_path = directory.join("effect.json");
    let serialized = serde_json::to_string_pretty(controller.config())
        .context("failed to serialize effect configuration")?;
    fs::write(&config_path, serialized).with_context(|| {
        format!(
            "failed to write effect configuration to {}",
            config_path.display()
        )
    })?;

    tracing::info!(
        slots = written.len(),
        dir = %directory.display(),
        "exported frame history"
    );
    Ok(written)
}

#[derive(Serialize)]
struct TickRecord<'a> {
    tick: u64,
    outcome: &'a str,
    writes: &'a [ParameterWrite],
}

/// JSON-lines log of the parameter stream, one object per tick.
pub struct ParameterDump {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ParameterDump {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to prepare directory for {}", path.display())
            })?;
        }
        let file = File::create(path)
            .with_context(|| format!("failed to create parameter dump at {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn record(&mut self, tick: u64, outcome: &str, writes: &[ParameterWrite]) -> Result<()> {
        let record = TickRecord {
            tick,
            outcome,
            writes,
        };
        serde_json::to_writer(&mut self.writer, &record)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        self.writer
            .write_all(b"\n")
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))
    }
}
