//! Replays a JSON-lines recording of `/tf` traffic into a buffer.
//!
//! Each non-blank line holds one `tf2_msgs/TFMessage` in rosbridge JSON.
//! Lines starting with `#` are comments.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rostf_buffer::TransformBuffer;
use rostf_types::TfMessage;
use tracing::{debug, info};

use crate::error::CliError;

/// Counters reported after a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub messages: usize,
    pub transforms: usize,
}

/// Replay the recording at `path` into `buffer`.
pub fn replay_file(path: &Path, buffer: &TransformBuffer) -> Result<ReplayStats, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stats = replay(BufReader::new(file), path, buffer)?;
    info!(
        path = %path.display(),
        messages = stats.messages,
        transforms = stats.transforms,
        "replayed recording"
    );
    Ok(stats)
}

/// Replay from any reader; `source` only labels errors.
pub fn replay(reader: impl BufRead, source: &Path, buffer: &TransformBuffer) -> Result<ReplayStats, CliError> {
    let mut stats = ReplayStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CliError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let message: TfMessage = serde_json::from_str(trimmed).map_err(|e| CliError::Json {
            path: source.to_path_buf(),
            line: index + 1,
            source: e,
        })?;
        debug!(line = index + 1, transforms = message.transforms.len(), "tf message");

        buffer.insert_message(&message);
        stats.messages += 1;
        stats.transforms += message.transforms.len();
    }

    Ok(stats)
}
