//! [`TransformBuffer`] – thread-safe, time-windowed store of frame
//! transforms.
//!
//! Each `(parent, child)` pair owns a sequence of samples, newest first.
//! Inserting a sample evicts the tail of its sequence while the tail is
//! older than the new sample by more than the configured horizon, then
//! applies the optional per-pair entry cap.  The sample just inserted is
//! never evicted, so a stored sequence is never empty.
//!
//! Eviction compares against the sample just inserted, not against the
//! newest one: samples are expected to arrive in non-decreasing stamp order
//! per pair.  Out-of-order arrivals are accepted and logged at `debug`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rostf_buffer::{BufferConfig, TransformBuffer};
//! use rostf_geometry::{Rotation, Vec3};
//! use rostf_types::Stamp;
//!
//! let buffer = Arc::new(TransformBuffer::new(BufferConfig::default()));
//! buffer.insert("map", "base_link", Vec3::new(1.0, 0.0, 0.0),
//!     Rotation::IDENTITY, Stamp::new(1, 0));
//!
//! let t = buffer.lookup_at_time("/map", "/base_link", Stamp::from_secs_f64(1.05)).unwrap();
//! assert_eq!(t.stamp(), Stamp::new(1, 0));
//! assert!(buffer.lookup_at_time("map", "base_link", Stamp::new(2, 0)).is_none());
//! ```

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rostf_geometry::{Rotation, Vec3};
use rostf_types::{Stamp, TfMessage, TransformRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{BufferConfig, ConfigError};
use crate::frame_id::canonicalize;
use crate::frame_transform::FrameTransform;

// ────────────────────────────────────────────────────────────────────────────
// FramePair
// ────────────────────────────────────────────────────────────────────────────

/// Key of a sample sequence: canonical parent and child frame names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FramePair {
    pub parent: String,
    pub child: String,
}

impl FramePair {
    /// Build a key, canonicalizing both names.
    pub fn new(parent: &str, child: &str) -> Self {
        Self {
            parent: canonicalize(parent).into_owned(),
            child: canonicalize(child).into_owned(),
        }
    }
}

impl fmt::Display for FramePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.parent, self.child)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// TransformBuffer
// ────────────────────────────────────────────────────────────────────────────

type PairMap = HashMap<FramePair, VecDeque<FrameTransform>>;

/// Shared store of recent transforms, keyed by frame pair.
///
/// Every method takes `&self`; share the buffer across threads with
/// `Arc<TransformBuffer>`.  One mutex guards the whole map.
#[derive(Debug, Default)]
pub struct TransformBuffer {
    pairs: Mutex<PairMap>,
    config: BufferConfig,
}

impl TransformBuffer {
    pub fn new(config: BufferConfig) -> Self {
        Self {
            pairs: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Like [`TransformBuffer::new`], but rejects settings that fail
    /// [`BufferConfig::validate`].
    pub fn try_new(config: BufferConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// The map only ever holds complete values, so a panic in another
    /// holder cannot leave it half-updated.
    fn lock(&self) -> MutexGuard<'_, PairMap> {
        self.pairs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a sample of `child` relative to `parent` taken at `stamp`.
    pub fn insert(&self, parent: &str, child: &str, translation: Vec3, rotation: Rotation, stamp: Stamp) {
        let transform = FrameTransform::new(parent, child, translation, rotation, stamp);
        let mut pairs = self.lock();
        self.push(&mut pairs, transform);
    }

    /// Store an already built transform.
    pub fn insert_transform(&self, transform: FrameTransform) {
        let mut pairs = self.lock();
        self.push(&mut pairs, transform);
    }

    /// Decode and store one wire record.
    pub fn insert_record(&self, record: &TransformRecord) {
        self.insert_transform(FrameTransform::from_record(record));
    }

    /// Decode and store every record of a `/tf` message under a single lock
    /// acquisition.
    pub fn insert_message(&self, message: &TfMessage) {
        let decoded: Vec<FrameTransform> = message
            .transforms
            .iter()
            .map(FrameTransform::from_record)
            .collect();
        let mut pairs = self.lock();
        for transform in decoded {
            self.push(&mut pairs, transform);
        }
    }

    fn push(&self, pairs: &mut PairMap, transform: FrameTransform) {
        let key = FramePair {
            parent: transform.parent_frame().to_string(),
            child: transform.child_frame().to_string(),
        };
        let stamp = transform.stamp();
        let samples = pairs.entry(key).or_default();

        if let Some(head) = samples.front()
            && stamp < head.stamp()
        {
            debug!(
                parent = transform.parent_frame(),
                child = transform.child_frame(),
                %stamp,
                newest = %head.stamp(),
                "out-of-order transform"
            );
        }
        samples.push_front(transform);

        // The sample just inserted always survives.
        let mut evicted = 0usize;
        while samples.len() > 1
            && samples
                .back()
                .is_some_and(|tail| stamp.seconds_since(tail.stamp()) > self.config.horizon_secs)
        {
            samples.pop_back();
            evicted += 1;
        }
        if let Some(cap) = self.config.max_entries_per_pair.map(|cap| cap.max(1))
            && samples.len() > cap
        {
            evicted += samples.len() - cap;
            samples.truncate(cap);
        }

        if let Some(head) = samples.front() {
            if evicted > 0 {
                debug!(parent = head.parent_frame(), child = head.child_frame(), evicted, "evicted transforms");
            }
            trace!(
                parent = head.parent_frame(),
                child = head.child_frame(),
                %stamp,
                depth = samples.len(),
                "transform inserted"
            );
        }
    }

    /// The sample of the pair with the greatest stamp.
    pub fn lookup_latest(&self, parent: &str, child: &str) -> Option<FrameTransform> {
        let key = FramePair::new(parent, child);
        let pairs = self.lock();
        let Some(samples) = pairs.get(&key) else {
            debug!(pair = %key, "no transforms for pair");
            return None;
        };

        let mut best: Option<&FrameTransform> = None;
        for sample in samples {
            if best.is_none_or(|b| sample.stamp() > b.stamp()) {
                best = Some(sample);
            }
        }
        best.cloned()
    }

    /// The sample of the pair closest to `time`, if it lies within the
    /// match threshold.
    pub fn lookup_at_time(&self, parent: &str, child: &str, time: Stamp) -> Option<FrameTransform> {
        let key = FramePair::new(parent, child);
        let pairs = self.lock();
        let Some(samples) = pairs.get(&key) else {
            debug!(pair = %key, "no transforms for pair");
            return None;
        };

        let mut best: Option<(&FrameTransform, f64)> = None;
        for sample in samples {
            let diff = sample.stamp().seconds_since(time).abs();
            if best.is_none_or(|(_, d)| diff < d) {
                best = Some((sample, diff));
            }
        }

        match best {
            Some((sample, diff)) if diff <= self.config.match_threshold_secs => Some(sample.clone()),
            Some((_, diff)) => {
                debug!(pair = %key, %time, closest_secs = diff, "no transform within match threshold");
                None
            }
            None => None,
        }
    }

    /// Every stored frame pair, sorted.
    pub fn frame_pairs(&self) -> Vec<FramePair> {
        let mut keys: Vec<FramePair> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of samples currently held for a pair.
    pub fn depth(&self, parent: &str, child: &str) -> usize {
        self.lock()
            .get(&FramePair::new(parent, child))
            .map_or(0, VecDeque::len)
    }

    /// Number of stored frame pairs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every stored sample.
    pub fn clear(&self) {
        self.lock().clear();
    }
}
