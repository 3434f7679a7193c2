//! `rostf-buffer` – time-windowed store of coordinate-frame transforms.
//!
//! Ingests the `parent → child` poses a robot publishes on `/tf` and answers
//! "where was `child` relative to `parent`, most recently or at time `t`?".
//!
//! # Modules
//!
//! - [`buffer`] – [`TransformBuffer`]: one mutex-guarded map from
//!   [`FramePair`] to a newest-first sample sequence, pruned by age and an
//!   optional entry cap.
//! - [`frame_transform`] – [`FrameTransform`] and [`combine`], which chains
//!   two direct lookups into an indirect one.
//! - [`config`] – [`BufferConfig`]: horizon, match threshold and entry cap,
//!   loaded from `~/.rostf/config.toml` with `ROSTF_*` overrides.
//! - [`frame_id`] – canonical frame names.
//!
//! # Example
//!
//! ```rust
//! use rostf_buffer::{BufferConfig, TransformBuffer, combine};
//! use rostf_geometry::{Rotation, Vec3};
//! use rostf_types::Stamp;
//!
//! let buffer = TransformBuffer::new(BufferConfig::default());
//! let now = Stamp::new(100, 0);
//! buffer.insert("map", "odom", Vec3::new(2.0, 0.0, 0.0), Rotation::IDENTITY, now);
//! buffer.insert("odom", "base_link", Vec3::new(0.0, 1.0, 0.0), Rotation::IDENTITY, now);
//!
//! let map_to_base = combine(
//!     buffer.lookup_latest("map", "odom").as_ref(),
//!     buffer.lookup_latest("odom", "base_link").as_ref(),
//! )
//! .unwrap();
//! assert!(map_to_base.translation().approx_eq(Vec3::new(2.0, 1.0, 0.0), 1e-12));
//! ```

pub mod buffer;
pub mod config;
pub mod frame_id;
pub mod frame_transform;

pub use buffer::{FramePair, TransformBuffer};
pub use config::{BufferConfig, ConfigError, DEFAULT_BUFFER_HORIZON_SECS, DEFAULT_TF_MATCH_THRESHOLD_SECS};
pub use frame_transform::{FrameTransform, combine};
