//! Command handlers.  Each returns the text to print so it can be tested
//! without capturing stdout.

use std::path::Path;

use colored::Colorize;
use rostf_buffer::config::{self, BufferConfig};
use rostf_buffer::{FrameTransform, TransformBuffer, combine};
use rostf_geometry::RotationOrder;
use rostf_types::Stamp;

use crate::args::Command;
use crate::error::CliError;
use crate::replay;

/// Run `command` with the buffer settings read from `config_path`.
pub fn execute(command: &Command, config_path: &Path) -> Result<String, CliError> {
    match command {
        Command::Config { init } => cmd_config(config_path, *init),
        Command::List { recording } => {
            let buffer = load_buffer(recording, config_path)?;
            Ok(cmd_list(&buffer))
        }
        Command::Latest {
            recording,
            parent,
            child,
        } => {
            let buffer = load_buffer(recording, config_path)?;
            let t = buffer
                .lookup_latest(parent, child)
                .ok_or_else(|| not_found(parent, child))?;
            Ok(describe(&t))
        }
        Command::At {
            recording,
            parent,
            child,
            time,
        } => {
            let buffer = load_buffer(recording, config_path)?;
            let t = buffer
                .lookup_at_time(parent, child, *time)
                .ok_or_else(|| not_found(parent, child))?;
            Ok(describe(&t))
        }
        Command::Chain {
            recording,
            from,
            via,
            to,
            time,
        } => {
            let buffer = load_buffer(recording, config_path)?;
            Ok(describe(&cmd_chain(&buffer, [from, via, to], *time)?))
        }
    }
}

fn not_found(parent: &str, child: &str) -> CliError {
    CliError::NotFound {
        parent: parent.to_string(),
        child: child.to_string(),
    }
}

fn load_buffer(recording: &Path, config_path: &Path) -> Result<TransformBuffer, CliError> {
    let cfg = config::load_effective(config_path)?;
    let buffer = TransformBuffer::try_new(cfg)?;
    replay::replay_file(recording, &buffer)?;
    Ok(buffer)
}

fn cmd_config(path: &Path, init: bool) -> Result<String, CliError> {
    if init {
        if path.exists() {
            return Err(CliError::Usage(format!("{} already exists", path.display())));
        }
        config::save_to(&BufferConfig::default(), path)?;
        return Ok(format!("{} wrote defaults to {}", "✓".green().bold(), path.display()));
    }

    let cfg = config::load_effective(path)?;
    let source = if path.exists() { "file" } else { "defaults, no file" };
    let cap = cfg
        .max_entries_per_pair
        .map_or_else(|| "unlimited".to_string(), |n| n.to_string());
    Ok(format!(
        "{} ({source})\n  horizon_secs         = {}\n  match_threshold_secs = {}\n  max_entries_per_pair = {cap}",
        path.display().to_string().bold(),
        cfg.horizon_secs,
        cfg.match_threshold_secs,
    ))
}

fn cmd_list(buffer: &TransformBuffer) -> String {
    let pairs = buffer.frame_pairs();
    if pairs.is_empty() {
        return "no transforms".dimmed().to_string();
    }

    pairs
        .iter()
        .map(|pair| {
            let depth = buffer.depth(&pair.parent, &pair.child);
            let newest = buffer
                .lookup_latest(&pair.parent, &pair.child)
                .map(|t| t.stamp().to_string())
                .unwrap_or_default();
            format!("{}  {depth} sample(s), newest {newest}", pair.to_string().bold())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Look up `a → b` and `b → c` and chain them into `a → c`.
fn cmd_chain(buffer: &TransformBuffer, [a, b, c]: [&String; 3], time: Option<Stamp>) -> Result<FrameTransform, CliError> {
    let lookup = |parent: &str, child: &str| match time {
        Some(t) => buffer.lookup_at_time(parent, child, t),
        None => buffer.lookup_latest(parent, child),
    };
    let first = lookup(a.as_str(), b.as_str()).ok_or_else(|| not_found(a, b))?;
    let second = lookup(b.as_str(), c.as_str()).ok_or_else(|| not_found(b, c))?;
    combine(Some(&first), Some(&second)).ok_or_else(|| not_found(a, c))
}

fn describe(t: &FrameTransform) -> String {
    let p = t.translation();
    let [x, y, z, w] = t.rotation().to_xyzw();
    let euler = match t.rotation().euler_angles(RotationOrder::Xyz) {
        Some([a1, a2, a3]) => format!("[{a1:.6}, {a2:.6}, {a3:.6}]"),
        None => "singular (gimbal lock)".yellow().to_string(),
    };

    let mut out = format!(
        "{} -> {} @ {}\n",
        t.parent_frame().bold(),
        t.child_frame().bold(),
        t.stamp()
    );
    out.push_str(&format!("  translation      : [{:.6}, {:.6}, {:.6}]\n", p.x, p.y, p.z));
    out.push_str(&format!("  rotation (xyzw)  : [{x:.6}, {y:.6}, {z:.6}, {w:.6}]\n"));
    out.push_str(&format!("  euler XYZ (rad)  : {euler}"));
    out
}
