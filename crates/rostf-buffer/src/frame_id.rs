//! Canonical frame names.
//!
//! Frames are stored in absolute form with a single leading `/`, so `"map"`
//! and `"/map"` name the same frame.

use std::borrow::Cow;

/// Return `name` with a leading `/`.  The empty name becomes `"/"`.
pub fn canonicalize(name: &str) -> Cow<'_, str> {
    if name.starts_with('/') {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("/{name}"))
    }
}
