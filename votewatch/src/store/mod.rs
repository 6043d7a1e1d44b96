//! Snapshot store implementations.
//!
//! - `DirStore`: one pretty-printed JSON file per snapshot in a directory.
//! - `MemoryStore`: in-process store for tests and demos.

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

/// Pick the first free key: `base`, then `base_2`, `base_3`, ...
pub(crate) fn unique_key(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2usize..)
        .map(|n| format!("{base}_{n}"))
        .find(|k| !taken(k))
        .unwrap_or_else(|| base.to_string())
}
