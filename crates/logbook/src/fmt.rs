//! Canonical re-formatting of a single vault document.
//!
//! `lb fmt` parses a document and writes back the serializer's rendering.
//! Because the cache fingerprints raw bytes, a formatted document changes
//! its hash once and then stays stable across further `fmt` runs.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use logbook_core::{parse_daily, parse_protocol, serialize_daily, serialize_protocol};

use crate::vault::{self, DocumentKind};

/// Canonical text for `raw`. Protocol documents keep their protocol shape;
/// everything else is treated as a daily document.
pub fn canonical_text(raw: &str, path: &Path) -> String {
    match vault::classify(raw, path) {
        DocumentKind::Protocol { .. } => serialize_protocol(&parse_protocol(raw)),
        DocumentKind::Daily { .. } | DocumentKind::Undated => serialize_daily(&parse_daily(raw)),
    }
}

/// Returns whether the file was (or, with `check`, would be) changed.
pub fn format_file(path: &Path, check: bool) -> Result<bool> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let canonical = canonical_text(&raw, path);
    let changed = canonical != raw;
    debug!(path = %path.display(), changed, "formatted document");

    if changed && !check {
        std::fs::write(path, &canonical)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(changed)
}

pub fn run_fmt(path: &Path, check: bool) -> Result<()> {
    let changed = format_file(path, check)?;
    match (changed, check) {
        (true, true) => bail!("{} is not in canonical form", path.display()),
        (true, false) => println!("formatted {}", path.display()),
        (false, _) => println!("unchanged {}", path.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HAND_WRITTEN: &str = "---\ndate: 2025-01-15\ntags: [log]\n---\n\n## Quick Log\nWeight:: 244.0\nSleep:: 7:30\n\n## Todos\n- [x] email\n- [ ] taxes\n";

    #[test]
    fn test_fmt_rewrites_then_stabilizes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2025-01-15.md");
        std::fs::write(&path, HAND_WRITTEN).unwrap();

        assert!(format_file(&path, false).unwrap());
        let once = std::fs::read_to_string(&path).unwrap();
        assert!(once.contains("Weight:: 244\n"));

        assert!(!format_file(&path, false).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), once);
    }

    #[test]
    fn test_check_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("2025-01-15.md");
        std::fs::write(&path, HAND_WRITTEN).unwrap();

        assert!(run_fmt(&path, true).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), HAND_WRITTEN);
    }

    #[test]
    fn test_protocol_keeps_protocol_shape() {
        let raw = "---\ntype: protocol\nweek_of: 2025-01-13\n---\n\n## Rationale\nDeload week.\n";
        let out = canonical_text(raw, Path::new("week.md"));
        assert!(out.contains("week_of: 2025-01-13"));
        assert!(out.contains("Deload week."));
    }
}
