//! Named accent colors the theme can be switched to.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub name: &'static str,
    pub hex: &'static str,
}

/// Fixed table; lookup order matters for name resolution.
pub const ACCENT_COLORS: &[PaletteEntry] = &[
    PaletteEntry { name: "Aastha", hex: "#7C3AED" },
    PaletteEntry { name: "Sky Blue", hex: "#38BDF8" },
    PaletteEntry { name: "Mint Green", hex: "#34D399" },
    PaletteEntry { name: "Sunset Orange", hex: "#FB923C" },
    PaletteEntry { name: "Rose Pink", hex: "#F472B6" },
    PaletteEntry { name: "Sunny Yellow", hex: "#FBBF24" },
];

pub const DEFAULT_ACCENT: PaletteEntry = ACCENT_COLORS[0];

/// Resolve a loosely-spelled color name: the first entry whose name contains
/// `name` (case-insensitive) wins. Blank names resolve to nothing.
pub fn resolve_accent(name: &str) -> Option<PaletteEntry> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    ACCENT_COLORS
        .iter()
        .find(|entry| entry.name.to_lowercase().contains(&needle))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_substring_case_insensitive() {
        assert_eq!(resolve_accent("sky").map(|e| e.name), Some("Sky Blue"));
        assert_eq!(resolve_accent("  ROSE ").map(|e| e.name), Some("Rose Pink"));
    }

    #[test]
    fn test_resolve_first_match_in_table_order() {
        // "n" appears in several names; Mint Green comes first
        assert_eq!(resolve_accent("n").map(|e| e.name), Some("Mint Green"));
    }

    #[test]
    fn test_resolve_unknown_and_blank() {
        assert!(resolve_accent("nonexistent").is_none());
        assert!(resolve_accent("   ").is_none());
    }
}
