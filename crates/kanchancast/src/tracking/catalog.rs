//! The ordered list of production stages and stage-name canonicalization.

use std::collections::HashMap;

/// Production stages in workshop order.
pub const STANDARD_STAGES: [&str; 11] = [
    "Raw Material Procurement",
    "Design & CAD Modelling",
    "Wax Model Creation",
    "Investment Casting",
    "Cleaning & Devesting",
    "Filing & Pre-Polishing",
    "Stone Setting",
    "Final Polishing",
    "Plating",
    "Quality Control",
    "Packaging & Dispatch",
];

/// Historical spellings found in stored stage rows and employee work areas.
pub const STANDARD_ALIASES: &[(&str, &str)] = &[
    ("Raw Material Procurement and Management", "Raw Material Procurement"),
    ("Raw material procedure and management", "Raw Material Procurement"),
    ("Wax Model Creation (Rapid Prototyping)", "Wax Model Creation"),
    ("Investment Casting (Lost Wax Casting)", "Investment Casting"),
    ("Stone Setting (if applicable)", "Stone Setting"),
    ("Plating (Optional)", "Plating"),
    ("Quality Control (QC)", "Quality Control"),
];

/// Immutable stage catalog, shared by every tracking component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    labels: Vec<String>,
    /// Lower-cased variant -> catalog index. Labels map to themselves.
    lookup: HashMap<String, usize>,
}

impl StageCatalog {
    /// The eleven jewellery production stages with their known aliases.
    pub fn standard() -> Self {
        Self::build(&STANDARD_STAGES, STANDARD_ALIASES)
    }

    /// Builds a catalog from custom labels and aliases.
    ///
    /// Returns `None` when the catalog would be empty, a label is repeated,
    /// or an alias points at something that is not a label.
    pub fn new(labels: &[&str], aliases: &[(&str, &str)]) -> Option<Self> {
        let unique: std::collections::HashSet<String> =
            labels.iter().map(|l| l.trim().to_lowercase()).collect();
        if labels.is_empty() || unique.len() != labels.len() {
            return None;
        }
        if aliases
            .iter()
            .any(|(_, target)| !labels.iter().any(|l| l.trim() == target.trim()))
        {
            return None;
        }
        Some(Self::build(labels, aliases))
    }

    fn build(labels: &[&str], aliases: &[(&str, &str)]) -> Self {
        let labels: Vec<String> = labels.iter().map(|l| l.trim().to_string()).collect();
        let mut lookup = HashMap::new();
        for (alias, target) in aliases {
            if let Some(idx) = labels.iter().position(|l| l == target.trim()) {
                lookup.insert(alias.trim().to_lowercase(), idx);
            }
        }
        // Labels win over any alias spelled the same way.
        for (idx, label) in labels.iter().enumerate() {
            lookup.insert(label.to_lowercase(), idx);
        }
        Self { labels, lookup }
    }

    /// Stage names in display order. Never empty.
    pub fn labels(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Maps a stored or user-supplied name onto its canonical label.
    ///
    /// Whitespace is trimmed and known variants are matched without regard
    /// to case. Anything else comes back trimmed but otherwise unchanged.
    pub fn canonicalize(&self, raw: &str) -> String {
        self.resolve(raw)
            .map(str::to_string)
            .unwrap_or_else(|| raw.trim().to_string())
    }

    /// The canonical label for `raw`, or `None` if it is not a catalog stage.
    pub fn resolve(&self, raw: &str) -> Option<&str> {
        self.position(raw).map(|idx| self.labels[idx].as_str())
    }

    /// Catalog index of the stage `raw` refers to.
    pub fn position(&self, raw: &str) -> Option<usize> {
        self.lookup.get(&raw.trim().to_lowercase()).copied()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.position(raw).is_some()
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_labels() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.len(), 11);
        let labels: Vec<&str> = catalog.labels().collect();
        assert_eq!(labels.first(), Some(&"Raw Material Procurement"));
        assert_eq!(labels.last(), Some(&"Packaging & Dispatch"));
        // Restartable.
        assert_eq!(catalog.labels().count(), 11);
    }

    #[test]
    fn test_canonicalize_known_variants() {
        let catalog = StageCatalog::standard();
        assert_eq!(
            catalog.canonicalize("Raw material procedure and management"),
            "Raw Material Procurement"
        );
        assert_eq!(
            catalog.canonicalize("  RAW MATERIAL PROCUREMENT AND MANAGEMENT "),
            "Raw Material Procurement"
        );
        assert_eq!(catalog.canonicalize("Quality Control (QC)"), "Quality Control");
        assert_eq!(catalog.canonicalize("final polishing"), "Final Polishing");
    }

    #[test]
    fn test_canonicalize_passes_unknown_through_trimmed() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.canonicalize("  Gilding  "), "Gilding");
        assert_eq!(catalog.canonicalize(""), "");
        assert!(catalog.resolve("Gilding").is_none());
        assert!(!catalog.contains("Gilding"));
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let catalog = StageCatalog::standard();
        let inputs = [
            "Raw material procedure and management",
            " plating (optional)",
            "Casting",
            "Stone Setting",
            "   ",
            "Design & CAD Modelling",
            "something else entirely ",
        ];
        for input in inputs {
            let once = catalog.canonicalize(input);
            assert_eq!(catalog.canonicalize(&once), once, "input {input:?}");
        }
        for label in catalog.labels() {
            assert_eq!(catalog.canonicalize(label), label);
        }
    }

    #[test]
    fn test_custom_catalog_validation() {
        assert!(StageCatalog::new(&[], &[]).is_none());
        assert!(StageCatalog::new(&["A", "a"], &[]).is_none());
        assert!(StageCatalog::new(&["A", "B"], &[("x", "C")]).is_none());

        let catalog = StageCatalog::new(&["Cut", "Polish"], &[("polishing", "Polish")]).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.canonicalize("POLISHING"), "Polish");
        assert_eq!(catalog.position("cut"), Some(0));
    }
}
