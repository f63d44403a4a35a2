use std::collections::HashMap;

use serde::Serialize;

use crate::classifier::ClassifierError;

/// The two operational bins every fine-grained label reduces to.
///
/// Serialized as `"wet"` / `"dry"` in API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Wet,
    Dry,
}

impl WasteCategory {
    /// The human-readable waste-type string paired with the category.
    pub fn waste_type(&self) -> &'static str {
        match self {
            Self::Wet => "Wet Waste",
            Self::Dry => "Dry Waste",
        }
    }
}

/// Fine-grained labels in class-index order, each with its coarse category.
/// Class index i of the model's output vector corresponds to entry i here.
const WASTE_LABELS: [(&str, WasteCategory); 10] = [
    ("Battery", WasteCategory::Dry),
    ("Biological", WasteCategory::Wet),
    ("Cardboard", WasteCategory::Dry),
    ("Clothes", WasteCategory::Dry),
    ("Glass", WasteCategory::Dry),
    ("Metal", WasteCategory::Dry),
    ("Paper", WasteCategory::Dry),
    ("Plastic", WasteCategory::Dry),
    ("Shoes", WasteCategory::Dry),
    ("Trash", WasteCategory::Wet),
];

/// Immutable lookup tables mapping class indices to fine-grained labels and
/// fine-grained labels to coarse categories. Built once at startup and
/// shared read-only with the request handlers.
///
/// Invariant: every label has exactly one category entry. [`LabelTable::new`]
/// rejects inputs that violate it; [`LabelTable::waste_sorting`] holds it by
/// construction.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: Vec<String>,
    categories: HashMap<String, WasteCategory>,
}

impl LabelTable {
    /// The built-in ten-class waste table used by the classify endpoint.
    pub fn waste_sorting() -> Self {
        let labels = WASTE_LABELS.iter().map(|(l, _)| l.to_string()).collect();
        let categories = WASTE_LABELS
            .iter()
            .map(|(l, c)| (l.to_string(), *c))
            .collect();
        Self { labels, categories }
    }

    /// Builds a table from an ordered label list and a label-to-category
    /// map, validating that the two cover each other exactly.
    pub fn new(
        labels: Vec<String>,
        categories: HashMap<String, WasteCategory>,
    ) -> Result<Self, ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Label table cannot be empty".into(),
            ));
        }
        for label in &labels {
            if !categories.contains_key(label) {
                return Err(ClassifierError::ValidationError(format!(
                    "Label '{}' has no category mapping",
                    label
                )));
            }
        }
        if categories.len() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Category map has {} entries for {} labels",
                categories.len(),
                labels.len()
            )));
        }
        Ok(Self { labels, categories })
    }

    /// The fine-grained label for a class index.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// The coarse category for a fine-grained label.
    pub fn category(&self, label: &str) -> Option<WasteCategory> {
        self.categories.get(label).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waste_table_has_ten_classes() {
        let table = LabelTable::waste_sorting();
        assert_eq!(table.len(), 10);
        assert_eq!(table.label(0), Some("Battery"));
        assert_eq!(table.label(9), Some("Trash"));
        assert_eq!(table.label(10), None);
    }

    #[test]
    fn test_every_label_is_mapped() {
        let table = LabelTable::waste_sorting();
        for label in table.labels() {
            assert!(table.category(label).is_some(), "unmapped label {label}");
        }
    }

    #[test]
    fn test_wet_dry_partition() {
        let table = LabelTable::waste_sorting();
        let wet: Vec<&str> = table
            .labels()
            .iter()
            .map(String::as_str)
            .filter(|l| table.category(l) == Some(WasteCategory::Wet))
            .collect();
        assert_eq!(wet, ["Biological", "Trash"]);
    }

    #[test]
    fn test_waste_type_strings() {
        assert_eq!(WasteCategory::Wet.waste_type(), "Wet Waste");
        assert_eq!(WasteCategory::Dry.waste_type(), "Dry Waste");
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&WasteCategory::Wet).unwrap(), "\"wet\"");
        assert_eq!(serde_json::to_string(&WasteCategory::Dry).unwrap(), "\"dry\"");
    }

    #[test]
    fn test_new_rejects_unmapped_label() {
        let labels = vec!["Battery".to_string(), "Glass".to_string()];
        let mut categories = HashMap::new();
        categories.insert("Battery".to_string(), WasteCategory::Dry);
        let result = LabelTable::new(labels, categories);
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_new_rejects_extra_category_entries() {
        let labels = vec!["Battery".to_string()];
        let mut categories = HashMap::new();
        categories.insert("Battery".to_string(), WasteCategory::Dry);
        categories.insert("Ghost".to_string(), WasteCategory::Wet);
        let result = LabelTable::new(labels, categories);
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_new_rejects_empty_table() {
        let result = LabelTable::new(Vec::new(), HashMap::new());
        assert!(matches!(result, Err(ClassifierError::ValidationError(_))));
    }
}
