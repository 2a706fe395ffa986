//! Read-only authority table keyed by engine identifier

/// One engine's static ranking attributes
#[derive(Debug, Clone, PartialEq)]
struct EngineEntry {
    name: String,
    weight: f64,
}

/// Authority weights plus priority order (table order) for every
/// registered engine. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct EngineTable {
    entries: Vec<EngineEntry>,
}

impl EngineTable {
    /// Create a table from `(name, weight)` pairs in priority order
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, weight)| EngineEntry {
                    name: name.into(),
                    weight: weight.max(0.0),
                })
                .collect(),
        }
    }

    /// Authority weight for an engine (0.0 for unknown engines)
    pub fn weight(&self, name: &str) -> f64 {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.weight)
            .unwrap_or(0.0)
    }

    /// Largest weight in the table
    pub fn max_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).fold(0.0, f64::max)
    }

    /// Weight scaled into `[0, 1]` against the table maximum
    pub fn normalized_weight(&self, name: &str) -> f64 {
        let max = self.max_weight();
        if max <= 0.0 {
            return 0.0;
        }
        (self.weight(name) / max).clamp(0.0, 1.0)
    }

    /// Priority of an engine; lower is more important. Unknown engines sort last.
    pub fn priority(&self, name: &str) -> usize {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .unwrap_or(usize::MAX)
    }

    /// Engine identifiers in priority order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_and_priority() {
        let table = EngineTable::new([("wikipedia", 1.0), ("duckduckgo", 0.4)]);

        assert_eq!(table.priority("wikipedia"), 0);
        assert_eq!(table.priority("duckduckgo"), 1);
        assert_eq!(table.priority("unknown"), usize::MAX);
        assert!((table.normalized_weight("duckduckgo") - 0.4).abs() < f64::EPSILON);
        assert_eq!(table.weight("unknown"), 0.0);
    }

    #[test]
    fn test_zero_table_normalizes_to_zero() {
        let table = EngineTable::new([("a", 0.0)]);
        assert_eq!(table.normalized_weight("a"), 0.0);
    }
}
