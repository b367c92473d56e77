//! Per-field analyzer selection.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::analysis::analyzer::{analyzer_for_name, Analyzer, Token};
use crate::error::Result;

/// Routes each field to its configured analyzer, falling back to the default.
///
/// Sub-fields (`attrs.size`) inherit the analyzer of their root column.
/// The routing table is fixed at construction, so lookups take no lock and
/// map keys never add entries.
pub struct PerFieldAnalyzerWrapper {
    default: Arc<dyn Analyzer>,
    per_field: HashMap<String, Arc<dyn Analyzer>>,
}

impl PerFieldAnalyzerWrapper {
    /// Build from analyzer names; unknown names fail here rather than at
    /// indexing time.
    pub fn new(default: &str, per_field: &BTreeMap<String, String>) -> Result<Self> {
        let default = analyzer_for_name(default)?;
        let per_field = per_field
            .iter()
            .map(|(field, name)| Ok((field.to_lowercase(), analyzer_for_name(name)?)))
            .collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { default, per_field })
    }

    pub fn default_analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.default
    }

    pub fn analyzer_for(&self, field: &str) -> Arc<dyn Analyzer> {
        let key = field.to_lowercase();
        let root = key.split('.').next().unwrap_or(&key);
        let analyzer = self
            .per_field
            .get(&key)
            .or_else(|| self.per_field.get(root))
            .unwrap_or(&self.default);
        Arc::clone(analyzer)
    }

    pub fn tokens(&self, field: &str, text: &str) -> Vec<Token> {
        self.analyzer_for(field).tokens(text)
    }
}

impl fmt::Debug for PerFieldAnalyzerWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<(&String, &str)> = self
            .per_field
            .iter()
            .map(|(k, a)| (k, a.name()))
            .collect();
        fields.sort();
        f.debug_struct("PerFieldAnalyzerWrapper")
            .field("default", &self.default.name())
            .field("per_field", &fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn wrapper() -> PerFieldAnalyzerWrapper {
        let mut per_field = BTreeMap::new();
        per_field.insert("City".to_string(), "keyword".to_string());
        per_field.insert("attrs".to_string(), "whitespace".to_string());
        PerFieldAnalyzerWrapper::new("standard", &per_field).unwrap()
    }

    #[test]
    fn test_field_routing() {
        let w = wrapper();
        assert_eq!(w.analyzer_for("city").name(), "keyword");
        assert_eq!(w.analyzer_for("CITY").name(), "keyword");
        assert_eq!(w.analyzer_for("attrs.size").name(), "whitespace");
        assert_eq!(w.analyzer_for("event_type").name(), "standard");
        assert_eq!(w.tokens("city", "New York").len(), 1);
        assert_eq!(w.tokens("event_type", "New York").len(), 2);
    }

    #[test]
    fn test_unknown_analyzer_fails_construction() {
        let mut per_field = BTreeMap::new();
        per_field.insert("x".to_string(), "nope".to_string());
        assert!(PerFieldAnalyzerWrapper::new("standard", &per_field).is_err());
        assert!(PerFieldAnalyzerWrapper::new("nope", &BTreeMap::new()).is_err());
    }

    #[test]
    fn test_concurrent_lookups_share_instances() {
        let w = Arc::new(wrapper());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let w = Arc::clone(&w);
                thread::spawn(move || w.analyzer_for("attrs.color"))
            })
            .collect();
        let first = w.analyzer_for("attrs.color");
        for h in handles {
            assert!(Arc::ptr_eq(&h.join().unwrap(), &first));
        }
    }

    #[test]
    fn test_map_keys_resolve_to_the_root_analyzer() {
        let w = wrapper();
        let root = w.analyzer_for("attrs");
        for i in 0..1000 {
            assert!(Arc::ptr_eq(&w.analyzer_for(&format!("attrs.key{}", i)), &root));
        }
        assert_eq!(w.per_field.len(), 2);
    }
}
