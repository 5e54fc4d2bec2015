use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::error;

use crate::error::{MonetaError, Result};
use crate::transaction::{CategorizedTransaction, Field, GenericTransaction};

/// Transactions matching no rule land in this category. The store must know
/// it before a categorizer can be constructed.
pub const DEFAULT_CATEGORY: &str = "Nezařazený výdaj";

/// One pattern, or a list of alternatives (any of which may match).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn as_slice(&self) -> &[String] {
        match self {
            Self::One(p) => std::slice::from_ref(p),
            Self::Many(ps) => ps,
        }
    }
}

/// A mapping entry as written in the YAML file: a `category` target plus any
/// number of `field: pattern(s)` constraints.
#[derive(Debug, Deserialize)]
struct RawRule {
    category: String,
    #[serde(flatten)]
    constraints: BTreeMap<Field, Patterns>,
}

#[derive(Debug)]
struct ResolvedRule {
    constraints: Vec<(Field, Vec<Regex>)>,
    category_id: i64,
}

/// Ordered rule list with category names resolved to stable ids. Immutable
/// after construction; evaluation takes `&self` and is safe to share.
#[derive(Debug)]
pub struct Categorizer {
    rules: Vec<ResolvedRule>,
    default_category_id: i64,
}

impl Categorizer {
    /// Load the mapping file and resolve every category name against the
    /// supplied snapshot of the store's name → id mapping. All failures
    /// (unreadable file, malformed YAML, bad pattern, unknown category,
    /// missing default category) surface here, never during evaluation.
    pub fn new(mapping_path: &Path, categories: HashMap<String, i64>) -> Result<Self> {
        let text = std::fs::read_to_string(mapping_path).map_err(|e| {
            error!(file = %mapping_path.display(), "cannot read mapping file");
            MonetaError::Config(format!(
                "cannot read mapping file '{}': {e}",
                mapping_path.display()
            ))
        })?;
        Self::from_yaml(&text, categories)
    }

    pub fn from_yaml(text: &str, categories: HashMap<String, i64>) -> Result<Self> {
        let raw: Vec<RawRule> = serde_yaml::from_str(text)
            .map_err(|e| MonetaError::Config(format!("malformed mapping: {e}")))?;

        let default_category_id = *categories.get(DEFAULT_CATEGORY).ok_or_else(|| {
            MonetaError::Config(format!("default category '{DEFAULT_CATEGORY}' is not seeded"))
        })?;

        let mut rules = Vec::with_capacity(raw.len());
        for rule in raw {
            let category_id = *categories.get(&rule.category).ok_or_else(|| {
                MonetaError::Config(format!(
                    "rule references unknown category '{}'",
                    rule.category
                ))
            })?;
            let mut constraints = Vec::with_capacity(rule.constraints.len());
            for (field, patterns) in rule.constraints {
                let compiled = patterns
                    .as_slice()
                    .iter()
                    .map(|p| anchored(p))
                    .collect::<Result<Vec<_>>>()?;
                constraints.push((field, compiled));
            }
            rules.push(ResolvedRule {
                constraints,
                category_id,
            });
        }

        Ok(Self {
            rules,
            default_category_id,
        })
    }

    /// Assign a category id. Rules are evaluated in declaration order; the
    /// first rule whose constraints all match wins. A constraint matches
    /// when the field is present and at least one alternative pattern
    /// matches a prefix of its string value. Total: every transaction gets
    /// a category.
    pub fn categorize(&self, transaction: GenericTransaction) -> CategorizedTransaction {
        for rule in &self.rules {
            let matched = rule.constraints.iter().all(|(field, patterns)| {
                match field.value_of(&transaction) {
                    Some(value) => patterns.iter().any(|re| re.is_match(&value)),
                    None => false,
                }
            });
            if matched {
                return CategorizedTransaction {
                    transaction,
                    category_id: rule.category_id,
                };
            }
        }
        CategorizedTransaction {
            transaction,
            category_id: self.default_category_id,
        }
    }

    /// Categorization against a public reference API. Not supported.
    #[allow(dead_code)]
    pub fn categorize_from_reference(
        &self,
        _transaction: &GenericTransaction,
    ) -> Result<CategorizedTransaction> {
        Err(MonetaError::NotImplemented("reference API categorization"))
    }
}

/// Patterns match from the start of the field value, like the mapping files
/// have always been written.
fn anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})"))
        .map_err(|e| MonetaError::Config(format!("bad pattern '{pattern}': {e}")))
}
