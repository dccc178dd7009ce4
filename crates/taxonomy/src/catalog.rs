//! Read-only taxonomy catalog.

use std::collections::BTreeMap;

use thiserror::Error;

/// Lookup failure: a code does not exist at the given level (or under the
/// given parent).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown {level} code: {code}")]
pub struct TaxonomyError {
    pub level: &'static str,
    pub code: String,
}

impl TaxonomyError {
    fn not_found(level: &'static str, code: &str) -> Self {
        Self {
            level,
            code: code.to_string(),
        }
    }
}

/// Resolved names for a validated (department, category, subcategory) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxonomyNames<'a> {
    pub department: &'a str,
    pub category: &'a str,
    pub subcategory: &'a str,
}

#[derive(Debug, Clone)]
struct Category {
    name: String,
    subcategories: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct Department {
    name: String,
    categories: BTreeMap<String, Category>,
}

/// Static mapping of valid category codes and names. No mutation after load.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyCatalog {
    departments: BTreeMap<String, Department>,
}

impl TaxonomyCatalog {
    pub(crate) fn from_entries(
        entries: &[(&str, &str, &[(&str, &str, &[(&str, &str)])])],
    ) -> Self {
        let mut departments = BTreeMap::new();
        for (dept_code, dept_name, categories) in entries {
            let mut cats = BTreeMap::new();
            for (cat_code, cat_name, subs) in categories.iter() {
                let subcategories = subs
                    .iter()
                    .map(|(code, name)| (code.to_string(), name.to_string()))
                    .collect();
                cats.insert(
                    cat_code.to_string(),
                    Category {
                        name: cat_name.to_string(),
                        subcategories,
                    },
                );
            }
            departments.insert(
                dept_code.to_string(),
                Department {
                    name: dept_name.to_string(),
                    categories: cats,
                },
            );
        }
        Self { departments }
    }

    /// True iff the full triple exists in the hierarchy.
    pub fn validate(&self, department: &str, category: &str, subcategory: &str) -> bool {
        self.lookup_names(department, category, subcategory).is_ok()
    }

    /// Resolve the names for a code triple, identifying the first level at
    /// which resolution fails.
    pub fn lookup_names(
        &self,
        department: &str,
        category: &str,
        subcategory: &str,
    ) -> Result<TaxonomyNames<'_>, TaxonomyError> {
        let dept = self
            .departments
            .get(department)
            .ok_or_else(|| TaxonomyError::not_found("department", department))?;
        let cat = dept
            .categories
            .get(category)
            .ok_or_else(|| TaxonomyError::not_found("category", category))?;
        let sub = cat
            .subcategories
            .get(subcategory)
            .ok_or_else(|| TaxonomyError::not_found("subcategory", subcategory))?;
        Ok(TaxonomyNames {
            department: &dept.name,
            category: &cat.name,
            subcategory: sub,
        })
    }

    /// All (code, name) departments, in code order.
    pub fn departments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.departments
            .iter()
            .map(|(code, d)| (code.as_str(), d.name.as_str()))
    }

    /// All (code, name) categories under a department; empty if the
    /// department is unknown.
    pub fn categories(&self, department: &str) -> impl Iterator<Item = (&str, &str)> {
        self.departments
            .get(department)
            .into_iter()
            .flat_map(|d| d.categories.iter())
            .map(|(code, c)| (code.as_str(), c.name.as_str()))
    }

    /// All (code, name) subcategories under a category; empty if unknown.
    pub fn subcategories(
        &self,
        department: &str,
        category: &str,
    ) -> impl Iterator<Item = (&str, &str)> {
        self.departments
            .get(department)
            .and_then(|d| d.categories.get(category))
            .into_iter()
            .flat_map(|c| c.subcategories.iter())
            .map(|(code, name)| (code.as_str(), name.as_str()))
    }

    pub fn subcategory_count(&self) -> usize {
        self.departments
            .values()
            .flat_map(|d| d.categories.values())
            .map(|c| c.subcategories.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_shape() {
        let catalog = TaxonomyCatalog::builtin();
        assert_eq!(catalog.departments().count(), 1);
        assert_eq!(catalog.categories("D03").count(), 16);
        assert!(catalog.subcategory_count() >= 150);
    }

    #[test]
    fn validates_known_triples() {
        let catalog = TaxonomyCatalog::builtin();
        assert!(catalog.validate("D03", "S47", "C163"));
        assert!(catalog.validate("D03", "S41", "C755"));
        assert!(catalog.validate("D03", "S74", "C788"));
    }

    #[test]
    fn rejects_unknown_codes_at_each_level() {
        let catalog = TaxonomyCatalog::builtin();
        assert!(!catalog.validate("D99", "S47", "C163"));
        assert!(!catalog.validate("D03", "S99", "C163"));
        assert!(!catalog.validate("D03", "S47", "C999"));
        // Subcategory exists, but under a different category.
        assert!(!catalog.validate("D03", "S47", "C037"));
    }

    #[test]
    fn lookup_names_resolves_and_reports_failing_level() {
        let catalog = TaxonomyCatalog::builtin();
        let names = catalog.lookup_names("D03", "S47", "C163").unwrap();
        assert_eq!(names.department, "MRO: MATERIAL, REPARO E OPERAÇÃO");
        assert_eq!(names.category, "MATERIAIS ELÉTRICOS E ELETRÔNICOS");
        assert_eq!(names.subcategory, "Fusíveis e disjuntores");

        let err = catalog.lookup_names("D03", "S99", "C163").unwrap_err();
        assert_eq!(err.level, "category");
        assert_eq!(err.code, "S99");
    }

    #[test]
    fn duplicate_subcategory_codes_stay_scoped_to_their_category() {
        // C719/C722 exist under both S46 and S71 in the source data.
        let catalog = TaxonomyCatalog::builtin();
        assert!(catalog.validate("D03", "S46", "C719"));
        assert!(catalog.validate("D03", "S71", "C719"));
        assert_eq!(
            catalog.lookup_names("D03", "S71", "C722").unwrap().subcategory,
            "Válvulas"
        );
    }
}
