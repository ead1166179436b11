use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Immutable validation outcome for one test case.
///
/// `passed` holds exactly when `issues` is empty; a failing verdict always
/// carries at least one concrete issue string. `fields` keeps the values
/// extracted during validation (`sort_<field>`, `filter_<field>`,
/// `view_<entity>.<field>`) for downstream reporting. The field map is
/// ordered so that re-running a verification over identical inputs yields
/// byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    passed: bool,
    issues: Vec<String>,
    fields: BTreeMap<String, Vec<Value>>,
}

impl Verdict {
    /// Creates a verdict from accumulated issues and extracted fields.
    #[must_use]
    pub fn new(issues: Vec<String>, fields: BTreeMap<String, Vec<Value>>) -> Self {
        Self {
            passed: issues.is_empty(),
            issues,
            fields,
        }
    }

    /// Returns whether the test case passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Returns the ordered issue strings.
    #[must_use]
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Returns the extracted display fields.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::Verdict;

    #[test]
    fn passes_only_with_empty_issues() {
        let passing = Verdict::new(Vec::new(), BTreeMap::new());
        assert!(passing.passed());

        let failing = Verdict::new(vec!["sort 'name' violates asc order".to_owned()], BTreeMap::new());
        assert!(!failing.passed());
        assert_eq!(failing.issues().len(), 1);
    }
}
