//! Category inference from the user's ledger category rules.

use crate::ledger::{CategoryRef, CategoryRule};

/// First rule matching `payee` wins; otherwise the current category stays.
pub fn infer_category<'a>(
    payee: &str,
    current: Option<&'a CategoryRef>,
    rules: &'a [CategoryRule],
) -> Option<&'a CategoryRef> {
    rules
        .iter()
        .find(|r| r.matches(payee))
        .map(|r| &r.category)
        .or(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cat(id: i64, title: &str) -> CategoryRef {
        CategoryRef {
            id,
            title: title.to_string(),
        }
    }

    fn rule(pattern: &str, id: i64) -> CategoryRule {
        CategoryRule {
            pattern: pattern.to_string(),
            category: cat(id, pattern),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![rule("grab", 10), rule("grab food", 11)];
        let current = cat(1, "Transfers");
        let inferred = infer_category("GRAB FOOD BKK", Some(&current), &rules).unwrap();
        assert_eq!(inferred.id, 10);
    }

    #[test]
    fn keeps_current_without_match() {
        let rules = vec![rule("grab", 10)];
        let current = cat(1, "Transfers");
        assert_eq!(
            infer_category("7-ELEVEN", Some(&current), &rules).map(|c| c.id),
            Some(1)
        );
        assert!(infer_category("7-ELEVEN", None, &rules).is_none());
    }
}
