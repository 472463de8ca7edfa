// ABOUTME: Ordered substring rules mapping error text to a failure type.
// ABOUTME: Logic rules are evaluated before environmental ones; first match wins.

use super::FailureType;

const LOGIC_PATTERNS: &[&str] = &[
    "syntax",
    "lint",
    "validation",
    "invalid",
    "parameter",
    "missing required",
    "bcp",
    "schema",
];

const ENVIRONMENTAL_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "throttl",
    "too many requests",
    "quota",
    "connection",
    "network",
    "service unavailable",
    "temporarily unavailable",
];

/// A single classification rule: case-insensitive substring match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationRule {
    pattern: String,
    category: FailureType,
}

impl ClassificationRule {
    pub fn new(pattern: &str, category: FailureType) -> Self {
        Self {
            pattern: pattern.to_lowercase(),
            category,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn category(&self) -> FailureType {
        self.category
    }

    /// `text` must already be lower-cased.
    fn matches(&self, text: &str) -> bool {
        text.contains(&self.pattern)
    }
}

/// Maps free-text failure descriptions to a [`FailureType`].
///
/// Rules are evaluated in order; the first match decides the category, so a
/// message mentioning both an invalid parameter and a timeout is a logic
/// failure.
#[derive(Debug, Clone)]
pub struct FailureClassifier {
    rules: Vec<ClassificationRule>,
}

impl FailureClassifier {
    pub fn new() -> Self {
        let rules = LOGIC_PATTERNS
            .iter()
            .map(|p| ClassificationRule::new(p, FailureType::Logic))
            .chain(
                ENVIRONMENTAL_PATTERNS
                    .iter()
                    .map(|p| ClassificationRule::new(p, FailureType::Environmental)),
            )
            .collect();
        Self { rules }
    }

    /// Use a custom ordered rule set.
    pub fn with_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    pub fn classify(&self, error_text: &str) -> FailureType {
        let category = self
            .matching_rule(error_text)
            .map(ClassificationRule::category)
            .unwrap_or(FailureType::Unknown);
        tracing::debug!(%category, "classified failure");
        category
    }

    /// First rule that matches `error_text`, if any.
    pub fn matching_rule(&self, error_text: &str) -> Option<&ClassificationRule> {
        if error_text.trim().is_empty() {
            return None;
        }
        let text = error_text.to_lowercase();
        self.rules.iter().find(|rule| rule.matches(&text))
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logic_rules_take_precedence() {
        let classifier = FailureClassifier::new();
        let text = "InvalidParameter: connection string timeout value is malformed";
        assert_eq!(classifier.classify(text), FailureType::Logic);
        assert_eq!(classifier.matching_rule(text).unwrap().pattern(), "invalid");
    }

    #[test]
    fn default_rules_list_logic_before_environmental() {
        let classifier = FailureClassifier::new();
        let first_env = classifier
            .rules()
            .iter()
            .position(|r| r.category() == FailureType::Environmental)
            .unwrap();
        assert!(classifier.rules()[..first_env]
            .iter()
            .all(|r| r.category() == FailureType::Logic));
        assert!(classifier.rules()[first_env..]
            .iter()
            .all(|r| r.category() == FailureType::Environmental));
    }
}
