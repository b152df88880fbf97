//! Ordered, data-declared regex tables.
//!
//! Every classification step in the capture engine is a [`RuleTable`]: an
//! ordered list of `(value, pattern)` rules evaluated top to bottom.  New
//! rules are added by extending a table, never by touching control flow, and
//! the "first match wins" policy lives in exactly one place
//! ([`RuleTable::first_match`]).

use regex::Regex;

/// A single compiled rule.
#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub value: T,
    pattern: Regex,
}

impl<T> Rule<T> {
    pub fn new(value: T, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            value,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// An ordered list of rules.
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    rules: Vec<Rule<T>>,
}

impl<T: Clone> RuleTable<T> {
    /// Compile a table from `(value, pattern)` pairs, preserving order.
    pub fn compile(table: &[(T, &str)]) -> Result<Self, regex::Error> {
        let rules = table
            .iter()
            .map(|(value, pattern)| Rule::new(value.clone(), pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }
}

impl<T> RuleTable<T> {
    /// Value of the first rule whose pattern matches `text`.
    pub fn first_match(&self, text: &str) -> Option<&T> {
        self.rules.iter().find(|r| r.is_match(text)).map(|r| &r.value)
    }

    pub fn any_match(&self, text: &str) -> bool {
        self.rules.iter().any(|r| r.is_match(text))
    }

    /// Append a rule with the lowest priority.
    pub fn push(&mut self, rule: Rule<T>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
