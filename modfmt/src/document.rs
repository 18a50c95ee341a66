//! Document buffer and the ordered rule engine shared by every stage
//!
//! A stage is nothing more than a fixed, ordered list of named [`Rule`]s.
//! Each rule is a pure `&str -> String` rewrite over the whole buffer; the
//! output of one rule is the input of the next. Keeping the rules as named
//! values lets tests and `modfmt list-rules` address them one at a time.

use thiserror::Error;

/// Upper bound on backtracking steps for patterns that need lookaround or
/// backreferences. Whole modules are a few hundred kilobytes at most.
pub const BACKTRACK_LIMIT: usize = 50_000_000;

/// Signature of a single rewrite rule
pub type RuleFn = fn(&str) -> Result<String, fancy_regex::Error>;

/// A named, whole-buffer rewrite
#[derive(Clone, Copy)]
pub struct Rule {
    /// Stable kebab-case identifier
    pub name: &'static str,
    /// One-line summary shown by `list-rules`
    pub description: &'static str,
    /// The rewrite itself
    pub apply: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

/// Errors raised while rewriting a document
#[derive(Error, Debug)]
pub enum RewriteError {
    /// The backtracking regex engine gave up on a pattern
    #[error("rule '{rule}' failed: {source}")]
    Regex {
        /// Name of the rule that failed
        rule: &'static str,
        #[source]
        source: fancy_regex::Error,
    },
}

/// The single mutable text buffer rewritten in place by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    content: String,
}

impl Document {
    /// Wrap raw input text
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Apply one rule to the buffer
    ///
    /// # Returns
    /// * `Ok(true)` - The rule changed the buffer
    /// * `Ok(false)` - The rule matched nothing
    /// * `Err(RewriteError)` - The regex engine failed; the buffer is left untouched
    pub fn apply(&mut self, rule: &Rule) -> Result<bool, RewriteError> {
        let rewritten = (rule.apply)(&self.content).map_err(|source| RewriteError::Regex {
            rule: rule.name,
            source,
        })?;

        let changed = rewritten != self.content;
        log::debug!(
            "rule {}: {}",
            rule.name,
            if changed { "rewrote buffer" } else { "no match" }
        );
        self.content = rewritten;
        Ok(changed)
    }

    /// Apply every rule in order, each seeing the previous rule's output
    pub fn apply_all(&mut self, rules: &[Rule]) -> Result<usize, RewriteError> {
        let mut changed = 0;
        for rule in rules {
            if self.apply(rule)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Consume the document, returning the buffer
    pub fn into_string(self) -> String {
        self.content
    }
}

/// Run `rules` over `text` and return the rewritten text
pub fn run_rules(text: &str, rules: &[Rule]) -> Result<String, RewriteError> {
    let mut document = Document::new(text);
    let changed = document.apply_all(rules)?;
    log::debug!("{} of {} rules changed the buffer", changed, rules.len());
    Ok(document.into_string())
}

/// Compile a pattern for the backtracking engine with the crate-wide limit
///
/// Only called on hardcoded patterns, so failure is a programming error.
pub fn backtracking_regex(pattern: &str) -> fancy_regex::Regex {
    fancy_regex::RegexBuilder::new(pattern)
        .backtrack_limit(BACKTRACK_LIMIT)
        .build()
        .expect("backtracking regex is valid")
}

/// Replace every match of a backtracking pattern, propagating engine failures
pub fn replace_all_backtracking(
    re: &fancy_regex::Regex,
    text: &str,
    replacement: &str,
) -> Result<String, fancy_regex::Error> {
    Ok(re.try_replacen(text, 0, replacement)?.into_owned())
}
