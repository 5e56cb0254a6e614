//! The Makefile rule graph shared by every document of a run.
//!
//! Documents register rules and variables in arbitrary order; the graph owns
//! all of them and decides what is a no-op. Copy rules are registered once
//! per target, flag-style variables once per name, and default-rule markers
//! once per marker. Cumulative list variables (`htmlFiles`, ...) always grow.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::recipe::CopyRule;

/// A single `target: prerequisites` block with its recipe lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub target: String,
    pub prerequisites: Vec<String>,
    /// Recipe lines without the leading tab
    pub recipe: Vec<String>,
}

impl RuleEntry {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            prerequisites: Vec::new(),
            recipe: Vec::new(),
        }
    }

    pub fn with_prerequisites<I, S>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prerequisites
            .extend(prerequisites.into_iter().map(Into::into));
        self
    }

    pub fn with_recipe<I, S>(mut self, recipe: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipe.extend(recipe.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for RuleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.target)?;
        for prerequisite in &self.prerequisites {
            write!(f, " {}", prerequisite)?;
        }
        writeln!(f)?;
        for line in &self.recipe {
            writeln!(f, "\t{}", line)?;
        }
        Ok(())
    }
}

/// Anything emitted after the default rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Entry(RuleEntry),
    /// Verbatim text, e.g. a conditional block
    Raw(String),
}

impl From<RuleEntry> for Rule {
    fn from(entry: RuleEntry) -> Self {
        Rule::Entry(entry)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Entry(entry) => fmt::Display::fmt(entry, f),
            Rule::Raw(text) => writeln!(f, "{}", text.trim_matches('\n')),
        }
    }
}

/// A Makefile variable holding an ordered list of words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedVariable {
    pub name: String,
    pub values: Vec<String>,
}

impl fmt::Display for NamedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = format!("{} = {}", self.name, self.values.join(" "));
        writeln!(f, "{}", line.trim_end())
    }
}

/// Rule and variable accumulator, rendered once at the end of a run
#[derive(Debug, Clone)]
pub struct RuleGraph {
    variables: Vec<NamedVariable>,
    variable_index: HashMap<String, usize>,
    default_rule: RuleEntry,
    rules: Vec<Rule>,
    targets: HashSet<String>,
}

impl Default for RuleGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleGraph {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            variable_index: HashMap::new(),
            default_rule: RuleEntry::new("all"),
            rules: Vec::new(),
            targets: HashSet::new(),
        }
    }

    /// Replace the default rule's target and recipe, keeping its prerequisites
    pub fn set_default_rule(&mut self, target: impl Into<String>, recipe: Vec<String>) {
        self.default_rule.target = target.into();
        self.default_rule.recipe = recipe;
    }

    pub fn default_rule(&self) -> &RuleEntry {
        &self.default_rule
    }

    /// Mutable access to the default rule's prerequisites.
    ///
    /// The list does not deduplicate; prefer
    /// [`RuleGraph::require_default_prerequisite`].
    pub fn default_rule_prerequisites(&mut self) -> &mut Vec<String> {
        &mut self.default_rule.prerequisites
    }

    /// Add `marker` to the default rule's prerequisites unless already present
    pub fn require_default_prerequisite(&mut self, marker: &str) -> bool {
        let prerequisites = self.default_rule_prerequisites();
        if prerequisites.iter().any(|p| p == marker) {
            return false;
        }
        prerequisites.push(marker.to_string());
        true
    }

    /// Append a rule in registration order
    pub fn add_rule(&mut self, entry: RuleEntry) {
        if !self.targets.insert(entry.target.clone()) {
            tracing::warn!("Target {} is registered by more than one rule", entry.target);
        }
        tracing::debug!("Adding rule for {}", entry.target);
        self.rules.push(Rule::Entry(entry));
    }

    /// Append verbatim text in registration order
    pub fn add_raw(&mut self, text: impl Into<String>) {
        self.rules.push(Rule::Raw(text.into()));
    }

    /// Register a verbatim-copy rule unless `target` already has a rule.
    ///
    /// Returns whether a rule was added.
    pub fn add_copy_rule(&mut self, target: &str, source: &str) -> bool {
        if self.has_target(target) {
            tracing::debug!("Copy rule for {} already registered", target);
            return false;
        }
        self.add_rule(
            CopyRule {
                target: target.to_string(),
                source: source.to_string(),
            }
            .into_entry(),
        );
        true
    }

    pub fn has_target(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    /// Append `value` to `name`, creating the variable on first use
    pub fn append_to_variable(&mut self, name: &str, value: impl Into<String>) {
        let idx = match self.variable_index.get(name) {
            Some(&idx) => idx,
            None => {
                self.variables.push(NamedVariable {
                    name: name.to_string(),
                    values: Vec::new(),
                });
                let idx = self.variables.len() - 1;
                self.variable_index.insert(name.to_string(), idx);
                idx
            }
        };
        self.variables[idx].values.push(value.into());
    }

    pub fn variable_is_set(&self, name: &str) -> bool {
        self.variable_index.contains_key(name)
    }

    /// Set `name` to `value` unless it already exists; first registration wins
    pub fn set_variable_once(&mut self, name: &str, value: impl Into<String>) -> bool {
        if self.variable_is_set(name) {
            return false;
        }
        self.append_to_variable(name, value);
        true
    }

    pub fn variable(&self, name: &str) -> Option<&NamedVariable> {
        self.variable_index.get(name).map(|&idx| &self.variables[idx])
    }

    pub fn variables(&self) -> &[NamedVariable] {
        &self.variables
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule entries (not raw blocks) for `target`
    pub fn rules_for<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a RuleEntry> + 'a {
        self.rules.iter().filter_map(move |rule| match rule {
            Rule::Entry(entry) if entry.target == target => Some(entry),
            _ => None,
        })
    }

    /// Serialize: variables, then the default rule, then every other rule
    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Write the rendered graph to `path` through a temporary sibling file
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Makefile".to_string());
        let staging = path.with_file_name(format!(".{}.tmp", file_name));
        fs::write(&staging, self.render())?;
        fs::rename(&staging, path)
    }
}

impl fmt::Display for RuleGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.variables.is_empty() {
            for variable in &self.variables {
                fmt::Display::fmt(variable, f)?;
            }
            writeln!(f)?;
        }

        fmt::Display::fmt(&self.default_rule, f)?;
        for rule in &self.rules {
            writeln!(f)?;
            fmt::Display::fmt(rule, f)?;
        }
        Ok(())
    }
}
