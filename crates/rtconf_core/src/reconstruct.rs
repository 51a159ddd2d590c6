//! Rebuilding sectioned configuration from flat, pre-sorted records.

use crate::error::{CoreError, CoreResult};
use bson::{Bson, Document};
use std::fmt;
use tracing::debug;

/// Variable value that marks an include directive.
pub const INCLUDE_DIRECTIVE: &str = "#include";

/// One stored configuration line tagged with its section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    /// Section ordering metric; higher metrics come first.
    pub metric: i32,
    /// Section name.
    pub category: String,
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

impl CategoryRecord {
    /// Creates a record.
    pub fn new(
        metric: i32,
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            metric,
            category: category.into(),
            name: name.into(),
            value: value.into(),
        }
    }

    /// Reads a record from a static configuration document.
    ///
    /// Expects `cat_metric` (numeric, truncated to an integer) and the
    /// string fields `category`, `var_name` and `var_val`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Translation`] naming the first missing or
    /// mistyped field.
    pub fn from_document(document: &Document) -> CoreResult<Self> {
        #[allow(clippy::cast_possible_truncation)]
        let metric = match document.get("cat_metric") {
            Some(Bson::Double(d)) => *d as i32,
            Some(Bson::Int32(n)) => *n,
            Some(Bson::Int64(n)) => *n as i32,
            _ => return Err(missing("cat_metric")),
        };
        let text = |field: &'static str| {
            document
                .get_str(field)
                .map(str::to_string)
                .map_err(|_| missing(field))
        };
        Ok(Self {
            metric,
            category: text("category")?,
            name: text("var_name")?,
            value: text("var_val")?,
        })
    }

    /// Returns true if this record is an include directive.
    #[must_use]
    pub fn is_include(&self) -> bool {
        self.value == INCLUDE_DIRECTIVE
    }
}

fn missing(field: &str) -> CoreError {
    CoreError::translation(field, format!("no {field} found"))
}

/// A named section with ordered variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSection {
    name: String,
    variables: Vec<(String, String)>,
}

impl ConfigSection {
    /// Creates an empty section.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
        }
    }

    /// Section name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the section.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Appends a variable; duplicates are kept.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.push((name.into(), value.into()));
    }

    /// Returns the first value of a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Variables in order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.variables.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns true if the section has no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Ordered sections, as a configuration consumer sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigTree {
    sections: Vec<ConfigSection>,
}

impl ConfigTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section and returns its index.
    pub fn push(&mut self, section: ConfigSection) -> usize {
        self.sections.push(section);
        self.sections.len() - 1
    }

    /// Sections in order.
    #[must_use]
    pub fn sections(&self) -> &[ConfigSection] {
        &self.sections
    }

    /// First section with the given name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&ConfigSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns true if there are no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    fn section_mut(&mut self, index: usize) -> Option<&mut ConfigSection> {
        self.sections.get_mut(index)
    }
}

/// Renders `.conf` text.
impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (name, value) in section.variables() {
                writeln!(f, "{name} = {value}")?;
            }
        }
        Ok(())
    }
}

/// Performs the nested load an include directive asks for.
pub trait IncludeLoader {
    /// Loads `resource`, appending its sections to `tree`.
    ///
    /// # Errors
    ///
    /// Any error stops the reconstruction that asked for the include.
    fn include(&mut self, resource: &str, tree: &mut ConfigTree) -> CoreResult<()>;
}

impl<F> IncludeLoader for F
where
    F: FnMut(&str, &mut ConfigTree) -> CoreResult<()>,
{
    fn include(&mut self, resource: &str, tree: &mut ConfigTree) -> CoreResult<()> {
        self(resource, tree)
    }
}

/// Loader that refuses every include.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIncludes;

impl IncludeLoader for NoIncludes {
    fn include(&mut self, resource: &str, _tree: &mut ConfigTree) -> CoreResult<()> {
        Err(CoreError::include(resource, "includes are not enabled"))
    }
}

/// Fold state for one pass over a record stream.
///
/// A new section starts whenever the category name or the metric differs
/// from the previous record's. The first record always starts one.
#[derive(Debug, Default)]
pub struct Reconstructor {
    tree: ConfigTree,
    last_category: String,
    last_metric: Option<i32>,
    current: Option<usize>,
}

impl Reconstructor {
    /// Starts with an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues appending to an existing tree.
    #[must_use]
    pub fn with_tree(tree: ConfigTree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Consumes one record.
    ///
    /// # Errors
    ///
    /// Returns the include loader's error; the caller must stop feeding
    /// records after one.
    pub fn push(&mut self, record: CategoryRecord, includes: &mut dyn IncludeLoader) -> CoreResult<()> {
        if record.is_include() {
            includes.include(&record.name, &mut self.tree)?;
            debug!(resource = %record.name, "include loaded");
            return Ok(());
        }

        let boundary = self.last_metric != Some(record.metric) || self.last_category != record.category;
        let index = match self.current {
            Some(index) if !boundary => index,
            _ => {
                let index = self.tree.push(ConfigSection::new(record.category.clone()));
                self.last_category = record.category;
                self.last_metric = Some(record.metric);
                self.current = Some(index);
                index
            }
        };
        if let Some(section) = self.tree.section_mut(index) {
            section.push(record.name, record.value);
        }
        Ok(())
    }

    /// Returns the tree built so far.
    #[must_use]
    pub fn finish(self) -> ConfigTree {
        self.tree
    }
}

/// Outcome of a full pass over a record stream.
#[derive(Debug)]
pub struct Reconstruction {
    /// Sections built before the stream ended or was cut short.
    pub tree: ConfigTree,
    /// The include failure that stopped consumption, if any.
    pub interrupted: Option<CoreError>,
}

/// Folds `records` into a tree, stopping at the first failed include.
///
/// Records must already be in section order; they are never re-sorted.
///
/// # Example
///
/// ```rust
/// use rtconf_core::{reconstruct, CategoryRecord, NoIncludes};
///
/// let records = [
///     CategoryRecord::new(1, "general", "host", "a"),
///     CategoryRecord::new(1, "general", "port", "5"),
///     CategoryRecord::new(0, "auth", "user", "bob"),
/// ];
/// let tree = reconstruct(records, &mut NoIncludes).tree;
/// assert_eq!(tree.to_string(), "[general]\nhost = a\nport = 5\n\n[auth]\nuser = bob\n");
/// ```
pub fn reconstruct(
    records: impl IntoIterator<Item = CategoryRecord>,
    includes: &mut dyn IncludeLoader,
) -> Reconstruction {
    let mut reconstructor = Reconstructor::new();
    let mut interrupted = None;
    for record in records {
        if let Err(err) = reconstructor.push(record, includes) {
            interrupted = Some(err);
            break;
        }
    }
    Reconstruction {
        tree: reconstructor.finish(),
        interrupted,
    }
}
