//! Attribute list (`a=` lines)
//!
//! Attributes form an ordered multi-map: the same name may appear more
//! than once and insertion order is preserved, both of which matter for
//! round-trip fidelity.

/// A single `a=<name>[:<value>]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// `None` for flag attributes (`a=recvonly`), `Some` for valued ones
    pub value: Option<String>,
}

/// Ordered multi-map of session or media attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes {
    entries: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, preserving duplicates
    pub fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.entries.push(Attribute {
            name: name.into(),
            value,
        });
    }

    /// First value for `name`, if any
    ///
    /// Returns `Some(None)` for a flag attribute that is present without
    /// a value.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_deref())
    }

    /// All values for `name`, in insertion order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Option<&'a str>> + 'a {
        self.entries
            .iter()
            .filter(move |a| a.name == name)
            .map(|a| a.value.as_deref())
    }

    /// Whether an attribute with `name` is present
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Parse the body of an `a=` line (the part after `a=`)
    pub(crate) fn parse_body(body: &str) -> Attribute {
        match body.split_once(':') {
            Some((name, value)) => Attribute {
                name: name.to_string(),
                value: Some(value.to_string()),
            },
            None => Attribute {
                name: body.to_string(),
                value: None,
            },
        }
    }

    pub(crate) fn push_attribute(&mut self, attribute: Attribute) {
        self.entries.push(attribute);
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Display for Attribute {
    /// Formats the `a=` line body (without the `a=` prefix)
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.name, value),
            None => write!(f, "{}", self.name),
        }
    }
}
