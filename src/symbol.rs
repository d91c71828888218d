//! Symbol model consumed by the scanner.
//!
//! A symbol set is a read-only table of types, each with its own annotations
//! and its declared methods. Annotations are identified by their fully
//! qualified name only; parameters are never modeled.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Error raised by a symbol source while producing a type.
pub type SymbolError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationRef(String);

impl AnnotationRef {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self(qualified_name.into())
    }

    pub fn qualified_name(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AnnotationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AnnotationRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AnnotationRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSymbol {
    pub name: String,
    #[serde(default)]
    pub annotations: BTreeSet<AnnotationRef>,
}

impl MethodSymbol {
    pub fn new<I, A>(name: impl Into<String>, annotations: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AnnotationRef>,
    {
        Self {
            name: name.into(),
            annotations: annotations.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_annotation(&self, annotation: &AnnotationRef) -> bool {
        self.annotations.contains(annotation)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSymbol {
    pub qualified_name: String,
    #[serde(default)]
    pub annotations: BTreeSet<AnnotationRef>,
    /// Declared methods, in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodSymbol>,
}

impl TypeSymbol {
    pub fn new<I, A>(qualified_name: impl Into<String>, annotations: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<AnnotationRef>,
    {
        Self {
            qualified_name: qualified_name.into(),
            annotations: annotations.into_iter().map(Into::into).collect(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodSymbol) -> Self {
        self.methods.push(method);
        self
    }

    pub fn has_annotation(&self, annotation: &AnnotationRef) -> bool {
        self.annotations.contains(annotation)
    }
}

/// Types keyed by qualified name. Duplicates collapse onto the first entry
/// seen; iteration follows discovery order.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    types: Vec<TypeSymbol>,
    index: HashMap<String, usize>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when a type with the same qualified name is already present.
    pub fn insert(&mut self, symbol: TypeSymbol) -> bool {
        if self.index.contains_key(&symbol.qualified_name) {
            return false;
        }
        self.index
            .insert(symbol.qualified_name.clone(), self.types.len());
        self.types.push(symbol);
        true
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeSymbol> {
        self.index.get(qualified_name).map(|&i| &self.types[i])
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.index.contains_key(qualified_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeSymbol> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<TypeSymbol> for SymbolSet {
    fn from_iter<I: IntoIterator<Item = TypeSymbol>>(iter: I) -> Self {
        let mut set = SymbolSet::new();
        for symbol in iter {
            set.insert(symbol);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a TypeSymbol;
    type IntoIter = std::slice::Iter<'a, TypeSymbol>;

    fn into_iter(self) -> Self::IntoIter {
        self.types.iter()
    }
}
