//! Schedulability method catalog.
//!
//! The device answers once per enabled method, in ascending id order. The
//! catalog tells the decoder how many answers to expect and the validator
//! which ids are legal.

use crate::error::{BenchError, Result};

/// Id and name of every method the firmware knows, in response order.
pub const STANDARD_METHODS: [(i32, &str); 6] = [
    (0, "het"),
    (1, "het2"),
    (2, "rta"),
    (3, "rta2"),
    (4, "rta3"),
    (5, "rta4"),
];

/// One schedulability test method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Stable wire id.
    pub id: i32,
    /// Canonical lowercase name.
    pub name: String,
}

impl MethodDescriptor {
    /// Create a descriptor.
    pub fn new(id: i32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Immutable, ordered set of methods expected in every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCatalog {
    methods: Vec<MethodDescriptor>,
}

impl MethodCatalog {
    /// Build a catalog from descriptors.
    ///
    /// Descriptors are sorted by id. Empty catalogs and duplicate ids are
    /// rejected.
    pub fn new(mut methods: Vec<MethodDescriptor>) -> Result<Self> {
        if methods.is_empty() {
            return Err(BenchError::Config(
                "Method catalog must not be empty".to_string(),
            ));
        }

        methods.sort_by_key(|m| m.id);
        if let Some(pair) = methods.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(BenchError::Config(format!(
                "Duplicate method id {} in catalog",
                pair[0].id
            )));
        }

        Ok(Self { methods })
    }

    /// The full six-method catalog.
    pub fn standard() -> Self {
        Self {
            methods: STANDARD_METHODS
                .iter()
                .map(|(id, name)| MethodDescriptor::new(*id, name))
                .collect(),
        }
    }

    /// Select methods from the standard catalog by name (case-insensitive).
    ///
    /// The result keeps catalog order regardless of the order of `names`.
    pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let mut methods = Vec::with_capacity(names.len());

        for name in names {
            let wanted = name.as_ref().to_ascii_lowercase();
            let (id, canonical) = STANDARD_METHODS
                .iter()
                .find(|(_, n)| *n == wanted)
                .ok_or_else(|| {
                    BenchError::Config(format!("Unknown method: {}", name.as_ref()))
                })?;
            methods.push(MethodDescriptor::new(*id, canonical));
        }

        Self::new(methods)
    }

    /// Number of methods, i.e. answers per response.
    #[inline]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Always false for a constructed catalog.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Check if an id belongs to the catalog.
    pub fn contains(&self, id: i32) -> bool {
        self.methods.iter().any(|m| m.id == id)
    }

    /// Look up a method name by id.
    pub fn name_of(&self, id: i32) -> Option<&str> {
        self.methods
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.as_str())
    }

    /// Iterate methods in response order.
    pub fn iter(&self) -> std::slice::Iter<'_, MethodDescriptor> {
        self.methods.iter()
    }
}

impl Default for MethodCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
