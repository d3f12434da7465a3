// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Nominal type universe and the wiring-compatibility algebra.
//!
//! Every processor declares a [`TypeData`] — an immutable `(input, output)`
//! pair of [`DataType`] descriptors — and pipeline validation is expressed
//! entirely as pure predicates over the subtype relation between adjacent
//! processors. The algebra is never used for runtime dispatch: payload
//! conversion is each processor's own business.
//!
//! Types are nominal and form a single-inheritance chain rooted at
//! [`DataType::ANY`]. They are `const`-constructible so a type universe can
//! be declared as `static` items:
//!
//! ```rust
//! use trellis::typedata::{DataType, TypeData};
//!
//! static MEDIA: DataType = DataType::new("media");
//! static IMAGE: DataType = DataType::subtype_of("image", &MEDIA);
//!
//! let loader = TypeData::new(DataType::ANY, IMAGE);
//! let scaler = TypeData::new(MEDIA, MEDIA);
//! assert!(loader.can_come_before(&scaler));
//! ```

use std::fmt;

/// A nominal type descriptor with an optional supertype.
///
/// Subtyping walks the parent chain; every type constructed with
/// [`DataType::new`] is implicitly a subtype of [`DataType::ANY`].
/// Equality is by name, which is what makes the universe nominal.
#[derive(Debug, Clone, Copy)]
pub struct DataType {
    name: &'static str,
    parent: Option<&'static DataType>,
}

impl DataType {
    /// The top type: every type is a subtype of `ANY`, and `ANY` is a
    /// subtype only of itself. Used for untyped endpoints.
    pub const ANY: DataType = DataType {
        name: "any",
        parent: None,
    };

    /// A new type directly under [`DataType::ANY`].
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            parent: Some(&Self::ANY),
        }
    }

    /// A new type with an explicit supertype.
    pub const fn subtype_of(name: &'static str, parent: &'static DataType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True iff `self` equals `other` or `other` appears somewhere in
    /// `self`'s supertype chain.
    pub fn is_subtype_of(&self, other: &DataType) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty.name == other.name {
                return true;
            }
            current = ty.parent;
        }
        false
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DataType {}

impl std::hash::Hash for DataType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Immutable `(input, output)` type pair for one processor version.
///
/// Created once at construction time, shared by value, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeData {
    input: DataType,
    output: DataType,
}

impl TypeData {
    pub const fn new(input: DataType, output: DataType) -> Self {
        Self { input, output }
    }

    pub fn input(&self) -> &DataType {
        &self.input
    }

    pub fn output(&self) -> &DataType {
        &self.output
    }

    /// True iff this processor's output can feed the other's input.
    pub fn can_come_before(&self, other: &TypeData) -> bool {
        self.output.is_subtype_of(&other.input)
    }

    /// Symmetric check in the opposite direction:
    /// `a.can_come_before(b) == b.can_come_after(a)`.
    pub fn can_come_after(&self, other: &TypeData) -> bool {
        other.output.is_subtype_of(&self.input)
    }

    /// True iff this processor can be the first child of a workflow with
    /// the given declared type.
    pub fn can_be_at_start_of_workflow(&self, workflow: &TypeData) -> bool {
        workflow.input.is_subtype_of(&self.input)
    }

    /// True iff this processor can be the last child of a workflow with
    /// the given declared type.
    pub fn can_be_at_end_of_workflow(&self, workflow: &TypeData) -> bool {
        self.output.is_subtype_of(&workflow.output)
    }

    /// True iff a node with this type may hold zero children and act as a
    /// pass-through, i.e. its input type already satisfies its output type.
    pub fn can_be_empty_container(&self) -> bool {
        self.input.is_subtype_of(&self.output)
    }
}

impl Default for TypeData {
    fn default() -> Self {
        Self::new(DataType::ANY, DataType::ANY)
    }
}

impl fmt::Display for TypeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{},{}>", self.input, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static NUMBER: DataType = DataType::new("number");
    static INT: DataType = DataType::subtype_of("int", &NUMBER);
    static TEXT: DataType = DataType::new("text");

    #[test]
    fn subtype_chain_walks_to_any() {
        assert!(INT.is_subtype_of(&NUMBER));
        assert!(INT.is_subtype_of(&DataType::ANY));
        assert!(NUMBER.is_subtype_of(&DataType::ANY));
        assert!(!NUMBER.is_subtype_of(&INT));
        assert!(!TEXT.is_subtype_of(&NUMBER));
        assert!(DataType::ANY.is_subtype_of(&DataType::ANY));
    }

    #[test]
    fn come_before_accepts_subtyped_output() {
        let producer = TypeData::new(TEXT, INT);
        let consumer = TypeData::new(NUMBER, TEXT);
        assert!(producer.can_come_before(&consumer));
        // A `number` output is too wide for an `int` input.
        let wide = TypeData::new(TEXT, NUMBER);
        let narrow = TypeData::new(INT, INT);
        assert!(!wide.can_come_before(&narrow));
    }

    #[test]
    fn before_after_symmetry_law() {
        let pairs = [
            TypeData::new(TEXT, INT),
            TypeData::new(NUMBER, TEXT),
            TypeData::new(INT, INT),
            TypeData::default(),
        ];
        for a in &pairs {
            for b in &pairs {
                assert_eq!(
                    a.can_come_before(b),
                    b.can_come_after(a),
                    "symmetry violated for {} / {}",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn workflow_boundary_checks() {
        let workflow = TypeData::new(INT, TEXT);
        let first = TypeData::new(NUMBER, NUMBER);
        let last = TypeData::new(NUMBER, TEXT);
        assert!(first.can_be_at_start_of_workflow(&workflow));
        assert!(last.can_be_at_end_of_workflow(&workflow));
        // A workflow input of `number` is too wide for an `int` consumer.
        let narrow = TypeData::new(INT, INT);
        let wide_workflow = TypeData::new(NUMBER, NUMBER);
        assert!(!narrow.can_be_at_start_of_workflow(&wide_workflow));
    }

    #[test]
    fn empty_container_requires_assignable_identity() {
        assert!(TypeData::new(INT, NUMBER).can_be_empty_container());
        assert!(TypeData::new(INT, INT).can_be_empty_container());
        assert!(!TypeData::new(NUMBER, INT).can_be_empty_container());
        assert!(TypeData::default().can_be_empty_container());
    }

    #[test]
    fn display_formats_as_angle_pair() {
        assert_eq!(TypeData::new(INT, TEXT).to_string(), "<int,text>");
        assert_eq!(TypeData::default().to_string(), "<any,any>");
    }
}
