//! JLS language-level gates.

use serde::{Deserialize, Serialize};

/// The language level the program under analysis was written for. Every
/// version-dependent rule in this crate consults one of the predicates below
/// rather than comparing levels inline.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum LanguageLevel {
    /// Pre-generics Java: erasure-only overriding.
    Jdk1_4,
    Jdk5,
    Jdk6,
    Jdk7,
    Jdk8,
    Jdk9,
}

impl LanguageLevel {
    /// Generics and covariant return types (JLS 8.4.8.3 since Java 5).
    pub fn has_generics(self) -> bool {
        self >= LanguageLevel::Jdk5
    }

    /// Diamond (`<>`) instantiation and improved inference (Java 7).
    pub fn has_diamond(self) -> bool {
        self >= LanguageLevel::Jdk7
    }

    /// Default methods and static interface methods (Java 8).
    pub fn has_default_methods(self) -> bool {
        self >= LanguageLevel::Jdk8
    }

    /// Private interface methods (Java 9).
    pub fn has_private_interface_methods(self) -> bool {
        self >= LanguageLevel::Jdk9
    }
}
