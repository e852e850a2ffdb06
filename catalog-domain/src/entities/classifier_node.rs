//! # ClassifierNode Entity
//!
//! One entry of an external taxonomy (KPVED, OKPD2, ...). Forms a tree via
//! `parent_code`; leaves are the most specific codes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierNode {
    code: String,
    name: String,
    parent_code: Option<String>,
    level: u32,
}

impl ClassifierNode {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        parent_code: Option<String>,
        level: u32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            parent_code,
            level,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_code(&self) -> Option<&str> {
        self.parent_code.as_deref()
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn is_root(&self) -> bool {
        self.level == 1 && self.parent_code.is_none()
    }

    /// Validates this node's own shape (spec.md §3 invariant: level-1
    /// nodes have no parent; every other level must have one). Does not
    /// check that the parent actually exists at `level - 1` — that
    /// requires the repository and is checked by
    /// `ClassifierRepository::validate_tree`.
    pub fn has_consistent_parent_shape(&self) -> bool {
        if self.level == 1 {
            self.parent_code.is_none()
        } else {
            self.parent_code.is_some()
        }
    }
}
