use serde::{Deserialize, Serialize};

use crate::types::ValueType;

/// Single positional parameter of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Name of the parameter. Informational only; arguments are positional.
    pub name: String,
    /// Type every argument in this position must have.
    pub ty: ValueType,
}

impl ParamDef {
    /// Creates a parameter definition.
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Typed signature of a registered operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Unique operation name.
    pub name: String,
    /// Ordered parameter list.
    pub params: Vec<ParamDef>,
    /// Declared return type.
    pub returns: ValueType,
}

impl Signature {
    /// Number of arguments a call must carry.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
