use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use buoy_core::{CallError, ParamDef, Signature, Value, ValueType};

// ---------------------------------------------------------------------------
// OperationHandler trait
// ---------------------------------------------------------------------------

/// Callable bound to a registered operation.
///
/// Handlers receive arguments that have already been validated against the
/// operation's declared parameters. Any `Err` they return, and any panic they
/// raise, is reported to the caller as `CallError::HandlerFailure`.
pub trait OperationHandler: Send + Sync {
    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error when the operation cannot produce a value.
    fn call(&self, args: &[Value]) -> anyhow::Result<Value>;
}

impl<F> OperationHandler for F
where
    F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, args: &[Value]) -> anyhow::Result<Value> {
        self(args)
    }
}

// ---------------------------------------------------------------------------
// OperationEntry
// ---------------------------------------------------------------------------

/// Immutable registry entry: signature plus handler.
pub struct OperationEntry {
    signature: Signature,
    handler: Arc<dyn OperationHandler>,
}

impl OperationEntry {
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    #[must_use]
    pub fn params(&self) -> &[ParamDef] {
        &self.signature.params
    }

    #[must_use]
    pub fn returns(&self) -> ValueType {
        self.signature.returns
    }

    #[must_use]
    pub fn handler(&self) -> &dyn OperationHandler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for OperationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationEntry")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// CallRegistry
// ---------------------------------------------------------------------------

/// Append-only table of operations, keyed by unique name.
///
/// Registration takes `&mut self`, so the registry is populated during
/// startup and becomes read-only once shared behind an `Arc`. There is no
/// removal operation.
#[derive(Debug, Default)]
pub struct CallRegistry {
    /// Name-based lookup: operation name -> entry.
    by_name: HashMap<String, Arc<OperationEntry>>,
    /// Registration order, used for stable listing.
    order: Vec<String>,
}

impl CallRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation under `name`.
    ///
    /// # Errors
    ///
    /// Returns `CallError::DuplicateOperation` if `name` is already present.
    /// The existing entry is left untouched.
    pub fn register<H>(
        &mut self,
        name: impl Into<String>,
        params: Vec<ParamDef>,
        returns: ValueType,
        handler: H,
    ) -> Result<(), CallError>
    where
        H: OperationHandler + 'static,
    {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            tracing::warn!(operation = %name, "rejected duplicate registration");
            return Err(CallError::DuplicateOperation { name });
        }

        let entry = OperationEntry {
            signature: Signature {
                name: name.clone(),
                params,
                returns,
            },
            handler: Arc::new(handler),
        };
        tracing::debug!(
            operation = %name,
            arity = entry.params().len(),
            returns = %returns,
            "registered operation"
        );
        self.by_name.insert(name.clone(), Arc::new(entry));
        self.order.push(name);
        Ok(())
    }

    /// Retrieve an operation by name.
    ///
    /// # Errors
    ///
    /// Returns `CallError::UnknownOperation` if no operation has that name.
    pub fn lookup(&self, name: &str) -> Result<Arc<OperationEntry>, CallError> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| CallError::UnknownOperation {
                name: name.to_string(),
            })
    }

    /// Whether an operation with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Signatures of all operations in registration order.
    #[must_use]
    pub fn operations(&self) -> Vec<Signature> {
        self.order
            .iter()
            .filter_map(|name| self.by_name.get(name))
            .map(|entry| entry.signature.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
