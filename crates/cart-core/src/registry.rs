//! # Function Registry
//!
//! Named hooks the host plugs into the cart without subclassing it.
//!
//! ```text
//! registry.register("sync_items", |target| ItemSync::Keep)
//!        │
//!        ▼
//! registry.invoke("sync_items", &target)
//!        ├── registered   → Ok(hook(&target))
//!        └── unregistered → Err(UnregisteredFunction { name })
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::error::{CoreError, CoreResult};

type Function<A, R> = Box<dyn Fn(&A) -> R + Send + Sync>;

/// Name → callable map. All functions share one argument and return type.
pub struct FunctionRegistry<A: ?Sized, R> {
    functions: HashMap<String, Function<A, R>>,
}

impl<A: ?Sized, R> Default for FunctionRegistry<A, R> {
    fn default() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }
}

impl<A: ?Sized, R> FunctionRegistry<A, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Box::new(function));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Calls the function registered under `name`.
    pub fn invoke(&self, name: &str, args: &A) -> CoreResult<R> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| CoreError::UnregisteredFunction {
                name: name.to_string(),
            })?;

        Ok(function(args))
    }
}

impl<A: ?Sized, R> fmt::Debug for FunctionRegistry<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry").field("functions", &names).finish()
    }
}
