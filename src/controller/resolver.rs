//! Controller class name → controller instance.
//!
//! # Responsibilities
//! - Know every controller compiled into the application
//! - Create a fresh instance per request
//!
//! # Design Decisions
//! - Controllers are registered up front; nothing is loaded lazily
//! - A missing controller reports the module where it was expected
//! - Registering the same controller twice is harmless

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::controller::{AnyController, Controller, ControllerError, Instance};
use crate::routing::naming::controller_path;

type Factory = fn() -> Result<Box<dyn AnyController>, ControllerError>;

/// Errors raised while resolving a controller.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("controller {class} not found (expected in {path})")]
    NotFound { class: String, path: String },

    #[error("failed to define {class}: {source}")]
    Definition {
        class: String,
        #[source]
        source: ControllerError,
    },
}

/// Every controller the dispatcher can route to.
#[derive(Clone, Default)]
pub struct ControllerRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `C` reachable under `C::NAME`.
    pub fn register<C: Controller>(&mut self) -> &mut Self {
        self.factories.insert(C::NAME, instantiate::<C>);
        self
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    /// Registered class names, sorted.
    pub fn class_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// A fresh instance of `class`.
    pub fn resolve(&self, class: &str) -> Result<Box<dyn AnyController>, ResolveError> {
        let factory = self
            .factories
            .get(class)
            .ok_or_else(|| ResolveError::NotFound {
                class: class.to_string(),
                path: expected_path(class),
            })?;
        factory().map_err(|source| ResolveError::Definition {
            class: class.to_string(),
            source,
        })
    }

    /// Run every registered controller's `define`, reporting each failure.
    pub fn check(&self) -> Vec<ResolveError> {
        self.class_names()
            .into_iter()
            .filter_map(|class| self.resolve(class).err())
            .collect()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controllers", &self.class_names())
            .finish()
    }
}

/// `UnitTestController` → `app/controllers/unit_test.rs`.
pub fn expected_path(class: &str) -> String {
    format!("app/controllers/{}.rs", controller_path(class))
}

fn instantiate<C: Controller>() -> Result<Box<dyn AnyController>, ControllerError> {
    Ok(Box::new(Instance::<C>::new()?))
}
