//! Before/after filter chains.
//!
//! # Responsibilities
//! - Hold filters in registration order with their `only`/`except` scope
//! - Decide which filters apply to a `Controller::action` pair
//! - Apply skip registrations by removing or narrowing entries
//!
//! # Design Decisions
//! - Scope entries are normalized to `<ControllerClass>::<actionMethod>` once,
//!   at registration, so matching is a set lookup
//! - Re-registering a name replaces its scope without moving it in the chain
//! - A scope that narrows to nothing removes the entry

use std::collections::BTreeSet;
use std::fmt;

use serde_json::Value;

use crate::controller::options;
use crate::controller::{ActionFn, ControllerError};
use crate::routing::naming::{action_method, controller_class};

const FILTER_KEYS: [&str; 2] = ["only", "except"];

/// Scope given when registering or skipping a filter.
///
/// Entries are action names (`login`), or `controller::action` pairs
/// (`users::login`, `UsersController::login`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub only: Option<Vec<String>>,
    pub except: Option<Vec<String>>,
}

impl FilterOptions {
    /// No scope: applies to every action.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(actions.into_iter().map(Into::into).collect()),
            except: None,
        }
    }

    pub fn except<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: None,
            except: Some(actions.into_iter().map(Into::into).collect()),
        }
    }

    /// Read `{"only": ..., "except": ...}`; any other key is rejected.
    pub fn parse(value: &Value) -> Result<Self, ControllerError> {
        let map = options::valid_keys(value, &FILTER_KEYS)?;
        Ok(Self {
            only: map
                .get("only")
                .map(|v| options::string_list("only", v))
                .transpose()?,
            except: map
                .get("except")
                .map(|v| options::string_list("except", v))
                .transpose()?,
        })
    }

    /// Normalized scope for `filter` on controller `class`.
    pub(crate) fn scope(&self, class: &str, filter: &str) -> Result<Scope, ControllerError> {
        match (&self.only, &self.except) {
            (Some(_), Some(_)) => Err(ControllerError::ConflictingFilterScope {
                filter: filter.to_string(),
            }),
            (Some(only), None) => Ok(Scope::Only(normalize_pairs(class, only))),
            (None, Some(except)) => Ok(Scope::Except(normalize_pairs(class, except))),
            (None, None) => Ok(Scope::All),
        }
    }
}

/// `login` → `UsersController::login`, `users::log_in` → `UsersController::logIn`.
pub fn normalize_pair(class: &str, entry: &str) -> String {
    match entry.split_once("::") {
        Some((controller, action)) => {
            format!("{}::{}", controller_class(controller), action_method(action))
        }
        None => format!("{}::{}", class, action_method(entry)),
    }
}

fn normalize_pairs(class: &str, entries: &[String]) -> BTreeSet<String> {
    entries
        .iter()
        .map(|entry| normalize_pair(class, entry))
        .collect()
}

/// Where a filter applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Only(BTreeSet<String>),
    Except(BTreeSet<String>),
}

impl Scope {
    pub fn applies(&self, pair: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Only(pairs) => pairs.contains(pair),
            Scope::Except(pairs) => !pairs.contains(pair),
        }
    }

    /// Stop applying to `pairs`. `None` when nothing is left.
    fn without(self, pairs: &BTreeSet<String>) -> Option<Scope> {
        match self {
            Scope::All => Some(Scope::Except(pairs.clone())),
            Scope::Except(mut except) => {
                except.extend(pairs.iter().cloned());
                Some(Scope::Except(except))
            }
            Scope::Only(only) => non_empty(only.difference(pairs).cloned().collect()),
        }
    }

    /// Apply only to `pairs` (and only where it applied before).
    fn restricted_to(self, pairs: &BTreeSet<String>) -> Option<Scope> {
        match self {
            Scope::All => non_empty(pairs.clone()),
            Scope::Only(only) => non_empty(only.intersection(pairs).cloned().collect()),
            Scope::Except(except) => non_empty(pairs.difference(&except).cloned().collect()),
        }
    }
}

fn non_empty(pairs: BTreeSet<String>) -> Option<Scope> {
    if pairs.is_empty() {
        None
    } else {
        Some(Scope::Only(pairs))
    }
}

/// One registered filter.
pub struct FilterEntry<C> {
    name: String,
    method: ActionFn<C>,
    scope: Scope,
}

impl<C> FilterEntry<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn method(&self) -> ActionFn<C> {
        self.method
    }
}

impl<C> fmt::Debug for FilterEntry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEntry")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Filters of one kind (before or after), in execution order.
pub struct FilterChain<C> {
    entries: Vec<FilterEntry<C>>,
}

impl<C> Default for FilterChain<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C> fmt::Debug for FilterChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

impl<C> FilterChain<C> {
    /// Register `name`, or replace its scope if already present.
    pub fn add(&mut self, name: &str, method: ActionFn<C>, scope: Scope) {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.method = method;
                entry.scope = scope;
            }
            None => self.entries.push(FilterEntry {
                name: name.to_string(),
                method,
                scope,
            }),
        }
    }

    /// Remove or narrow `name` according to a skip registration.
    ///
    /// Skipping a filter that is not in the chain changes nothing.
    pub fn skip(&mut self, name: &str, skip: &Scope) {
        let Some(index) = self.entries.iter().position(|entry| entry.name == name) else {
            tracing::debug!(filter = %name, "Skipped filter is not registered");
            return;
        };

        let current = self.entries[index].scope.clone();
        let narrowed = match skip {
            Scope::All => None,
            Scope::Only(pairs) => current.without(pairs),
            Scope::Except(pairs) => current.restricted_to(pairs),
        };

        match narrowed {
            Some(scope) => self.entries[index].scope = scope,
            None => {
                self.entries.remove(index);
            }
        }
    }

    /// Filters that run for `pair`, in registration order.
    pub fn applicable<'a>(&'a self, pair: &'a str) -> impl Iterator<Item = &'a FilterEntry<C>> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.scope.applies(pair))
    }

    pub fn get(&self, name: &str) -> Option<&FilterEntry<C>> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
