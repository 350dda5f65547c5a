//! Controller definitions: actions, helper methods, filters and layout.
//!
//! # Responsibilities
//! - Collect what `Controller::define` registers for one controller
//! - Validate filter registrations against the known methods
//! - Resolve a requested action to something callable
//!
//! # Design Decisions
//! - Methods are plain function pointers keyed by lower-camel name
//! - Only registered actions are reachable from a URL; helper methods are
//!   filter targets only
//! - Filter and option errors surface from `define`, before any request runs

use std::fmt;

use indexmap::IndexMap;

use crate::controller::filters::{FilterChain, FilterOptions};
use crate::controller::{ActionFn, ActionResult, Context, ControllerError, MissingFn};
use crate::routing::naming::{action_method, short_name, ACTION_SUFFIX};
use crate::view::Layout;

/// Everything a controller registers about itself.
pub struct Definition<C> {
    class: &'static str,
    actions: IndexMap<String, ActionFn<C>>,
    methods: IndexMap<String, ActionFn<C>>,
    method_missing: Option<MissingFn<C>>,
    before: FilterChain<C>,
    after: FilterChain<C>,
    layout: Layout,
}

impl<C> Definition<C> {
    pub fn new(class: &'static str) -> Self {
        Self {
            class,
            actions: IndexMap::new(),
            methods: IndexMap::new(),
            method_missing: None,
            before: FilterChain::default(),
            after: FilterChain::default(),
            layout: Layout::Default,
        }
    }

    pub fn class_name(&self) -> &'static str {
        self.class
    }

    /// `UsersController` → `Users`.
    pub fn short_name(&self) -> &'static str {
        short_name(self.class)
    }

    /// Register an action reachable as `/controller/<name>`.
    ///
    /// When the natural name is reserved, register `<name>Action`; requests
    /// for `<name>` fall back to it.
    pub fn action(&mut self, name: &str, action: ActionFn<C>) -> &mut Self {
        self.actions.insert(action_method(name), action);
        self
    }

    /// Register a helper method usable as a filter but not as an action.
    pub fn method(&mut self, name: &str, method: ActionFn<C>) -> &mut Self {
        self.methods.insert(action_method(name), method);
        self
    }

    /// Handle any action name that has no method of its own.
    pub fn method_missing(&mut self, handler: MissingFn<C>) -> &mut Self {
        self.method_missing = Some(handler);
        self
    }

    pub fn before_filter(
        &mut self,
        name: &str,
        options: FilterOptions,
    ) -> Result<&mut Self, ControllerError> {
        let (key, method) = self.filter_method(name)?;
        let scope = options.scope(self.class, &key)?;
        self.before.add(&key, method, scope);
        Ok(self)
    }

    pub fn after_filter(
        &mut self,
        name: &str,
        options: FilterOptions,
    ) -> Result<&mut Self, ControllerError> {
        let (key, method) = self.filter_method(name)?;
        let scope = options.scope(self.class, &key)?;
        self.after.add(&key, method, scope);
        Ok(self)
    }

    /// Remove the before filter `name`, or narrow it with `only`/`except`.
    pub fn skip_before_filter(
        &mut self,
        name: &str,
        options: FilterOptions,
    ) -> Result<&mut Self, ControllerError> {
        let (key, _) = self.filter_method(name)?;
        let scope = options.scope(self.class, &key)?;
        self.before.skip(&key, &scope);
        Ok(self)
    }

    pub fn skip_after_filter(
        &mut self,
        name: &str,
        options: FilterOptions,
    ) -> Result<&mut Self, ControllerError> {
        let (key, _) = self.filter_method(name)?;
        let scope = options.scope(self.class, &key)?;
        self.after.skip(&key, &scope);
        Ok(self)
    }

    /// Wrap rendered templates in `layouts/<name>.html`.
    pub fn layout(&mut self, name: impl Into<String>) -> &mut Self {
        self.layout = Layout::Named(name.into());
        self
    }

    pub fn no_layout(&mut self) -> &mut Self {
        self.layout = Layout::None;
        self
    }

    pub fn current_layout(&self) -> &Layout {
        &self.layout
    }

    pub fn before_filters(&self) -> &FilterChain<C> {
        &self.before
    }

    pub fn after_filters(&self) -> &FilterChain<C> {
        &self.after
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Find the method serving `action`.
    ///
    /// Tries `action` itself, then `<action>Action`, then the catch-all.
    /// Names with a leading underscore are never actions.
    pub fn resolve_action(&self, action: &str) -> Result<ResolvedAction<C>, ControllerError> {
        let missing = || ControllerError::MissingAction {
            controller: self.class.to_string(),
            action: action.to_string(),
        };
        if action.is_empty() || action.starts_with('_') {
            return Err(missing());
        }

        if let Some(method) = self.actions.get(action) {
            return Ok(ResolvedAction {
                target: Target::Action(*method),
                name: action.to_string(),
                template: action.to_string(),
                conflict: false,
            });
        }

        let suffixed = format!("{}{}", action, ACTION_SUFFIX);
        if let Some(method) = self.actions.get(&suffixed) {
            return Ok(ResolvedAction {
                target: Target::Action(*method),
                name: suffixed,
                template: action.to_string(),
                conflict: true,
            });
        }

        match self.method_missing {
            Some(handler) => Ok(ResolvedAction {
                target: Target::Missing(handler),
                name: action.to_string(),
                template: action.to_string(),
                conflict: false,
            }),
            None => Err(missing()),
        }
    }

    fn filter_method(&self, name: &str) -> Result<(String, ActionFn<C>), ControllerError> {
        let key = action_method(name);
        self.actions
            .get(&key)
            .or_else(|| self.methods.get(&key))
            .map(|method| (key.clone(), *method))
            .ok_or_else(|| ControllerError::UnknownFilterMethod {
                controller: self.class.to_string(),
                method: name.to_string(),
            })
    }
}

impl<C> fmt::Debug for Definition<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("class", &self.class)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("method_missing", &self.method_missing.is_some())
            .field("before", &self.before)
            .field("after", &self.after)
            .field("layout", &self.layout)
            .finish()
    }
}

enum Target<C> {
    Action(ActionFn<C>),
    Missing(MissingFn<C>),
}

/// An action resolved for one request.
pub struct ResolvedAction<C> {
    target: Target<C>,
    name: String,
    template: String,
    conflict: bool,
}

impl<C> ResolvedAction<C> {
    /// Method name actually invoked, e.g. `typeAction`.
    pub fn method_name(&self) -> &str {
        &self.name
    }

    /// Template rendered by default, without any `Action` suffix.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the suffixed fallback was used.
    pub fn is_conflict(&self) -> bool {
        self.conflict
    }

    pub fn is_method_missing(&self) -> bool {
        matches!(self.target, Target::Missing(_))
    }

    pub(crate) fn invoke(&self, controller: &mut C, ctx: &mut Context) -> ActionResult {
        match self.target {
            Target::Action(action) => action(controller, ctx),
            Target::Missing(handler) => handler(controller, ctx, &self.name),
        }
    }
}

impl<C> fmt::Debug for ResolvedAction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAction")
            .field("method", &self.name)
            .field("template", &self.template)
            .field("conflict", &self.conflict)
            .field("method_missing", &self.is_method_missing())
            .finish()
    }
}
