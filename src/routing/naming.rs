//! Naming conventions shared by the router, the resolver and the views.
//!
//! # Responsibilities
//! - Turn a `controller` path value into a controller class name
//! - Turn an `action` path value into an action method name
//! - Derive the short name used for a controller's view directory
//!
//! # Design Decisions
//! - Case conversion is delegated to `heck`; dashes behave like underscores
//! - Conversions are idempotent (`testAction` stays `testAction`)

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

/// Fixed suffix of every controller class name.
pub const CONTROLLER_SUFFIX: &str = "Controller";

/// Suffix of an action method whose verbatim name is reserved.
pub const ACTION_SUFFIX: &str = "Action";

/// `unit_test` → `UnitTestController`.
pub fn controller_class(controller: &str) -> String {
    let base = controller.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(controller);
    format!("{}{}", base.to_upper_camel_case(), CONTROLLER_SUFFIX)
}

/// `test_action` → `testAction`.
pub fn action_method(action: &str) -> String {
    action.to_lower_camel_case()
}

/// Resource-style `delete` is served by `destroy`.
pub fn normalize_action(action: &str) -> &str {
    if action == "delete" {
        "destroy"
    } else {
        action
    }
}

/// `UnitTestController` → `UnitTest`.
pub fn short_name(class: &str) -> &str {
    class.strip_suffix(CONTROLLER_SUFFIX).unwrap_or(class)
}

/// `UnitTestController` → `unit_test`, the value used in URLs.
pub fn controller_path(class: &str) -> String {
    short_name(class).to_snake_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_class() {
        assert_eq!(controller_class("unit_test"), "UnitTestController");
        assert_eq!(controller_class("unit-test"), "UnitTestController");
        assert_eq!(controller_class("users"), "UsersController");
        assert_eq!(controller_class("UnitTestController"), "UnitTestController");
    }

    #[test]
    fn test_action_method() {
        assert_eq!(action_method("test_action"), "testAction");
        assert_eq!(action_method("testAction"), "testAction");
        assert_eq!(action_method("index"), "index");
    }

    #[test]
    fn test_delete_becomes_destroy() {
        assert_eq!(normalize_action("delete"), "destroy");
        assert_eq!(normalize_action("deleted"), "deleted");
    }

    #[test]
    fn test_short_name_and_path() {
        assert_eq!(short_name("UnitTestController"), "UnitTest");
        assert_eq!(short_name("Odd"), "Odd");
        assert_eq!(controller_path("UnitTestController"), "unit_test");
    }
}
