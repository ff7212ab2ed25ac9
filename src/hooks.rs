//! Filter and action hook registries.
//!
//! Two registries keyed by string name. Filters thread a value through every
//! registered callback in insertion order; actions fire for side effects and
//! a panicking callback never prevents the remaining ones from running.
//!
//! In debug builds, each filter is run twice on its first invocation and a
//! warning is logged if the two results diverge (filters are expected to be
//! pure functions of their inputs).

use crate::log;
use parking_lot::RwLock;
use serde_json::Value;
use std::{
    collections::HashMap,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc, LazyLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// Filter callback: `(value, ctx) -> value`.
pub type FilterFn = dyn Fn(Value, &[Value]) -> Value + Send + Sync;

/// Action callback: `(args) -> ()`.
pub type ActionFn = dyn Fn(&[Value]) + Send + Sync;

// ============================================================================
// Hook Names
// ============================================================================

/// Filter and action names consumed by the core.
pub mod names {
    pub const API_POSTS: &str = "api_posts";
    pub const API_POST: &str = "api_post";
    pub const API_CREATE_POST: &str = "api_create_post";
    pub const API_UPDATE_POST: &str = "api_update_post";
    pub const API_PAGES: &str = "api_pages";
    pub const API_PAGE: &str = "api_page";
    pub const API_CREATE_PAGE: &str = "api_create_page";
    pub const API_UPDATE_PAGE: &str = "api_update_page";
    pub const API_SETTINGS: &str = "api_settings";
    pub const API_UPDATE_SETTINGS: &str = "api_update_settings";
    pub const TEMPLATE_DATA: &str = "template_data";

    pub const POST_CREATED: &str = "post_created";
    pub const POST_UPDATED: &str = "post_updated";
    pub const PRE_POST_DELETE: &str = "pre_post_delete";
    pub const POST_DELETED: &str = "post_deleted";
    pub const PAGE_CREATED: &str = "page_created";
    pub const PAGE_UPDATED: &str = "page_updated";
    pub const PRE_PAGE_DELETE: &str = "pre_page_delete";
    pub const PAGE_DELETED: &str = "page_deleted";
    pub const PRE_BULK_OPERATION: &str = "pre_bulk_operation";
    pub const POST_BULK_OPERATION: &str = "post_bulk_operation";
    pub const SETTINGS_UPDATED: &str = "settings_updated";

    /// Per-item action name for a bulk operation, e.g. `bulk_publish_item`.
    pub fn bulk_item(action: &str) -> String {
        format!("bulk_{action}_item")
    }
}

// ============================================================================
// Registry
// ============================================================================

struct FilterEntry {
    callback: Arc<FilterFn>,
    /// Set after the one-time purity check in debug builds.
    checked: AtomicBool,
}

/// Global hook registry.
#[derive(Default)]
pub struct HookRegistry {
    filters: RwLock<HashMap<String, Vec<FilterEntry>>>,
    actions: RwLock<HashMap<String, Vec<Arc<ActionFn>>>>,
}

static HOOKS: LazyLock<HookRegistry> = LazyLock::new(HookRegistry::default);

/// Access the process-wide hook registry.
pub fn registry() -> &'static HookRegistry {
    &HOOKS
}

impl HookRegistry {
    /// Register a filter under `name`. Filters run in registration order.
    pub fn add_filter<F>(&self, name: &str, callback: F)
    where
        F: Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.filters
            .write()
            .entry(name.to_string())
            .or_default()
            .push(FilterEntry {
                callback: Arc::new(callback),
                checked: AtomicBool::new(false),
            });
    }

    /// Register an action under `name`. Actions run in registration order.
    pub fn add_action<F>(&self, name: &str, callback: F)
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.actions
            .write()
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Thread `value` through every filter registered under `name`.
    pub fn apply_filters(&self, name: &str, value: Value, ctx: &[Value]) -> Value {
        let filters = self.filters.read();
        let Some(entries) = filters.get(name) else {
            return value;
        };

        let mut value = value;
        for entry in entries {
            if cfg!(debug_assertions) && !entry.checked.swap(true, Ordering::Relaxed) {
                let first = (entry.callback)(value.clone(), ctx);
                let second = (entry.callback)(value.clone(), ctx);
                if first != second {
                    log!("warn"; "filter `{name}` is not pure: repeated runs diverge");
                }
                value = first;
            } else {
                value = (entry.callback)(value, ctx);
            }
        }
        value
    }

    /// Run every action registered under `name`.
    ///
    /// A panic in one callback is logged and the remaining callbacks still run.
    pub fn do_action(&self, name: &str, args: &[Value]) {
        let actions = self.actions.read();
        let Some(callbacks) = actions.get(name) else {
            return;
        };

        for callback in callbacks {
            let result = catch_unwind(AssertUnwindSafe(|| callback(args)));
            if result.is_err() {
                log!("error"; "action `{name}` callback panicked, continuing");
            }
        }
    }

    /// Drop all registered hooks. Test isolation only.
    #[cfg(test)]
    pub fn clear(&self) {
        self.filters.write().clear();
        self.actions.write().clear();
    }
}

// ============================================================================
// Convenience Wrappers
// ============================================================================

/// Apply the named filter chain on the global registry.
pub fn apply_filters(name: &str, value: Value, ctx: &[Value]) -> Value {
    registry().apply_filters(name, value, ctx)
}

/// Fire the named actions on the global registry.
pub fn do_action(name: &str, args: &[Value]) {
    registry().do_action(name, args)
}

// ============================================================================
// Tests
// ============================================================================
