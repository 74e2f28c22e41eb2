//! Shared application state for all routes. The table registry is fixed at startup.

use crate::config::TableRegistry;
use crate::dao::Dao;
use crate::extractors::DEFAULT_PAGE_SIZE;
use crate::hooks::Hooks;
use std::sync::Arc;

/// Upper bound applied to the `pagesize` query parameter.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        PageLimits {
            max_page_size: DEFAULT_MAX_PAGE_SIZE.max(DEFAULT_PAGE_SIZE),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dao: Arc<dyn Dao>,
    pub registry: Arc<TableRegistry>,
    pub hooks: Hooks,
    pub limits: PageLimits,
}

impl AppState {
    pub fn new(dao: Arc<dyn Dao>, registry: Arc<TableRegistry>) -> Self {
        AppState {
            dao,
            registry,
            hooks: Hooks::default(),
            limits: PageLimits::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }
}
