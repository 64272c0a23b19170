//! Plugin Registry - the immutable catalog of admitted tools.
//!
//! A `Registry` is built once from the loader's output and never mutated
//! afterwards. It is shared as `Arc<Registry>` by the catalog handlers and the
//! route composer; there is no write path.

use std::sync::Arc;

use super::types::Plugin;

/// Sorted, read-only collection of plugins.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    plugins: Vec<Arc<Plugin>>,
}

impl Registry {
    /// Build a registry, ordering plugins by `(category, order)`.
    ///
    /// The sort is stable, so equal keys keep the order they were given in.
    pub fn new(plugins: Vec<Plugin>) -> Self {
        let mut plugins: Vec<Arc<Plugin>> = plugins.into_iter().map(Arc::new).collect();
        plugins.sort_by(|a, b| {
            a.descriptor
                .category
                .cmp(&b.descriptor.category)
                .then(a.descriptor.order.cmp(&b.descriptor.order))
        });
        Self { plugins }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// All plugins in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Plugin>> {
        self.plugins.iter()
    }

    /// Find a plugin by slug.
    pub fn get_by_slug(&self, slug: &str) -> Option<&Arc<Plugin>> {
        self.plugins.iter().find(|p| p.descriptor.slug == slug)
    }

    /// All plugins of one category, in catalog order.
    pub fn get_by_category(&self, category: &str) -> Vec<&Arc<Plugin>> {
        self.plugins
            .iter()
            .filter(|p| p.descriptor.category == category)
            .collect()
    }

    /// Plugins that have a capability and therefore a route.
    pub fn routable(&self) -> impl Iterator<Item = &Arc<Plugin>> {
        self.plugins.iter().filter(|p| p.is_routable())
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = Vec::new();
        for plugin in &self.plugins {
            let category = plugin.descriptor.category.as_str();
            if categories.last() != Some(&category) {
                categories.push(category);
            }
        }
        categories
    }
}
