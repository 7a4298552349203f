//! Default plugin set
//!
//! Builds the registry a post or snippet editor runs with. Custom embeds are
//! ordinary bindings; [`registry_with`] places them after the built-in ones
//! and before the HTML deserializer, which must come last so it can read the
//! rules of every other binding.

use crate::registry::{PluginBinding, Registry};

// Submodules
mod elements;
mod embeds;
mod marks;

pub use embeds::tweet_url;

/// The built-in registry
pub fn default_registry() -> Registry {
    registry_with(Vec::new())
}

/// The built-in registry extended with caller bindings
///
/// # Parameters
/// * `extra` - Bindings appended after the built-ins, in the given order
pub fn registry_with(extra: Vec<PluginBinding>) -> Registry {
    let mut registry = Registry::new(elements::bindings());
    for binding in marks::bindings()
        .into_iter()
        .chain(embeds::bindings())
        .chain(extra)
    {
        registry.push(binding);
    }
    registry.push_derived(PluginBinding::deserializer);
    registry
}
