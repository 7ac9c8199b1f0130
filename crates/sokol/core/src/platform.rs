//! Boundary to the host that embeds the engine.

use crate::blueprint::Blueprint;
use crate::component::Component;
use crate::registry::Registry;
use crate::text::{Locale, Text};
use crate::tree::{TreeError, TreeNode};

/// Capabilities the host provides: content registries and localisation.
pub trait SokolPlatform: Send + Sync {
    fn components(&self) -> &Registry<Component>;

    fn blueprints(&self) -> &Registry<Blueprint>;

    fn default_locale(&self) -> &Locale;

    /// Localised text for `key`, or `None` if the locale has no entry.
    fn localize(&self, locale: &Locale, key: &str, args: &[(&str, String)]) -> Option<String>;

    fn render(&self, text: &Text, locale: &Locale) -> String {
        text.render(self, locale)
    }

    /// Builds the blueprint registered under `id` into a fresh tree.
    fn build_blueprint(&self, id: &str) -> Result<TreeNode, TreeError> {
        let blueprint = self
            .blueprints()
            .get(id)
            .ok_or_else(|| TreeError::UnknownBlueprint(id.to_owned()))?;
        blueprint.build(self.components())
    }
}
