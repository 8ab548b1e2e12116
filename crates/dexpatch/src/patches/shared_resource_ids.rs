use tracing::info;

use crate::error::Result;
use crate::patch::{Patch, PatchContext};
use crate::resource::ResourceType;

/// Resources other patches refer to by key
///
/// `(key, type, name)`; a key's id is looked up once per run.
pub const SHARED_RESOURCES: &[(&str, ResourceType, &str)] = &[
    ("AccountSwitcherAccessibility", ResourceType::String, "account_switcher_accessibility_label"),
    ("ActionBarRingo", ResourceType::Layout, "action_bar_ringo"),
    ("ActionsContainer", ResourceType::Id, "actions_container"),
    ("ButtonContainer", ResourceType::Id, "button_container"),
    ("ButtonIconPaddingMedium", ResourceType::Dimen, "button_icon_padding_medium"),
    ("ChipCloud", ResourceType::Layout, "chip_cloud"),
    ("ColorGrey", ResourceType::Color, "ytm_color_grey_12"),
    ("DialogSolid", ResourceType::Style, "Theme.YouTubeMusic.Dialog.Solid"),
    ("FloatingLayout", ResourceType::Id, "floating_layout"),
    ("HistoryMenuItem", ResourceType::Id, "history_menu_item"),
    ("InlineTimeBarAdBreakMarkerColor", ResourceType::Color, "inline_time_bar_ad_break_marker_color"),
    ("InterstitialsContainer", ResourceType::Id, "interstitials_container"),
    ("IsTablet", ResourceType::Bool, "is_tablet"),
    ("MenuEntry", ResourceType::Layout, "menu_entry"),
    ("MusicMenuLikeButtons", ResourceType::Layout, "music_menu_like_buttons"),
    ("MusicNotifierShelf", ResourceType::Layout, "music_notifier_shelf"),
    ("NamesInactiveAccountThumbnailSize", ResourceType::Dimen, "names_inactive_account_thumbnail_size"),
    ("PlayerCastMediaRouteButton", ResourceType::Layout, "player_cast_media_route_button"),
    ("PlayerOverlayChip", ResourceType::Id, "player_overlay_chip"),
    ("PrivacyTosFooter", ResourceType::Id, "privacy_tos_footer"),
    ("QualityAuto", ResourceType::String, "quality_auto"),
    ("Text1", ResourceType::Id, "text1"),
    ("ToolTipContentView", ResourceType::Layout, "tooltip_content_view"),
    ("TosFooter", ResourceType::Id, "tos_footer"),
];

/// Resolves [`SHARED_RESOURCES`] into [`PatchContext::resource_ids`]
///
/// Misses are kept as [`crate::resource::NOT_FOUND`]; whether one is fatal is
/// decided when a patch asks for it through
/// [`PatchContext::shared_resource_id`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedResourceIds;

impl SharedResourceIds {
    pub const NAME: &'static str = "shared-resource-ids";
}

impl Patch for SharedResourceIds {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn execute(&self, ctx: &mut PatchContext) -> Result<()> {
        for (key, resource_type, name) in SHARED_RESOURCES {
            ctx.resource_ids
                .resolve(&ctx.resources, *key, *resource_type, name);
        }

        let missing = ctx.resource_ids.missing().count();
        info!(
            "Resolved {} of {} shared resource ids",
            ctx.resource_ids.len() - missing,
            ctx.resource_ids.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::ClassPool;
    use crate::config::PatchConfig;
    use crate::error::Error;
    use crate::resource::NOT_FOUND;
    use crate::testing;

    #[test]
    fn test_every_key_is_stored() {
        let resources = testing::resources(&[
            (ResourceType::Bool, "is_tablet", 0x7f050004),
            (ResourceType::Id, "text1", 0x7f0b0001),
            // same name, wrong type
            (ResourceType::Layout, "quality_auto", 0x7f0e0001),
        ]);
        let mut ctx = PatchContext::new(ClassPool::new(), resources, PatchConfig::default());
        SharedResourceIds.execute(&mut ctx).unwrap();

        assert_eq!(ctx.resource_ids.len(), SHARED_RESOURCES.len());
        assert_eq!(ctx.shared_resource_id("IsTablet").unwrap(), 0x7f050004);
        assert_eq!(ctx.shared_resource_id("Text1").unwrap(), 0x7f0b0001);
        assert_eq!(ctx.resource_ids.id("QualityAuto"), Some(NOT_FOUND));
        assert!(matches!(
            ctx.shared_resource_id("QualityAuto"),
            Err(Error::ResourceNotFound { .. })
        ));
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = SHARED_RESOURCES.iter().map(|(key, _, _)| *key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), SHARED_RESOURCES.len());
    }
}
