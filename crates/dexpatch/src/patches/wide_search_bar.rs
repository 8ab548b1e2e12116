use tracing::debug;

use super::SharedResourceIds;
use super::fingerprints::{self, LAYOUT_SWITCH, SET_WORD_MARK_HEADER, YOU_ACTION_BAR};
use crate::bytecode::Method;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::patch::{Patch, PatchContext};
use crate::smali::Template;

/// Replaces the search bar's tablet checks with the integrations toggle
#[derive(Debug, Clone, Copy, Default)]
pub struct WideSearchBar;

impl WideSearchBar {
    pub const NAME: &'static str = "wide-search-bar";
}

impl Patch for WideSearchBar {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dependencies(&self) -> &[&str] {
        &[SharedResourceIds::NAME]
    }

    fn fingerprints(&self, ctx: &PatchContext) -> Result<Vec<Fingerprint>> {
        Ok(vec![
            fingerprints::layout_switch(),
            fingerprints::set_action_bar_ringo(ctx.shared_resource_id("ActionBarRingo")?),
            fingerprints::set_word_mark_header(),
            fingerprints::you_action_bar(),
        ])
    }

    fn execute(&self, ctx: &mut PatchContext) -> Result<()> {
        let general = ctx.config.general_class.clone();

        let header = ctx.resolution(SET_WORD_MARK_HEADER)?;
        let tablet_check = ctx
            .walker(header.method)
            .next_method(header.pattern()?.start_index + 1)?
            .method_id();
        let layout_switch = ctx.resolution(LAYOUT_SWITCH)?.method;

        for id in [tablet_check, layout_switch] {
            inject_search_bar_hook(ctx.method_mut(id), &general)?;
        }

        let you_tab = ctx.resolution(YOU_ACTION_BAR)?;
        let end = you_tab.pattern()?.end_index;
        let method = ctx.method_mut(you_tab.method);
        let register = method.register_at(end)?;
        let smali = Template::new(
            "invoke-static {${flag}}, ${general}->enableWideSearchBarInYouTab(Z)Z
             move-result ${flag}",
        )
        .bind_register("flag", register)
        .bind("general", &general)
        .render()?;
        method.add_instructions(end, &smali)?;

        ctx.settings.add_preference([
            "PREFERENCE: GENERAL_SETTINGS",
            "SETTINGS: ENABLE_WIDE_SEARCH_BAR",
        ]);
        ctx.settings.update_patch_status("Enable wide search bar");
        Ok(())
    }
}

/// Overwrite `p0` with the toggle right before the final instruction
fn inject_search_bar_hook(method: &mut Method, general: &str) -> Result<()> {
    let index = method
        .instruction_count()
        .checked_sub(1)
        .ok_or_else(|| Error::InvalidMethod(format!("{} has no body", method.descriptor())))?;
    debug!("Hooking search bar check in {}", method.descriptor());

    let smali = Template::new(
        "invoke-static {}, ${general}->enableWideSearchBar()Z
         move-result p0",
    )
    .bind("general", general)
    .render()?;
    method.add_instructions(index, &smali)
}
