//! Resource name to id mapping.
//!
//! Injected code often needs a numeric resource id where the source only
//! knows a `(type, name)` pair. The table is built once from the host's
//! parsed resources and is read-only afterwards.

mod mapping;
mod table;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

pub use mapping::{NOT_FOUND, ResourceIds, ResourceMapping, SharedResource};
pub use table::{
    ResourceEntry, ResourceTable, load_public_xml, load_resource_table, save_resource_table,
};

/// Android resource types, named as they appear in `public.xml`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Anim,
    Animator,
    Array,
    Attr,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}
