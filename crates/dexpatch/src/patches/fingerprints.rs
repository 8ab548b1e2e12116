//! Fingerprints located by the built-in patches.
//!
//! Fingerprints that pin a method to a resource id take the id as an
//! argument, since it is only known once the shared ids are resolved.

use crate::bytecode::{AccessFlags, Opcode};
use crate::fingerprint::Fingerprint;

pub const SET_ACTION_BAR_RINGO: &str = "SetActionBarRingo";
pub const YOU_ACTION_BAR: &str = "YouActionBar";
pub const SET_WORD_MARK_HEADER: &str = "SetWordMarkHeader";
pub const LAYOUT_SWITCH: &str = "LayoutSwitch";

pub const VIDEO_END: &str = "VideoEnd";
pub const SEEK_BAR_CONSTRUCTOR: &str = "SeekBarConstructor";
pub const VIDEO_LENGTH: &str = "VideoLength";
pub const PLAYER_CONTROLLER_SET_TIME_REFERENCE: &str = "PlayerControllerSetTimeReference";
pub const VIDEO_ID_PARENT: &str = "VideoIdParent";
pub const BACKGROUND_PLAYBACK_VIDEO_ID_PARENT: &str = "BackgroundPlaybackVideoIdParent";
pub const BACKGROUND_PLAYBACK_VIDEO_ID: &str = "BackgroundPlaybackVideoId";

/// Loads the `action_bar_ringo` layout; its class also holds the "You" tab bar
pub fn set_action_bar_ringo(action_bar_ringo: i64) -> Fingerprint {
    Fingerprint::builder(SET_ACTION_BAR_RINGO)
        .return_type("V")
        .literal(action_bar_ringo)
        .build()
}

/// Pattern ends on the branch over the "You" tab flag
pub fn you_action_bar() -> Fingerprint {
    Fingerprint::builder(YOU_ACTION_BAR)
        .return_type("V")
        .parameters(["Landroid/view/View;"])
        .opcodes([
            Some(Opcode::InvokeVirtual),
            Some(Opcode::MoveResult),
            Some(Opcode::IfEqz),
        ])
        .parent(SET_ACTION_BAR_RINGO)
        .build()
}

/// The invoke right after the pattern start calls the tablet check
pub fn set_word_mark_header() -> Fingerprint {
    Fingerprint::builder(SET_WORD_MARK_HEADER)
        .return_type("V")
        .parameters(["Landroid/widget/ImageView;"])
        .opcodes([
            Some(Opcode::IgetObject),
            Some(Opcode::InvokeStatic),
            Some(Opcode::MoveResult),
            Some(Opcode::IfNez),
        ])
        .build()
}

pub fn layout_switch() -> Fingerprint {
    Fingerprint::builder(LAYOUT_SWITCH)
        .return_type("I")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::STATIC)
        .parameters(["Landroid/content/Context;"])
        .opcodes([
            Some(Opcode::InvokeStatic),
            Some(Opcode::MoveResult),
            Some(Opcode::IfNez),
            None,
            Some(Opcode::Return),
        ])
        .build()
}

/// Player controller's own seek; its second parameter is the seek source enum
pub fn video_end() -> Fingerprint {
    Fingerprint::builder(VIDEO_END)
        .return_type("Z")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
        .parameters(["J", "L"])
        .opcodes([
            Some(Opcode::InvokeVirtual),
            Some(Opcode::MoveResult),
            Some(Opcode::Return),
        ])
        .build()
}

pub fn seek_bar_constructor(marker_color: i64) -> Fingerprint {
    Fingerprint::builder(SEEK_BAR_CONSTRUCTOR)
        .return_type("V")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR)
        .literal(marker_color)
        .build()
}

/// The `move-result-wide` after the pattern start holds the length
pub fn video_length() -> Fingerprint {
    Fingerprint::builder(VIDEO_LENGTH)
        .return_type("V")
        .opcodes([
            Some(Opcode::InvokeVirtual),
            Some(Opcode::MoveResultWide),
            Some(Opcode::IputWide),
        ])
        .parent(SEEK_BAR_CONSTRUCTOR)
        .build()
}

/// The range invoke at the pattern start calls the time update method
pub fn player_controller_set_time_reference() -> Fingerprint {
    Fingerprint::builder(PLAYER_CONTROLLER_SET_TIME_REFERENCE)
        .opcodes([Some(Opcode::InvokeDirectRange), Some(Opcode::IgetObject)])
        .strings(["Media progress reported outside media playback: "])
        .build()
}

/// Pattern ends on a read of the field whose type owns the stage handler
pub fn video_id_parent() -> Fingerprint {
    Fingerprint::builder(VIDEO_ID_PARENT)
        .return_type("V")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
        .parameters(["[L", "Ljava/lang/Object;"])
        .opcodes([
            Some(Opcode::InvokeInterface),
            Some(Opcode::MoveResultObject),
            Some(Opcode::IgetObject),
        ])
        .build()
}

/// Reads the watch-next response; its class also hands the id to background playback
pub fn background_playback_video_id_parent() -> Fingerprint {
    Fingerprint::builder(BACKGROUND_PLAYBACK_VIDEO_ID_PARENT)
        .return_type("V")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
        .parameters(["Ljava/lang/Object;"])
        .strings(["currentWatchNextResponse"])
        .build()
}

/// Pattern ends on the `move-result-object` holding the video id
pub fn background_playback_video_id() -> Fingerprint {
    Fingerprint::builder(BACKGROUND_PLAYBACK_VIDEO_ID)
        .return_type("V")
        .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
        .opcodes([
            Some(Opcode::IgetObject),
            Some(Opcode::InvokeInterface),
            Some(Opcode::MoveResultObject),
        ])
        .parent(BACKGROUND_PLAYBACK_VIDEO_ID_PARENT)
        .build()
}
