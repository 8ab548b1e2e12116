//! Feeds the integrations' video information class from the player.
//!
//! The patch installs its own calls and leaves four hook points behind for
//! patches that depend on it:
//!
//! - the player controller constructor, right after the super constructor,
//!   handed the controller ([`VideoInformation::on_create_hook`])
//! - entry of the controller's time update, handed the time as a `long`
//!   ([`VideoInformation::video_time_hook`])
//! - the video stage handler, right after it reads the video id
//!   ([`VideoInformation::inject_call`])
//! - the background playback id read ([`VideoInformation::inject_background_playback_call`])
//!
//! It also synthesizes `seekTo(J)Z` on the controller and reports the video
//! length once the seek bar reads it.

use tracing::debug;

use super::SharedResourceIds;
use super::fingerprints::{
    self, BACKGROUND_PLAYBACK_VIDEO_ID, PLAYER_CONTROLLER_SET_TIME_REFERENCE, VIDEO_END,
    VIDEO_ID_PARENT, VIDEO_LENGTH,
};
use crate::bytecode::{AccessFlags, Opcode};
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::injector::MethodBuilder;
use crate::patch::{HookPoint, Patch, PatchContext};
use crate::smali::Template;

const STAGE_HANDLER: &str = "handleVideoStageEvent";

#[derive(Debug, Clone, Copy, Default)]
pub struct VideoInformation;

impl VideoInformation {
    pub const NAME: &'static str = "video-information";

    pub const PLAYER_INIT_HOOK: &'static str = "video-information/player-init";
    pub const VIDEO_TIME_HOOK: &'static str = "video-information/video-time";
    pub const VIDEO_ID_HOOK: &'static str = "video-information/video-id";
    pub const BACKGROUND_VIDEO_ID_HOOK: &'static str = "video-information/background-video-id";

    /// Call `class->method(Ljava/lang/Object;)V` with each new player controller
    ///
    /// Runs before the video id, time and length are known.
    pub fn on_create_hook(ctx: &mut PatchContext, class: &str, method: &str) -> Result<()> {
        let descriptor = format!("{}->{}(Ljava/lang/Object;)V", class, method);
        ctx.inject_call(Self::PLAYER_INIT_HOOK, &descriptor)?;
        Ok(())
    }

    /// Call `class->method(J)V` with the playback time, about once a second
    pub fn video_time_hook(ctx: &mut PatchContext, class: &str, method: &str) -> Result<()> {
        let descriptor = format!("{}->{}(J)V", class, method);
        ctx.inject_call(Self::VIDEO_TIME_HOOK, &descriptor)?;
        Ok(())
    }

    /// Call `descriptor` with the id of every new video
    ///
    /// It must take a single `Ljava/lang/String;`.
    pub fn inject_call(ctx: &mut PatchContext, descriptor: &str) -> Result<()> {
        ctx.inject_call(Self::VIDEO_ID_HOOK, descriptor)?;
        Ok(())
    }

    /// Call `descriptor` with the video id handed to background playback
    pub fn inject_background_playback_call(ctx: &mut PatchContext, descriptor: &str) -> Result<()> {
        ctx.inject_call(Self::BACKGROUND_VIDEO_ID_HOOK, descriptor)?;
        Ok(())
    }
}

impl Patch for VideoInformation {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dependencies(&self) -> &[&str] {
        &[SharedResourceIds::NAME]
    }

    fn fingerprints(&self, ctx: &PatchContext) -> Result<Vec<Fingerprint>> {
        let marker_color = ctx.shared_resource_id("InlineTimeBarAdBreakMarkerColor")?;
        Ok(vec![
            fingerprints::video_end(),
            fingerprints::seek_bar_constructor(marker_color),
            fingerprints::video_length(),
            fingerprints::player_controller_set_time_reference(),
            fingerprints::background_playback_video_id_parent(),
            fingerprints::background_playback_video_id(),
            fingerprints::video_id_parent(),
        ])
    }

    fn execute(&self, ctx: &mut PatchContext) -> Result<()> {
        let video = ctx.config.video_class.clone();

        hook_player_controller(ctx)?;
        Self::on_create_hook(ctx, &video, "initialize")?;
        add_seek_helper(ctx)?;

        hook_video_length(ctx, &video)?;

        hook_video_time(ctx)?;
        Self::video_time_hook(ctx, &video, "setVideoTime")?;

        hook_background_playback(ctx)?;

        hook_video_id(ctx)?;
        Self::inject_call(ctx, &format!("{}->setVideoId(Ljava/lang/String;)V", video))?;
        Ok(())
    }
}

/// Register the point right after the controller's super constructor call
fn hook_player_controller(ctx: &mut PatchContext) -> Result<()> {
    let class = ctx.resolution(VIDEO_END)?.class;
    let controller = ctx.pool.class(class).descriptor.clone();
    let constructor = ctx
        .pool
        .class(class)
        .constructor_index()
        .and_then(|index| ctx.pool.method_id(class, index))
        .ok_or_else(|| Error::MethodNotFound(format!("{}-><init>", controller)))?;

    let method = ctx.method(constructor);
    let this = method.parameter_register(0).ok_or_else(|| {
        Error::InvalidMethod(format!("{} has no receiver register", method.descriptor()))
    })?;
    // `super(new Foo())` initializes the temporary first; only the call on
    // `this` finishes construction
    let super_call = method
        .find_index(|i| {
            matches!(i.opcode, Opcode::InvokeDirect | Opcode::InvokeDirectRange)
                && i.method_ref().is_some_and(|r| r.name == "<init>")
                && i.register_a() == Some(this)
        })
        .ok_or_else(|| {
            Error::InvalidMethod(format!("{} never calls a super constructor", method.descriptor()))
        })?;

    let point = HookPoint::after(constructor, method, super_call, [this])?;
    ctx.hooks.register(VideoInformation::PLAYER_INIT_HOOK, point);
    debug!("Hooked player controller {}", controller);
    Ok(())
}

/// Give the controller a `seekTo(J)Z` that seeks with the default source
fn add_seek_helper(ctx: &mut PatchContext) -> Result<()> {
    let video_end = ctx.resolution(VIDEO_END)?;
    let controller = ctx.pool.class(video_end.class).descriptor.clone();

    let seek = ctx.method(video_end.method);
    let seek_name = seek.name.clone();
    let seek_source = seek
        .parameters
        .get(1)
        .cloned()
        .ok_or_else(|| Error::InvalidMethod(format!("{} takes no seek source", seek.descriptor())))?;

    let body = Template::new(
        "sget-object v0, ${source}->a:${source}
         invoke-virtual {p0, p1, p2, v0}, ${controller}->${seek}(J${source})Z
         move-result p1
         return p1",
    )
    .bind("source", &seek_source)
    .bind("controller", &controller)
    .bind("seek", &seek_name)
    .render()?;
    let helper = MethodBuilder::new("seekTo", "Z")
        .parameters(["J"])
        .access_flags(AccessFlags::PUBLIC | AccessFlags::FINAL)
        .registers(4)
        .body(body)
        .build(&controller)?;
    ctx.pool.add_method(video_end.class, helper)?;
    Ok(())
}

fn hook_video_length(ctx: &mut PatchContext, video: &str) -> Result<()> {
    let length = ctx.resolution(VIDEO_LENGTH)?;
    let start = length.pattern()?.start_index;

    let method = ctx.method_mut(length.method);
    let register = method.register_at(start + 1)?;
    let smali = Template::new("invoke-static {${low}, ${high}}, ${video}->setVideoLength(J)V")
        .bind_register("low", register)
        .bind_register("high", register + 1)
        .bind("video", video)
        .render()?;
    method.add_instructions(start + 2, &smali)
}

/// Register the entry of the time update the progress report calls
fn hook_video_time(ctx: &mut PatchContext) -> Result<()> {
    let reference = ctx.resolution(PLAYER_CONTROLLER_SET_TIME_REFERENCE)?;
    let time = ctx
        .walker(reference.method)
        .next_method(reference.pattern()?.start_index)?
        .method_id();

    let method = ctx.method(time);
    let first = if method.is_static() { 0 } else { 1 };
    let register = match (method.parameters.first(), method.parameter_register(first)) {
        (Some(time), Some(register)) if time == "J" => register,
        _ => {
            return Err(Error::InvalidMethod(format!(
                "{} does not take the time as its first parameter",
                method.descriptor()
            )));
        }
    };

    ctx.hooks.register(
        VideoInformation::VIDEO_TIME_HOOK,
        HookPoint::at_entry(time, [register, register + 1]),
    );
    Ok(())
}

/// Register the point after background playback reads the video id
fn hook_background_playback(ctx: &mut PatchContext) -> Result<()> {
    let resolution = ctx.resolution(BACKGROUND_PLAYBACK_VIDEO_ID)?;
    let end = resolution.pattern()?.end_index;

    let method = ctx.method(resolution.method);
    let register = method.register_at(end)?;
    let point = HookPoint::after(resolution.method, method, end, [register])?;
    ctx.hooks.register(VideoInformation::BACKGROUND_VIDEO_ID_HOOK, point);
    Ok(())
}

/// Register the point after the stage handler reads the video id
fn hook_video_id(ctx: &mut PatchContext) -> Result<()> {
    let parent = ctx.resolution(VIDEO_ID_PARENT)?;
    let end = parent.pattern()?.end_index;

    let parent_method = ctx.method(parent.method);
    let instruction = parent_method.instruction(end)?;
    let stage_class = instruction
        .field_ref()
        .map(|field| field.field_type.clone())
        .ok_or_else(|| Error::UnexpectedInstruction {
            method: parent_method.descriptor(),
            index: end,
            expected: "a field reference".to_string(),
            found: instruction.to_string(),
        })?;

    let class = ctx.find_class(&stage_class)?;
    let handler = ctx
        .pool
        .find_method_by_name(class, STAGE_HANDLER)
        .ok_or_else(|| Error::MethodNotFound(format!("{}->{}", stage_class, STAGE_HANDLER)))?;

    let method = ctx.method(handler);
    let call = method
        .rfind_index(|i| {
            i.opcode == Opcode::InvokeInterface
                && i.method_ref().is_some_and(|r| r.return_type == "Ljava/lang/String;")
        })
        .ok_or_else(|| {
            Error::InvalidMethod(format!("{} never reads a string id", method.descriptor()))
        })?;

    let result = method.instruction(call + 1)?;
    if result.opcode != Opcode::MoveResultObject {
        return Err(Error::UnexpectedInstruction {
            method: method.descriptor(),
            index: call + 1,
            expected: Opcode::MoveResultObject.to_string(),
            found: result.to_string(),
        });
    }

    let point = HookPoint::after(handler, method, call + 1, [method.register_at(call + 1)?])?;
    ctx.hooks.register(VideoInformation::VIDEO_ID_HOOK, point);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{ClassPool, Method};
    use crate::config::{DEFAULT_VIDEO_CLASS, PatchConfig};
    use crate::patch::PatchRunner;
    use crate::resource::ResourceType;
    use crate::testing;

    const MARKER_COLOR: i64 = 0x7f060010;

    fn app() -> ClassPool {
        let public = AccessFlags::PUBLIC;
        let constructor = AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR;
        let public_final = AccessFlags::PUBLIC | AccessFlags::FINAL;
        testing::pool(vec![
            testing::method(
                "Lapp/PlayerController;-><init>()V",
                constructor,
                1,
                "invoke-direct {p0}, Ljava/lang/Object;-><init>()V
                 return-void",
            ),
            testing::method(
                "Lapp/PlayerController;->seek(JLapp/SeekSource;)Z",
                public_final,
                5,
                "iget-object v0, p0, Lapp/PlayerController;->player:Lapp/Player;
                 invoke-virtual {v0, p1, p2}, Lapp/Player;->seekTo(J)Z
                 move-result v0
                 return v0",
            ),
            testing::method(
                "Lapp/PlayerController;->reportProgress(J)V",
                public,
                5,
                "invoke-direct/range {p0 .. p2}, Lapp/PlayerController;->setTime(J)V
                 iget-object v0, p0, Lapp/PlayerController;->player:Lapp/Player;
                 if-nez v0, :done
                 const-string v1, \"Media progress reported outside media playback: \"
                 :done
                 return-void",
            ),
            testing::method(
                "Lapp/PlayerController;->setTime(J)V",
                public,
                3,
                "iput-wide p1, p0, Lapp/PlayerController;->time:J
                 return-void",
            ),
            testing::method(
                "Lapp/SeekBar;-><init>(Landroid/content/Context;)V",
                constructor,
                3,
                "invoke-direct {p0}, Landroid/view/View;-><init>()V
                 const v0, 0x7f060010
                 iput v0, p0, Lapp/SeekBar;->markerColor:I
                 return-void",
            ),
            testing::method(
                "Lapp/SeekBar;->updateLength(Lapp/Player;)V",
                public,
                4,
                "invoke-virtual {p1}, Lapp/Player;->getDuration()J
                 move-result-wide v0
                 iput-wide v0, p0, Lapp/SeekBar;->length:J
                 return-void",
            ),
            testing::method(
                "Lapp/WatchController;->onResponse([Lapp/Response;Ljava/lang/Object;)V",
                public_final,
                5,
                "invoke-interface {p2}, Lapp/Response;->unwrap()Ljava/lang/Object;
                 move-result-object v0
                 iget-object v1, p0, Lapp/WatchController;->stage:Lapp/VideoStage;
                 return-void",
            ),
            testing::method(
                "Lapp/WatchNext;->onWatchNext(Ljava/lang/Object;)V",
                public_final,
                2,
                "const-string v0, \"currentWatchNextResponse\"
                 return-void",
            ),
            testing::method(
                "Lapp/WatchNext;->publishBackground()V",
                public_final,
                3,
                "iget-object v0, p0, Lapp/WatchNext;->response:Lapp/Response;
                 invoke-interface {v0}, Lapp/Response;->videoId()Ljava/lang/String;
                 move-result-object v1
                 return-void",
            ),
            testing::method(
                "Lapp/VideoStage;->handleVideoStageEvent(Lapp/Event;)V",
                public,
                4,
                "invoke-interface {p1}, Lapp/Event;->getStage()I
                 move-result v1
                 invoke-interface {p1}, Lapp/Event;->getVideoId()Ljava/lang/String;
                 move-result-object v0
                 invoke-interface {p1}, Lapp/Event;->isLive()Z
                 move-result v1
                 return-void",
            ),
        ])
    }

    fn context() -> PatchContext {
        context_with(app())
    }

    fn context_with(pool: ClassPool) -> PatchContext {
        let resources = testing::resources(&[(
            ResourceType::Color,
            "inline_time_bar_ad_break_marker_color",
            MARKER_COLOR,
        )]);
        PatchContext::new(pool, resources, PatchConfig::default())
    }

    fn with_constructor(body: &str, registers: u16) -> ClassPool {
        let mut pool = app();
        let constructor = pool
            .find_method(&"Lapp/PlayerController;-><init>()V".parse().unwrap())
            .unwrap();
        *pool.method_mut(constructor) = testing::method(
            "Lapp/PlayerController;-><init>()V",
            AccessFlags::PUBLIC | AccessFlags::CONSTRUCTOR,
            registers,
            body,
        );
        pool
    }

    /// Adds its own calls at every hook point video information leaves behind
    struct Sponsor;

    impl Patch for Sponsor {
        fn name(&self) -> &str {
            "sponsor"
        }

        fn dependencies(&self) -> &[&str] {
            &[VideoInformation::NAME]
        }

        fn execute(&self, ctx: &mut PatchContext) -> Result<()> {
            VideoInformation::on_create_hook(ctx, "Lapp/Sponsor;", "initialize")?;
            VideoInformation::video_time_hook(ctx, "Lapp/Sponsor;", "setVideoTime")?;
            VideoInformation::inject_call(ctx, "Lapp/Sponsor;->setVideoId(Ljava/lang/String;)V")?;
            VideoInformation::inject_background_playback_call(
                ctx,
                "Lapp/Sponsor;->setBackgroundVideoId(Ljava/lang/String;)V",
            )?;
            Ok(())
        }
    }

    fn runner() -> PatchRunner {
        PatchRunner::new()
            .with_patch(SharedResourceIds)
            .with_patch(VideoInformation)
    }

    fn method<'a>(ctx: &'a PatchContext, descriptor: &str) -> &'a Method {
        let reference = descriptor.parse().unwrap();
        ctx.method(ctx.pool.find_method(&reference).unwrap())
    }

    fn calls(method: &Method, index: usize) -> String {
        method.instructions[index].method_ref().unwrap().to_string()
    }

    #[test]
    fn test_installs_every_hook() {
        let mut ctx = context();
        runner().run(&mut ctx).unwrap();

        let init = method(&ctx, "Lapp/PlayerController;-><init>()V");
        assert_eq!(init.instruction_count(), 3);
        assert_eq!(
            calls(init, 1),
            format!("{}->initialize(Ljava/lang/Object;)V", DEFAULT_VIDEO_CLASS)
        );
        assert_eq!(init.instructions[1].registers, vec![0]);

        let length = method(&ctx, "Lapp/SeekBar;->updateLength(Lapp/Player;)V");
        assert_eq!(calls(length, 2), format!("{}->setVideoLength(J)V", DEFAULT_VIDEO_CLASS));
        assert_eq!(length.instructions[2].registers, vec![0, 1]);
        assert_eq!(length.instructions[3].opcode, Opcode::IputWide);

        // reached from the progress report
        let time = method(&ctx, "Lapp/PlayerController;->setTime(J)V");
        assert_eq!(calls(time, 0), format!("{}->setVideoTime(J)V", DEFAULT_VIDEO_CLASS));
        assert_eq!(time.instructions[0].registers, vec![1, 2]);

        let stage = method(&ctx, "Lapp/VideoStage;->handleVideoStageEvent(Lapp/Event;)V");
        assert_eq!(stage.instruction_count(), 8);
        assert_eq!(stage.instructions[3].opcode, Opcode::MoveResultObject);
        assert_eq!(
            calls(stage, 4),
            format!("{}->setVideoId(Ljava/lang/String;)V", DEFAULT_VIDEO_CLASS)
        );
        assert_eq!(stage.instructions[4].registers, vec![0]);
        assert_eq!(calls(stage, 5), "Lapp/Event;->isLive()Z");
    }

    #[test]
    fn test_synthesizes_seek_helper() {
        let mut ctx = context();
        runner().run(&mut ctx).unwrap();

        let seek = method(&ctx, "Lapp/PlayerController;->seekTo(J)Z");
        assert_eq!(seek.access_flags, AccessFlags::PUBLIC | AccessFlags::FINAL);
        assert_eq!(seek.registers, 4);
        assert_eq!(
            seek.instructions[0].field_ref().unwrap().to_string(),
            "Lapp/SeekSource;->a:Lapp/SeekSource;"
        );
        assert_eq!(calls(seek, 1), "Lapp/PlayerController;->seek(JLapp/SeekSource;)Z");
        assert_eq!(seek.instructions[1].registers, vec![1, 2, 3, 0]);
        assert_eq!(seek.instructions[3].opcode, Opcode::Return);
    }

    #[test]
    fn test_second_run_refuses_duplicate_helper() {
        let mut ctx = context();
        runner().run(&mut ctx).unwrap();
        let err = runner().run(&mut ctx).unwrap_err();
        let Error::PatchFailed { patch, source } = err else {
            panic!("expected a patch failure");
        };
        assert_eq!(patch, VideoInformation::NAME);
        assert!(matches!(*source, Error::DuplicateMethod(_)));
    }

    #[test]
    fn test_missing_stage_handler() {
        let mut pool = app();
        let stage = pool.find_class("Lapp/VideoStage;").unwrap();
        pool.class_mut(stage).methods[0].name = "onStage".to_string();
        let resources = testing::resources(&[(
            ResourceType::Color,
            "inline_time_bar_ad_break_marker_color",
            MARKER_COLOR,
        )]);
        let mut ctx = PatchContext::new(pool, resources, PatchConfig::default());

        let err = runner().run(&mut ctx).unwrap_err();
        let Error::PatchFailed { source, .. } = err else {
            panic!("expected a patch failure");
        };
        assert!(matches!(*source, Error::MethodNotFound(ref name) if name.ends_with(STAGE_HANDLER)));
    }

    #[test]
    fn test_registers_hook_points() {
        let mut ctx = context();
        runner().run(&mut ctx).unwrap();

        let names: Vec<&str> = ctx.hooks.names().collect();
        assert_eq!(
            names,
            vec![
                VideoInformation::BACKGROUND_VIDEO_ID_HOOK,
                VideoInformation::PLAYER_INIT_HOOK,
                VideoInformation::VIDEO_ID_HOOK,
                VideoInformation::VIDEO_TIME_HOOK,
            ]
        );
        let background = ctx.hooks.get(VideoInformation::BACKGROUND_VIDEO_ID_HOOK).unwrap();
        assert_eq!(background.registers(), &[1]);
        assert_eq!(background.injected(), 0);

        // nothing is called in background playback until a dependent asks for it
        let publish = method(&ctx, "Lapp/WatchNext;->publishBackground()V");
        assert_eq!(publish.instruction_count(), 4);
    }

    #[test]
    fn test_dependent_patch_shares_hook_points() {
        let mut ctx = context();
        runner().with_patch(Sponsor).run(&mut ctx).unwrap();

        let init = method(&ctx, "Lapp/PlayerController;-><init>()V");
        assert_eq!(
            calls(init, 1),
            format!("{}->initialize(Ljava/lang/Object;)V", DEFAULT_VIDEO_CLASS)
        );
        assert_eq!(calls(init, 2), "Lapp/Sponsor;->initialize(Ljava/lang/Object;)V");
        assert_eq!(init.instructions[2].registers, vec![0]);
        assert_eq!(init.instructions[3].opcode, Opcode::ReturnVoid);

        let time = method(&ctx, "Lapp/PlayerController;->setTime(J)V");
        assert_eq!(calls(time, 0), format!("{}->setVideoTime(J)V", DEFAULT_VIDEO_CLASS));
        assert_eq!(calls(time, 1), "Lapp/Sponsor;->setVideoTime(J)V");
        assert_eq!(time.instructions[1].registers, vec![1, 2]);

        let stage = method(&ctx, "Lapp/VideoStage;->handleVideoStageEvent(Lapp/Event;)V");
        assert_eq!(
            calls(stage, 4),
            format!("{}->setVideoId(Ljava/lang/String;)V", DEFAULT_VIDEO_CLASS)
        );
        assert_eq!(calls(stage, 5), "Lapp/Sponsor;->setVideoId(Ljava/lang/String;)V");
        assert_eq!(stage.instructions[5].registers, vec![0]);
        assert_eq!(calls(stage, 6), "Lapp/Event;->isLive()Z");

        let publish = method(&ctx, "Lapp/WatchNext;->publishBackground()V");
        assert_eq!(
            calls(publish, 3),
            "Lapp/Sponsor;->setBackgroundVideoId(Ljava/lang/String;)V"
        );
        assert_eq!(publish.instructions[3].registers, vec![1]);
        assert_eq!(publish.instructions[4].opcode, Opcode::ReturnVoid);
    }

    #[test]
    fn test_hooks_super_call_on_this_only() {
        // super(new Foo()): the temporary's constructor runs first
        let pool = with_constructor(
            "new-instance v0, Lapp/Foo;
             invoke-direct {v0}, Lapp/Foo;-><init>()V
             invoke-direct {p0, v0}, Lapp/Base;-><init>(Lapp/Foo;)V
             return-void",
            2,
        );
        let mut ctx = context_with(pool);
        runner().run(&mut ctx).unwrap();

        let init = method(&ctx, "Lapp/PlayerController;-><init>()V");
        assert_eq!(calls(init, 2), "Lapp/Base;-><init>(Lapp/Foo;)V");
        assert_eq!(
            calls(init, 3),
            format!("{}->initialize(Ljava/lang/Object;)V", DEFAULT_VIDEO_CLASS)
        );
        assert_eq!(init.instructions[3].registers, vec![1]);
        assert_eq!(init.instructions[4].opcode, Opcode::ReturnVoid);
    }

    #[test]
    fn test_constructor_without_super_call_on_this() {
        let pool = with_constructor(
            "new-instance v0, Lapp/Foo;
             invoke-direct {v0}, Lapp/Foo;-><init>()V
             return-void",
            2,
        );
        let mut ctx = context_with(pool);

        let err = runner().run(&mut ctx).unwrap_err();
        let Error::PatchFailed { patch, source } = err else {
            panic!("expected a patch failure");
        };
        assert_eq!(patch, VideoInformation::NAME);
        assert!(matches!(*source, Error::InvalidMethod(ref message) if message.contains("super constructor")));
    }
}
