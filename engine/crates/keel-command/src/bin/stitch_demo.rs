use anyhow::Context;
use keel_command::commands::bindings::GfxBindings;
use keel_command::commands::command_context::GfxCommandContext;
use keel_command::commands::command_queue::{GfxCommandQueue, QueueKind};
use keel_gfx::resource_state::ResourceState;
use keel_gfx::resources::manager::GfxResourceManager;
use keel_gfx::resources::resource::GfxTextureDesc;
use keel_gfx::resources::state_store::ResourceStateStore;

/// 两个线程各自录制一个命令列表，在同一次提交中拼接执行
fn main() -> anyhow::Result<()> {
    keel_crate_tools::init_log::init_log();

    let mut manager = GfxResourceManager::new();
    let hdr = manager.create_texture("hdr", &GfxTextureDesc::new(4, 1))?;
    let depth = manager.create_texture("depth", &GfxTextureDesc::default())?;
    let back_buffer = manager.create_texture(
        "back-buffer",
        &GfxTextureDesc::default().with_initial_state(ResourceState::PRESENT),
    )?;
    let constants = manager.create_buffer("per-frame", false);
    let hdr_top_mip = manager
        .get(hdr)
        .map(|texture| texture.subresource_index(0, 0))
        .context("hdr texture is missing")?;

    let (scene, post) = std::thread::scope(|s| {
        let manager = &manager;

        let scene = s.spawn(move || {
            let mut ctx = GfxCommandContext::new("scene", QueueKind::Direct);
            ctx.clear_render_target(manager, hdr, [0.0, 0.0, 0.0, 1.0]);
            ctx.clear_depth_stencil(manager, depth, 1.0, 0);
            let bindings = GfxBindings::default()
                .render_target(hdr)
                .depth_stencil(depth, false)
                .constant_buffer(constants);
            ctx.draw(manager, &bindings, 36, 16);
            ctx.finish()
        });

        let post = s.spawn(move || {
            let mut ctx = GfxCommandContext::new("post", QueueKind::Direct);
            // 第 0 级 mip 同时给非像素着色器读取
            ctx.transition_subresource(manager, hdr, hdr_top_mip, ResourceState::NON_PIXEL_SHADER_RESOURCE);
            let bindings = GfxBindings::default()
                .render_target(back_buffer)
                .pixel_shader_resource(hdr)
                .depth_stencil(depth, true)
                .constant_buffer(constants);
            ctx.draw(manager, &bindings, 3, 1);
            ctx.present(manager, back_buffer);
            ctx.finish()
        });

        (scene.join(), post.join())
    });
    let (scene, post) = match (scene, post) {
        (Ok(scene), Ok(post)) => (scene, post),
        _ => anyhow::bail!("a recording thread panicked"),
    };

    let mut queue = GfxCommandQueue::new("graphics", QueueKind::Direct);
    let record = queue.execute_command_lists(&mut manager, vec![scene, post])?;
    for list in &record.lists {
        log::info!("{:?} `{}`", list.role, list.command_list.name());
        for barrier in list.command_list.barriers() {
            log::info!(
                "    `{}`[{}]: {} -> {}",
                manager.debug_name(barrier.resource),
                barrier.subresource,
                barrier.before,
                barrier.after
            );
        }
    }

    for (handle, resource) in manager.iter() {
        log::info!("`{}` ({:?}) -> {:?}", resource.name(), resource.kind(), manager.committed_states(handle));
    }
    Ok(())
}
