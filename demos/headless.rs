use perch::gpu::{GpuContext, WgpuBinding};
use perch::prelude::*;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let context = GpuContext::new_headless()?;
    let target = context.create_target(WIDTH, HEIGHT);
    let mut binding = WgpuBinding::new(&context, target.format());

    // 4x4 checkerboard atlas, two regions used below
    let atlas = Texture::new(4, 4, TextureOptions::default());
    let pixels: Vec<u8> = (0..16)
        .flat_map(|i| {
            if (i % 4 + i / 4) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect();
    binding.upload_texture(&atlas, &pixels)?;

    let mut tree = DisplayTree::new();
    let stage = tree.create_container();

    // a grid of tinted quads: one batch
    let grid = tree.create_container();
    tree.add_child(stage, grid)?;
    for row in 0..10 {
        for col in 0..10 {
            let color = Color::rgb(col * 25, row * 25, 200);
            let quad = tree.create_quad(Quad::new(20.0, 20.0, color));
            tree.with_props_mut(quad, |p| {
                p.x = 20.0 + col as f32 * 24.0;
                p.y = 20.0 + row as f32 * 24.0;
            })?;
            tree.add_child(grid, quad)?;
        }
    }
    tree.flatten(grid)?;

    // textured sprites from the same atlas: another batch
    let sprites = tree.create_container();
    tree.add_child(stage, sprites)?;
    tree.with_props_mut(sprites, |p| {
        p.x = 320.0;
        p.y = 40.0;
        p.blend_mode = BlendMode::Add;
    })?;
    for i in 0..4 {
        let region = Rect::new((i % 2) as f32 * 2.0, (i / 2) as f32 * 2.0, 2.0, 2.0);
        let id = tree.create_quad(Quad::from_texture(atlas.sub_texture(region)));
        tree.with_props_mut(id, |p| {
            p.x = i as f32 * 60.0;
            p.scale_x = 24.0;
            p.scale_y = 24.0;
            p.rotation = 0.1 * i as f32;
        })?;
        tree.add_child(sprites, id)?;
    }

    let config = RenderConfig::new()
        .clear_color(Color::NAVY)
        .log_frame_stats(true);
    let [r, g, b, a] = config.clear_rgba();
    let mut renderer = StageRenderer::new(config);
    renderer.set_projection(0.0, 0.0, WIDTH as f32, HEIGHT as f32);

    for frame in 0..3 {
        if frame == 2 {
            // touching a grid quad invalidates the flattened grid
            let first = tree.child_at(grid, 0)?;
            tree.with_quad_mut(first, |q| q.set_color(Color::YELLOW))?;
        }
        let stats = renderer.render(&mut tree, stage, &mut binding)?;
        binding.submit(&target.view, Some(wgpu::Color { r, g, b, a }));
        log::info!(
            "Frame {frame}: {} draw calls for {} quads ({} flatten rebuilds)",
            stats.draw_calls,
            stats.quads,
            stats.flatten_rebuilds
        );
    }

    log::info!(
        "Pipelines created: {}, target {}x{}",
        binding.pipelines().len(),
        target.width,
        target.height
    );
    Ok(())
}
