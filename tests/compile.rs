use perch::prelude::*;
use perch::render::MAX_NUM_QUADS;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add(tree: &mut DisplayTree, parent: NodeId, quad: Quad) -> NodeId {
    let id = tree.create_quad(quad);
    tree.add_child(parent, id).unwrap();
    id
}

fn sizes(batches: &[QuadBatch]) -> Vec<usize> {
    batches.iter().map(QuadBatch::num_quads).collect()
}

#[test]
fn test_empty_container_yields_no_batches() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    let group = tree.create_container();
    tree.add_child(root, group).unwrap();

    assert!(compile(&tree, root).unwrap().is_empty());
}

#[test]
fn test_identical_quads_share_a_batch() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::new(10.0, 10.0, Color::WHITE));
    add(&mut tree, root, Quad::new(10.0, 10.0, Color::WHITE));

    let batches = compile(&tree, root).unwrap();
    assert_eq!(sizes(&batches), vec![2]);
    assert!(batches[0].texture().is_none());
    assert!(!batches[0].tinted());
}

#[test]
fn test_different_textures_split_batches() {
    init_logger();
    let a = Texture::new(32, 32, TextureOptions::default());
    let b = Texture::new(32, 32, TextureOptions::default());

    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::from_texture(a.clone()));
    add(&mut tree, root, Quad::from_texture(b));
    assert_eq!(sizes(&compile(&tree, root).unwrap()), vec![1, 1]);

    // regions of one atlas batch together
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::from_texture(a.sub_texture(Rect::new(0.0, 0.0, 16.0, 16.0))));
    add(&mut tree, root, Quad::from_texture(a.sub_texture(Rect::new(16.0, 16.0, 16.0, 16.0))));
    assert_eq!(sizes(&compile(&tree, root).unwrap()), vec![2]);
}

#[test]
fn test_sampling_state_is_part_of_the_batch_state() {
    init_logger();
    let texture = Texture::new(8, 8, TextureOptions::default());
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::from_texture(texture.clone()));
    add(
        &mut tree,
        root,
        Quad::from_texture(texture.with_smoothing(TextureSmoothing::None)),
    );

    assert_eq!(sizes(&compile(&tree, root).unwrap()), vec![1, 1]);
}

#[test]
fn test_full_batch_spills_into_the_next() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    for _ in 0..MAX_NUM_QUADS + 1 {
        add(&mut tree, root, Quad::new(1.0, 1.0, Color::WHITE));
    }

    let batches = compile(&tree, root).unwrap();
    assert_eq!(sizes(&batches), vec![MAX_NUM_QUADS, 1]);
}

#[test]
fn test_paint_order_is_never_rearranged() {
    init_logger();
    let a = Texture::new(4, 4, TextureOptions::default());
    let b = Texture::new(4, 4, TextureOptions::default());

    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::from_texture(a.clone()));
    add(&mut tree, root, Quad::from_texture(b.clone()));
    add(&mut tree, root, Quad::from_texture(a.clone()));

    let batches = compile(&tree, root).unwrap();
    let ids: Vec<_> = batches
        .iter()
        .map(|batch| batch.texture().map(Texture::id))
        .collect();
    assert_eq!(ids, vec![Some(a.id()), Some(b.id()), Some(a.id())]);
}

#[test]
fn test_tint_and_alpha_split_batches() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::new(1.0, 1.0, Color::WHITE));
    add(&mut tree, root, Quad::new(1.0, 1.0, Color::RED));
    let faded = add(&mut tree, root, Quad::new(1.0, 1.0, Color::WHITE));
    tree.with_props_mut(faded, |p| p.alpha = 0.5).unwrap();

    let batches = compile(&tree, root).unwrap();
    assert_eq!(sizes(&batches), vec![1, 2]);
    assert!(batches[1].tinted());
    assert_eq!(batches[1].quad_alpha(1), 0.5);
}

#[test]
fn test_explicit_blend_mode_wins_over_inherited() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    let group = tree.create_container();
    tree.add_child(root, group).unwrap();
    tree.with_props_mut(group, |p| p.blend_mode = BlendMode::Multiply)
        .unwrap();

    let inherits = add(&mut tree, group, Quad::new(1.0, 1.0, Color::WHITE));
    let explicit = add(&mut tree, group, Quad::new(1.0, 1.0, Color::WHITE));
    tree.with_props_mut(explicit, |p| p.blend_mode = BlendMode::Add)
        .unwrap();
    assert_eq!(tree.props(inherits).unwrap().blend_mode, BlendMode::Auto);

    let batches = compile(&tree, root).unwrap();
    let modes: Vec<_> = batches.iter().map(QuadBatch::blend_mode).collect();
    assert_eq!(modes, vec![BlendMode::Multiply, BlendMode::Add]);

    // the root's own mode is the base everything inherits from
    tree.with_props_mut(root, |p| p.blend_mode = BlendMode::Screen)
        .unwrap();
    tree.with_props_mut(group, |p| p.blend_mode = BlendMode::Auto)
        .unwrap();
    let batches = compile(&tree, root).unwrap();
    let modes: Vec<_> = batches.iter().map(QuadBatch::blend_mode).collect();
    assert_eq!(modes, vec![BlendMode::Screen, BlendMode::Add]);
}

#[test]
fn test_prebuilt_batch_leaf_is_merged() {
    init_logger();
    let mut prebuilt = QuadBatch::new();
    prebuilt.append_quad(&Quad::new(2.0, 2.0, Color::WHITE));
    prebuilt.append_quad(&Quad::new(2.0, 2.0, Color::WHITE));

    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    add(&mut tree, root, Quad::new(1.0, 1.0, Color::WHITE));
    let leaf = tree.create_batch(prebuilt);
    tree.add_child(root, leaf).unwrap();
    tree.with_props_mut(leaf, |p| {
        p.x = 10.0;
        p.y = 20.0;
    })
    .unwrap();

    let batches = compile(&tree, root).unwrap();
    assert_eq!(sizes(&batches), vec![3]);
    assert_eq!(batches[0].bounds(None), Rect::new(0.0, 0.0, 12.0, 22.0));
}

fn prebuilt_blend(stored: BlendMode, node: BlendMode, root_mode: BlendMode) -> BlendMode {
    let mut prebuilt = QuadBatch::new();
    prebuilt.add_quad(&Quad::new(2.0, 2.0, Color::WHITE), 1.0, stored, None);
    assert_eq!(prebuilt.blend_mode(), stored);

    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    tree.with_props_mut(root, |p| p.blend_mode = root_mode).unwrap();
    let leaf = tree.create_batch(prebuilt);
    tree.add_child(root, leaf).unwrap();
    tree.with_props_mut(leaf, |p| p.blend_mode = node).unwrap();

    let batches = compile(&tree, root).unwrap();
    assert_eq!(batches.len(), 1);
    batches[0].blend_mode()
}

#[test]
fn test_prebuilt_batch_leaf_blend_precedence() {
    init_logger();
    use BlendMode::{Add, Auto, Multiply, Screen};

    // the node's own mode wins over the one stored in the batch
    assert_eq!(prebuilt_blend(Auto, Multiply, Auto), Multiply);
    assert_eq!(prebuilt_blend(Add, Multiply, Auto), Multiply);
    assert_eq!(prebuilt_blend(Add, Multiply, Screen), Multiply);

    // an Auto node keeps the stored mode, which beats the inherited one
    assert_eq!(prebuilt_blend(Add, Auto, Auto), Add);
    assert_eq!(prebuilt_blend(Add, Auto, Screen), Add);

    // nothing set anywhere but the root
    assert_eq!(prebuilt_blend(Auto, Auto, Screen), Screen);
}

#[test]
fn test_blend_override_beats_prebuilt_batch_leaves() {
    init_logger();
    let mut prebuilt = QuadBatch::new();
    prebuilt.add_quad(&Quad::new(2.0, 2.0, Color::WHITE), 1.0, BlendMode::Add, None);

    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    let leaf = tree.create_batch(prebuilt);
    tree.add_child(root, leaf).unwrap();
    tree.with_props_mut(leaf, |p| p.blend_mode = BlendMode::Multiply)
        .unwrap();

    let batches = BatchCompiler::new()
        .with_blend_override(Some(BlendMode::Erase))
        .compile(&tree, root)
        .unwrap();
    assert_eq!(batches[0].blend_mode(), BlendMode::Erase);
}

#[test]
fn test_invisible_subtrees_are_skipped() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    let group = tree.create_container();
    tree.add_child(root, group).unwrap();
    add(&mut tree, group, Quad::new(1.0, 1.0, Color::WHITE));
    add(&mut tree, root, Quad::new(1.0, 1.0, Color::WHITE));

    tree.with_props_mut(group, |p| p.scale_x = 0.0).unwrap();
    assert_eq!(sizes(&compile(&tree, root).unwrap()), vec![1]);

    tree.with_props_mut(group, |p| {
        p.scale_x = 1.0;
        p.alpha = 0.0;
    })
    .unwrap();
    assert_eq!(sizes(&compile(&tree, root).unwrap()), vec![1]);
}

#[test]
fn test_flattened_container_is_rebuilt_only_when_stale() {
    init_logger();
    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    let group = tree.create_container();
    tree.add_child(root, group).unwrap();
    let leaf = add(&mut tree, group, Quad::new(4.0, 4.0, Color::WHITE));
    tree.flatten(group).unwrap();

    let compiler = BatchCompiler::new();
    assert_eq!(compiler.refresh_flattened(&mut tree, root).unwrap(), 1);
    assert!(tree.flatten_cache(group).unwrap().is_valid());

    // moving the flattened container itself keeps its cache
    tree.with_props_mut(group, |p| p.x = 3.0).unwrap();
    assert_eq!(compiler.refresh_flattened(&mut tree, root).unwrap(), 0);

    tree.with_quad_mut(leaf, |q| q.set_color(Color::BLUE)).unwrap();
    assert_eq!(compiler.refresh_flattened(&mut tree, root).unwrap(), 1);

    let batches = compiler.compile(&tree, root).unwrap();
    assert_eq!(batches[0].quad_color(0), Color::BLUE);
    assert_eq!(batches[0].bounds(None), Rect::new(3.0, 0.0, 4.0, 4.0));
}

#[test]
fn test_degenerate_matrix_cannot_be_inverted() {
    let mut m = Matrix::new(1.0, 2.0, 2.0, 4.0, 0.0, 0.0);
    assert!(matches!(m.invert(), Err(Error::InvalidOperation(_))));

    let mut tree = DisplayTree::new();
    let root = tree.create_container();
    let a = tree.create_container();
    let b = tree.create_container();
    tree.add_child(root, a).unwrap();
    tree.add_child(root, b).unwrap();
    tree.with_props_mut(b, |p| p.scale_y = 0.0).unwrap();
    assert!(matches!(
        tree.transformation_matrix_to(a, Some(b)),
        Err(Error::InvalidOperation(_))
    ));
}

#[test]
fn test_premultiplied_colors_read_back_straight() {
    let mut data = VertexData::new(1, true);
    data.set_color_and_alpha(0, Color::from_hex(0x804020), 0.5);
    assert_eq!(data.color(0), Color::from_hex(0x804020));
    assert_eq!(data.alpha(0), 0.5);
    assert_eq!(data.stored_color(0), Color::from_hex(0x402010));

    // repeated alpha edits keep the original colour
    for alpha in [0.1, 0.9, 0.01, 1.0] {
        data.set_alpha(0, alpha);
    }
    assert_eq!(data.color(0), Color::from_hex(0x804020));
    assert_eq!(data.stored_color(0), Color::from_hex(0x804020));

    data.set_alpha(0, 0.5);
    data.set_premultiplied_alpha(false);
    assert_eq!(data.stored_color(0), Color::from_hex(0x804020));
    assert_eq!(data.color(0), Color::from_hex(0x804020));
}
