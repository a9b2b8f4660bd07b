use lumen_ngin::{
    NginError,
    data_structures::{model::Model, texture::TextureKind},
    resources::{SceneImporter, gltf::GltfImporter, postprocess::PostProcess},
};

use crate::common::test_utils::{RecordingContext, RecordingPass, TempDir};

mod common;

const POSITIONS: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
const TEX_COORDS: [[f32; 2]; 3] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
const INDICES: [u16; 3] = [0, 1, 2];

/// Two meshes over one triangle buffer. Node "again" reuses the first mesh
/// below the second one, so a depth-first walk meets first, second, first.
const SCENE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "name": "demo", "nodes": [0] }],
  "nodes": [
    { "name": "root", "children": [1, 2] },
    { "name": "first", "mesh": 0 },
    { "name": "second", "mesh": 1, "children": [3] },
    { "name": "again", "mesh": 0, "translation": [0.0, 2.0, 0.0] }
  ],
  "meshes": [
    {
      "name": "first",
      "primitives": [
        { "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "indices": 2, "material": 0 }
      ]
    },
    {
      "name": "second",
      "primitives": [
        { "attributes": { "POSITION": 0 }, "indices": 2, "mode": SECOND_MODE }
      ]
    }
  ],
  "materials": [
    { "name": "painted", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } }
  ],
  "textures": [{ "source": 0 }],
  "images": [{ "uri": "paint.png" }],
  "accessors": [
    {
      "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
    },
    { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
    { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
    { "buffer": 0, "byteOffset": 60, "byteLength": 6 }
  ],
  "buffers": [{ "uri": "triangle.bin", "byteLength": 66 }]
}"#;

/// Write the scene with the second mesh drawn in `second_mode`
/// (4 = triangles, 0 = points).
fn write_scene(dir: &TempDir, second_mode: u32) -> std::path::PathBuf {
    write_scene_with(dir, &SCENE_GLTF.replace("SECOND_MODE", &second_mode.to_string()), INDICES)
}

fn write_scene_with(dir: &TempDir, gltf: &str, indices: [u16; 3]) -> std::path::PathBuf {
    let mut bin = Vec::new();
    bin.extend_from_slice(bytemuck::cast_slice(&POSITIONS));
    bin.extend_from_slice(bytemuck::cast_slice(&TEX_COORDS));
    bin.extend_from_slice(bytemuck::cast_slice(&indices));
    assert_eq!(bin.len(), 66);
    dir.write("triangle.bin", &bin);
    dir.write_png("paint.png", 2, 2, [20, 200, 20, 255]);
    dir.write("scene.gltf", gltf)
}

#[test]
fn gltf_model_is_walked_depth_first() {
    let dir = TempDir::new("gltf-order");
    let path = write_scene(&dir, 4);
    let ctx = RecordingContext::new();

    let model = Model::from_file(&ctx, &path).unwrap();
    let mut pass = RecordingPass::default();
    model.draw(&mut pass);

    assert_eq!(pass.mesh_names(), ["first", "second", "first"]);
    assert!(pass.draws.iter().all(|draw| draw.index_count == 3));
    // both uses of the first mesh share the one upload
    assert_eq!(ctx.texture_uploads(), 1);
    assert!(model.meshes()[0].textures()[0].shares_handle(&model.meshes()[2].textures()[0]));
}

#[test]
fn base_colour_becomes_the_diffuse_texture() {
    let dir = TempDir::new("gltf-material");
    let path = write_scene(&dir, 4);
    let ctx = RecordingContext::new();

    let model = Model::from_file(&ctx, &path).unwrap();
    let bindings = model.meshes()[0].bindings();
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].sampler, "texture_diffuse1");
    assert_eq!(bindings[0].kind, TextureKind::Diffuse);
    assert_eq!(bindings[0].path, "paint.png");
    assert!(model.meshes()[1].textures().is_empty());
}

#[test]
fn gltf_uvs_keep_their_top_left_origin() {
    let dir = TempDir::new("gltf-uvs");
    let path = write_scene(&dir, 4);
    let ctx = RecordingContext::new();

    let model = Model::from_file(&ctx, &path).unwrap();
    let uvs: Vec<[f32; 2]> = model.meshes()[0]
        .vertices()
        .iter()
        .map(|v| v.tex_coords)
        .collect();
    assert_eq!(uvs, TEX_COORDS);
    for vertex in model.meshes()[0].vertices() {
        assert!((vertex.normal[2] - 1.0).abs() < 1e-5);
        assert!((vertex.tangent[0] - 1.0).abs() < 1e-5);
    }
}

#[test]
fn node_transforms_are_kept_on_the_scene() {
    let dir = TempDir::new("gltf-nodes");
    let path = write_scene(&dir, 4);

    let scene = GltfImporter.import(&path, PostProcess::MODEL_DEFAULTS).unwrap();
    assert_eq!(scene.root.name, "root");
    assert_eq!(scene.node_count(), 4);
    // the primitive without a material gets an added default one
    assert_eq!(scene.materials.len(), 2);
    assert_eq!(scene.meshes[1].material, 1);

    let again = &scene.root.children[1].children[0];
    assert_eq!(again.name, "again");
    assert!(!again.has_identity_transform());
    assert_eq!(again.transform.w.y, 2.0);
}

#[test]
fn point_primitives_are_skipped() {
    let dir = TempDir::new("gltf-points");
    let path = write_scene(&dir, 0);
    let ctx = RecordingContext::new();

    let model = Model::from_file(&ctx, &path).unwrap();
    let mut pass = RecordingPass::default();
    model.draw(&mut pass);
    assert_eq!(pass.mesh_names(), ["first", "first"]);
}

#[test]
fn missing_buffer_is_an_import_error() {
    let dir = TempDir::new("gltf-no-bin");
    let path = dir.write(
        "scene.gltf",
        SCENE_GLTF.replace("SECOND_MODE", "4"),
    );
    let ctx = RecordingContext::new();

    let result = Model::from_file(&ctx, &path);
    assert!(matches!(result, Err(NginError::ModelImport { .. })));
    assert!(ctx.is_drained());
}

#[test]
fn index_past_the_positions_is_an_error() {
    let dir = TempDir::new("gltf-bad-index");
    let path = write_scene_with(&dir, &SCENE_GLTF.replace("SECOND_MODE", "4"), [0, 1, 7]);
    let ctx = RecordingContext::new();

    match GltfImporter.import(&path, PostProcess::MODEL_DEFAULTS) {
        Err(NginError::IndexOutOfRange {
            index,
            vertex_count,
            ..
        }) => {
            assert_eq!(index, 7);
            assert_eq!(vertex_count, 3);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("the scene should not import"),
    }

    let result = Model::from_file(&ctx, &path);
    assert!(matches!(result, Err(NginError::IndexOutOfRange { .. })));
    assert!(ctx.is_drained());
}

#[test]
fn short_tex_coords_are_an_import_error() {
    let dir = TempDir::new("gltf-short-uvs");
    let gltf = SCENE_GLTF.replace("SECOND_MODE", "4").replace(
        r#""count": 3, "type": "VEC2""#,
        r#""count": 2, "type": "VEC2""#,
    );
    let path = write_scene_with(&dir, &gltf, INDICES);
    let ctx = RecordingContext::new();

    let result = Model::from_file(&ctx, &path);
    assert!(matches!(result, Err(NginError::ModelImport { .. })));
    assert!(ctx.is_drained());
}

#[test]
fn percent_encoded_image_uri_names_the_decoded_file() {
    let dir = TempDir::new("gltf-encoded-uri");
    let gltf = SCENE_GLTF
        .replace("SECOND_MODE", "4")
        .replace(r#""uri": "paint.png""#, r#""uri": "wet%20paint.png""#);
    let path = write_scene_with(&dir, &gltf, INDICES);
    dir.write_png("wet paint.png", 2, 2, [20, 20, 200, 255]);
    let ctx = RecordingContext::new();

    let model = Model::from_file(&ctx, &path).unwrap();
    let bindings = model.meshes()[0].bindings();
    assert_eq!(bindings[0].path, "wet paint.png");
    assert_eq!(ctx.texture_uploads(), 1);
}
