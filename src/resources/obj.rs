//! Wavefront OBJ/MTL import through `tobj`.

use std::path::Path;

use crate::{
    data_structures::scene_graph::{MaterialChannel, MaterialData, SceneData, SceneNode, SubMesh},
    error::{NginError, Result},
    resources::{SceneImporter, postprocess::PostProcess},
};

/// OBJ files have no hierarchy: the scene is a root with one child per object.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path, post: PostProcess) -> Result<SceneData> {
        let (models, obj_materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: post.triangulate,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| NginError::import(path, e.to_string()))?;

        let mut materials: Vec<MaterialData> = match obj_materials {
            Ok(materials) => materials.iter().map(convert_material).collect(),
            Err(e) => {
                log::warn!(
                    "materials of {} could not be loaded ({e}), using a default material",
                    path.display()
                );
                Vec::new()
            }
        };
        let mut default_material = None;

        let mut root = SceneNode::new(
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        let mut meshes = Vec::with_capacity(models.len());
        for model in models {
            let material = match model.mesh.material_id {
                Some(id) if id < materials.len() => id,
                _ => *default_material.get_or_insert_with(|| {
                    materials.push(MaterialData::new("default"));
                    materials.len() - 1
                }),
            };
            let mut sub_mesh = convert_mesh(path, &model, material)?;
            sub_mesh.validate(path)?;
            post.apply(&mut sub_mesh);

            root.children
                .push(SceneNode::new(&model.name).with_meshes([meshes.len()]));
            meshes.push(sub_mesh);
        }

        log::debug!(
            "imported {} with {} objects and {} materials",
            path.display(),
            meshes.len(),
            materials.len()
        );
        Ok(SceneData {
            root,
            meshes,
            materials,
        })
    }
}

fn convert_mesh(path: &Path, model: &tobj::Model, material: usize) -> Result<SubMesh> {
    let mesh = &model.mesh;
    if let Some(arity) = mesh.face_arities.iter().find(|&&arity| arity != 3) {
        return Err(NginError::import(
            path,
            format!("object '{}' has a face with {arity} vertices", model.name),
        ));
    }
    if mesh.indices.len() % 3 != 0 {
        return Err(NginError::import(
            path,
            format!("object '{}' has a truncated face list", model.name),
        ));
    }

    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let normals = (!mesh.normals.is_empty()).then(|| {
        mesh.normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect()
    });
    let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], t[1]])
            .collect()
    });

    Ok(SubMesh {
        name: model.name.clone(),
        positions,
        normals,
        tex_coords,
        faces: mesh
            .indices
            .chunks_exact(3)
            .map(|f| [f[0], f[1], f[2]])
            .collect(),
        material,
        ..Default::default()
    })
}

fn convert_material(material: &tobj::Material) -> MaterialData {
    let mut data = MaterialData::new(&material.name);
    let channels = [
        (MaterialChannel::Diffuse, &material.diffuse_texture),
        (MaterialChannel::Specular, &material.specular_texture),
        (MaterialChannel::Height, &material.normal_texture),
        (MaterialChannel::Ambient, &material.ambient_texture),
        (MaterialChannel::Shininess, &material.shininess_texture),
        (MaterialChannel::Opacity, &material.dissolve_texture),
    ];
    for (channel, texture) in channels {
        if let Some(texture) = texture {
            data.add_texture(channel, texture);
        }
    }
    for key in ["norm", "map_Kn"] {
        if let Some(texture) = material.unknown_param.get(key) {
            data.add_texture(MaterialChannel::Normals, texture);
        }
    }
    data
}
