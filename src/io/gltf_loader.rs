use crate::core::geometry::{Vertex, face_normal};
use crate::error::LoadError;
use crate::scene::material::Material;
use crate::scene::mesh::Mesh;
use crate::scene::model::Model;
use crate::scene::texture::Texture;
use crate::upload::intake::ModelSource;
use crate::upload::worker::SceneDecoder;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use log::{debug, info, warn};
use nalgebra::{Matrix3, Matrix4, Point3, Vector2, Vector3};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const READ_CHUNK: usize = 1024 * 1024;

// Progress checkpoints, in percent.
const READ_DONE: f32 = 60.0;
const PARSED: f32 = 65.0;
const BUFFERS_READY: f32 = 75.0;
const IMAGES_READY: f32 = 85.0;

/// Decodes `.glb` / `.gltf` files with the `gltf` crate into a [`Model`].
///
/// Every node transform is baked into the vertices, so the returned model's
/// root transform starts at identity.
#[derive(Debug, Clone)]
pub struct GltfDecoder {
    /// Images larger than this on either side are downscaled.
    pub max_texture_size: u32,
}

impl Default for GltfDecoder {
    fn default() -> Self {
        Self {
            max_texture_size: 2048,
        }
    }
}

impl SceneDecoder for GltfDecoder {
    fn decode(
        &self,
        source: &ModelSource,
        progress: &mut dyn FnMut(f32),
        cancel: &AtomicBool,
    ) -> Result<Model, LoadError> {
        let name = source.display_name();
        info!("Decoding '{}'", name);

        let bytes = read_source(source, progress, cancel)?;
        progress(READ_DONE);

        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(&bytes)?;
        drop(bytes);
        progress(PARSED);
        check_cancel(cancel)?;

        let base_dir = source.base_dir();
        let buffers = gltf::import_buffers(&document, base_dir, blob)?;
        progress(BUFFERS_READY);
        check_cancel(cancel)?;

        let images = gltf::import_images(&document, base_dir, &buffers)?;
        progress(IMAGES_READY);
        check_cancel(cancel)?;
        debug!(
            "'{}': {} buffer(s), {} image(s), {} material(s)",
            name,
            buffers.len(),
            images.len(),
            document.materials().len()
        );

        let materials = self.load_materials(&document, &images);

        let mut meshes = Vec::new();
        let total = document.nodes().filter(|n| n.mesh().is_some()).count().max(1);
        let mut done = 0usize;
        let roots: Vec<gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
            Some(scene) => scene.nodes().collect(),
            None => {
                warn!("'{}' has no scene, using every top-level node as a root", name);
                let children: HashSet<usize> = document
                    .nodes()
                    .flat_map(|n| n.children().map(|c| c.index()))
                    .collect();
                document.nodes().filter(|n| !children.contains(&n.index())).collect()
            }
        };

        // Node hierarchies must be disjoint trees; a revisited node means a
        // cycle or a shared child.
        let mut visited = HashSet::new();
        let mut stack: Vec<(gltf::Node, Matrix4<f32>)> =
            roots.into_iter().map(|n| (n, Matrix4::identity())).collect();
        while let Some((node, parent)) = stack.pop() {
            check_cancel(cancel)?;
            if !visited.insert(node.index()) {
                return Err(LoadError::Invalid(format!(
                    "node {} appears more than once in the node hierarchy",
                    node.index()
                )));
            }
            let world = parent * Matrix4::from(node.transform().matrix());

            if let Some(mesh) = node.mesh() {
                for primitive in mesh.primitives() {
                    if let Some(baked) = bake_primitive(&primitive, &buffers, &world, mesh.name()) {
                        meshes.push(baked);
                    }
                }
                done += 1;
                progress(IMAGES_READY + (100.0 - IMAGES_READY) * done as f32 / total as f32);
            }
            stack.extend(node.children().map(|child| (child, world)));
        }

        if meshes.iter().all(|m| m.triangle_count() == 0) {
            return Err(LoadError::Empty);
        }

        let model = Model::new(name, meshes, materials);
        let stats = model.stats();
        info!(
            "Decoded '{}': {} meshes, {} triangles, {} textures",
            model.name, stats.meshes, stats.triangles, stats.textures
        );
        progress(100.0);
        Ok(model)
    }
}

impl GltfDecoder {
    pub fn new(max_texture_size: u32) -> Self {
        Self { max_texture_size }
    }

    /// One [`Material`] per glTF material, in document order.
    fn load_materials(
        &self,
        document: &gltf::Document,
        images: &[gltf::image::Data],
    ) -> Vec<Material> {
        let mut textures: HashMap<usize, Option<Arc<Texture>>> = HashMap::new();

        document
            .materials()
            .map(|mat| {
                let pbr = mat.pbr_metallic_roughness();
                let [r, g, b, _] = pbr.base_color_factor();

                let base_color_texture = pbr.base_color_texture().and_then(|info| {
                    let index = info.texture().source().index();
                    textures
                        .entry(index)
                        .or_insert_with(|| {
                            let data = images.get(index)?;
                            let rgba = to_rgba(data)?;
                            Some(Arc::new(Texture::from_rgba(Texture::fit_within(
                                rgba,
                                self.max_texture_size,
                            ))))
                        })
                        .clone()
                });

                Material {
                    name: mat.name().map(str::to_string),
                    base_color: Vector3::new(r, g, b),
                    base_color_texture,
                    metallic: pbr.metallic_factor(),
                    roughness: pbr.roughness_factor(),
                    emissive: Vector3::from(mat.emissive_factor()),
                    double_sided: mat.double_sided(),
                }
            })
            .collect()
    }
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), LoadError> {
    if cancel.load(Ordering::Relaxed) {
        Err(LoadError::Cancelled)
    } else {
        Ok(())
    }
}

/// File contents, read in chunks so progress and cancellation stay live.
fn read_source<'a>(
    source: &'a ModelSource,
    progress: &mut dyn FnMut(f32),
    cancel: &AtomicBool,
) -> Result<Cow<'a, [u8]>, LoadError> {
    match source {
        ModelSource::Bytes { bytes, .. } => Ok(Cow::Borrowed(&bytes[..])),
        ModelSource::Path(path) => {
            let mut file = File::open(path)?;
            let total = file.metadata()?.len().max(1) as f32;
            let mut bytes = Vec::with_capacity(total as usize);
            let mut chunk = vec![0u8; READ_CHUNK];
            loop {
                check_cancel(cancel)?;
                let n = file.read(&mut chunk)?;
                if n == 0 {
                    break;
                }
                bytes.extend_from_slice(&chunk[..n]);
                progress((bytes.len() as f32 / total).min(1.0) * READ_DONE);
            }
            Ok(Cow::Owned(bytes))
        }
    }
}

/// Converts decoded image data to RGBA8, or `None` for unsupported formats.
fn to_rgba(data: &gltf::image::Data) -> Option<RgbaImage> {
    use gltf::image::Format;

    let (w, h) = (data.width, data.height);
    let pixels = data.pixels.clone();
    let image = match data.format {
        Format::R8G8B8A8 => DynamicImage::ImageRgba8(RgbaImage::from_raw(w, h, pixels)?),
        Format::R8G8B8 => DynamicImage::ImageRgb8(RgbImage::from_raw(w, h, pixels)?),
        Format::R8G8 => DynamicImage::ImageLumaA8(GrayAlphaImage::from_raw(w, h, pixels)?),
        Format::R8 => DynamicImage::ImageLuma8(GrayImage::from_raw(w, h, pixels)?),
        other => {
            warn!("Unsupported texture format {:?}, ignoring texture", other);
            return None;
        }
    };
    Some(image.to_rgba8())
}

/// Bakes one triangle-list primitive into a mesh under `world`.
fn bake_primitive(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    world: &Matrix4<f32>,
    mesh_name: Option<&str>,
) -> Option<Mesh> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        warn!(
            "Skipping {:?} primitive in mesh '{}'",
            primitive.mode(),
            mesh_name.unwrap_or("<unnamed>")
        );
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    if positions.is_empty() {
        return None;
    }
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|n| n.collect());
    let texcoords: Vec<[f32; 2]> = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect())
        .unwrap_or_default();
    let mut indices: Vec<u32> = match reader.read_indices() {
        Some(read) => read.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    indices.truncate(indices.len() - indices.len() % 3);

    let linear = world.fixed_view::<3, 3>(0, 0).into_owned();
    let normal_matrix: Matrix3<f32> = linear.try_inverse().unwrap_or(linear).transpose();
    // Mirrored transforms flip the winding.
    if linear.determinant() < 0.0 {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    let mut vertices: Vec<Vertex> = positions
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let position = world.transform_point(&Point3::from(*p));
            let normal = normals
                .as_ref()
                .and_then(|n| n.get(i))
                .and_then(|n| (normal_matrix * Vector3::from(*n)).try_normalize(1e-12))
                .unwrap_or_else(Vector3::y);
            let texcoord = texcoords
                .get(i)
                .map(|t| Vector2::from(*t))
                .unwrap_or_else(Vector2::zeros);
            Vertex::new(position, normal, texcoord)
        })
        .collect();

    if normals.is_none() {
        (vertices, indices) = flat_shaded(&vertices, &indices);
    }

    let mut mesh = Mesh::new(vertices, indices, primitive.material().index());
    mesh.name = mesh_name.map(str::to_string);
    Some(mesh)
}

/// Splits shared vertices so every triangle gets its own face normal.
fn flat_shaded(vertices: &[Vertex], indices: &[u32]) -> (Vec<Vertex>, Vec<u32>) {
    let mut out = Vec::with_capacity(indices.len());
    for tri in indices.chunks_exact(3) {
        let corners: Option<Vec<Vertex>> = tri
            .iter()
            .map(|&i| vertices.get(i as usize).copied())
            .collect();
        let Some(corners) = corners else { continue };
        let n = face_normal(&corners[0].position, &corners[1].position, &corners[2].position);
        out.extend(corners.into_iter().map(|v| Vertex { normal: n, ..v }));
    }
    let indices = (0..out.len() as u32).collect();
    (out, indices)
}

#[cfg(test)]
mod tests {
    use super::GltfDecoder;
    use crate::error::LoadError;
    use crate::upload::intake::ModelSource;
    use crate::upload::worker::SceneDecoder;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    const SOLID_MATERIAL: &str = r#"[{"pbrMetallicRoughness":{"baseColorFactor":[1.0,0.5,0.25,1.0],"metallicFactor":0.0},"doubleSided":true}]"#;

    /// A single-triangle GLB without normals, placed by a node translation.
    fn triangle_glb(translation: [f32; 3]) -> Vec<u8> {
        let [tx, ty, tz] = translation;
        let layout = format!(
            r#""scene":0,"scenes":[{{"nodes":[0]}}],"nodes":[{{"mesh":0,"translation":[{tx},{ty},{tz}]}}]"#
        );
        triangle_asset(&layout, SOLID_MATERIAL, None)
    }

    /// Mesh 0 is one triangle using material 0. `layout` supplies the scene
    /// and node entries; `png` is embedded as image 0 behind texture 0.
    fn triangle_asset(layout: &str, materials: &str, png: Option<&[u8]>) -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let mut image_views = String::new();
        let mut image_entries = String::new();
        if let Some(png) = png {
            image_views = format!(
                r#",{{"buffer":0,"byteOffset":{},"byteLength":{}}}"#,
                bin.len(),
                png.len()
            );
            image_entries =
                r#""images":[{"bufferView":2,"mimeType":"image/png"}],"textures":[{"source":0}],"#
                    .to_string();
            bin.extend_from_slice(png);
        }
        let bin_len = bin.len();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let mut json = format!(
            r#"{{"asset":{{"version":"2.0"}},{layout},
"meshes":[{{"name":"tri","primitives":[{{"attributes":{{"POSITION":0}},"indices":1,"material":0}}]}}],
"materials":{materials},{image_entries}
"buffers":[{{"byteLength":{bin_len}}}],
"bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}},{{"buffer":0,"byteOffset":36,"byteLength":6}}{image_views}],
"accessors":[
{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]}},
{{"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}}]}}"#
        )
        .into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"BIN\0");
        glb.extend_from_slice(&bin);
        glb
    }

    fn checker_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([200, 40, 40, 255])
            }
        });
        let mut png = Vec::new();
        image::DynamicImage::ImageRgba8(image)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .expect("encode png");
        png
    }

    fn bytes_source(name: &str, bytes: Vec<u8>) -> ModelSource {
        ModelSource::Bytes {
            name: name.to_string(),
            bytes: Arc::from(bytes),
        }
    }

    #[test]
    fn decodes_a_glb_triangle_with_baked_node_transform() {
        let source = bytes_source("tri.glb", triangle_glb([5.0, 5.0, 5.0]));
        let mut reported = Vec::new();
        let model = GltfDecoder::default()
            .decode(&source, &mut |p| reported.push(p), &AtomicBool::new(false))
            .expect("triangle decodes");

        assert_eq!(model.name, "tri.glb");
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.triangle_count(), 1);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.name.as_deref(), Some("tri"));
        assert_eq!(mesh.vertices[0].position.coords.x, 5.0);
        // Generated flat normal for a CCW triangle in the XY plane.
        assert!((mesh.vertices[0].normal.z - 1.0).abs() < 1e-5);

        let material = model.material(mesh).expect("material");
        assert!(material.double_sided);
        assert_eq!(material.base_color.y, 0.5);

        assert_eq!(reported.last().copied(), Some(100.0));
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn reads_from_disk_in_chunks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tri.glb");
        std::fs::write(&path, triangle_glb([0.0, 0.0, 0.0])).expect("write glb");

        let model = GltfDecoder::default()
            .decode(&ModelSource::Path(path), &mut |_| {}, &AtomicBool::new(false))
            .expect("decodes from path");
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let source = bytes_source("junk.glb", b"definitely not a model".to_vec());
        let err = GltfDecoder::default()
            .decode(&source, &mut |_| {}, &AtomicBool::new(false))
            .expect_err("garbage must fail");
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn raised_cancel_flag_stops_the_decode() {
        let source = bytes_source("tri.glb", triangle_glb([0.0, 0.0, 0.0]));
        let err = GltfDecoder::default()
            .decode(&source, &mut |_| {}, &AtomicBool::new(true))
            .expect_err("cancelled");
        assert!(matches!(err, LoadError::Cancelled));
    }

    #[test]
    fn node_cycles_are_rejected_instead_of_walked_forever() {
        let layouts = [
            r#""scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"mesh":0,"children":[0]}]"#,
            r#""scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"mesh":0,"children":[1]},{"children":[0]}]"#,
            r#""scene":0,"scenes":[{"nodes":[0,1]}],"nodes":[{"mesh":0,"children":[1]},{"mesh":0}]"#,
        ];
        for layout in layouts {
            let source = bytes_source("loop.glb", triangle_asset(layout, SOLID_MATERIAL, None));
            let err = GltfDecoder::default()
                .decode(&source, &mut |_| {}, &AtomicBool::new(false))
                .expect_err("revisited node must fail");
            assert!(matches!(err, LoadError::Invalid(_)), "{layout}: {err}");
        }
    }

    #[test]
    fn sceneless_asset_walks_only_top_level_nodes() {
        let layout = r#""nodes":[{"children":[1],"translation":[0,2,0]},{"mesh":0}]"#;
        let source = bytes_source("bare.glb", triangle_asset(layout, SOLID_MATERIAL, None));
        let model = GltfDecoder::default()
            .decode(&source, &mut |_| {}, &AtomicBool::new(false))
            .expect("child reached once through its parent");
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.meshes[0].vertices[0].position.coords.y, 2.0);
    }

    #[test]
    fn embedded_texture_is_downscaled_and_shared_between_materials() {
        let materials = r#"[
{"name":"front","pbrMetallicRoughness":{"baseColorTexture":{"index":0}}},
{"name":"back","pbrMetallicRoughness":{"baseColorTexture":{"index":0}}}]"#;
        let layout = r#""scene":0,"scenes":[{"nodes":[0]}],"nodes":[{"mesh":0}]"#;
        let png = checker_png(8, 4);
        let source = bytes_source("textured.glb", triangle_asset(layout, materials, Some(&png)));

        let model = GltfDecoder::new(4)
            .decode(&source, &mut |_| {}, &AtomicBool::new(false))
            .expect("textured triangle decodes");

        assert_eq!(model.materials.len(), 2);
        let front = model.materials[0].base_color_texture.as_ref().expect("front texture");
        let back = model.materials[1].base_color_texture.as_ref().expect("back texture");
        assert_eq!((front.width, front.height), (4, 2));
        assert_eq!(front.image.dimensions(), (4, 2));
        assert!(Arc::ptr_eq(front, back));
        assert_eq!(model.stats().textures, 2);
    }
}
