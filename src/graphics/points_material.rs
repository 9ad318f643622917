use super::shader_types::PointsUniform;
use crate::galaxy::PointFieldBackend;
use crate::prelude::*;
use bevy::{
    ecs::system::SystemParam,
    pbr::{MaterialPipeline, MaterialPipelineKey, NotShadowCaster},
    prelude::*,
    reflect::TypePath,
    render::{
        mesh::{Indices, MeshVertexAttribute, MeshVertexBufferLayoutRef, PrimitiveTopology},
        render_asset::RenderAssetUsages,
        render_resource::{
            AsBindGroup, RenderPipelineDescriptor, ShaderRef, SpecializedMeshPipelineError,
            VertexFormat,
        },
        view::NoFrustumCulling,
    },
    window::PrimaryWindow,
};
use rayon::prelude::*;

const SHADER_ASSET_PATH: &str = "shaders/galaxy_points.wgsl";

pub const ATTRIBUTE_SCALE: MeshVertexAttribute =
    MeshVertexAttribute::new("PointScale", 988_540_917, VertexFormat::Float32);
pub const ATTRIBUTE_CORNER: MeshVertexAttribute =
    MeshVertexAttribute::new("PointCorner", 988_540_918, VertexFormat::Float32x2);

const QUAD_CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// Expands every point into a camera-facing quad. The vertex shader offsets the
/// four corners in clip space, so all of them carry the point's centre.
pub fn build_point_mesh(field: &PointField) -> Mesh {
    let positions: Vec<[f32; 3]> = field
        .positions()
        .par_iter()
        .flat_map_iter(|position| [*position; 4])
        .collect();
    let colors: Vec<[f32; 4]> = field
        .colors()
        .par_iter()
        .flat_map_iter(|[r, g, b]| [[*r, *g, *b, 1.0]; 4])
        .collect();
    let scales: Vec<f32> = field
        .scales()
        .par_iter()
        .flat_map_iter(|scale| [*scale; 4])
        .collect();
    let corners: Vec<[f32; 2]> = (0..field.len()).flat_map(|_| QUAD_CORNERS).collect();
    let indices: Vec<u32> = (0..field.len() as u32)
        .flat_map(|point| QUAD_INDICES.map(|i| point * 4 + i))
        .collect();

    // main world copy is kept so release can remove it explicitly
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_COLOR, colors)
        .with_inserted_attribute(ATTRIBUTE_SCALE, scales)
        .with_inserted_attribute(ATTRIBUTE_CORNER, corners)
        .with_inserted_indices(Indices::U32(indices))
}

#[derive(Component)]
pub struct GalaxyPoints;

/// Everything the renderer holds for one live point field.
#[derive(Debug)]
pub struct GalaxyPointsBuffer {
    pub entity: Entity,
    pub mesh: Handle<Mesh>,
    pub material: Handle<GalaxyPointsMaterial>,
    generation: i32,
}

#[derive(SystemParam)]
pub struct GalaxyPointsBackend<'w, 's> {
    commands: Commands<'w, 's>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<GalaxyPointsMaterial>>,
    galaxy_config: Res<'w, GalaxyConfig>,
    render_config: Res<'w, GalaxyRenderConfig>,
    time: Res<'w, Time>,
    windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
}

impl PointFieldBackend for GalaxyPointsBackend<'_, '_> {
    type Buffer = GalaxyPointsBuffer;

    fn upload(&mut self, field: &PointField, generation: i32) -> GalaxyPointsBuffer {
        if field.is_empty() {
            warn!("Galaxy generation {generation} has no points");
        }
        let scale_factor = self
            .windows
            .single()
            .map(Window::scale_factor)
            .unwrap_or(1.0);

        let mesh = self.meshes.add(build_point_mesh(field));
        let material = self.materials.add(GalaxyPointsMaterial {
            uniform: PointsUniform::read(
                &self.galaxy_config.params,
                &self.render_config,
                self.time.elapsed_secs(),
                scale_factor,
            ),
            alpha_mode: AlphaMode::Add,
        });

        let entity = self
            .commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::IDENTITY,
                Visibility::Inherited,
                GalaxyPoints,
                // points orbit in the vertex shader, outside the mesh bounds
                NoFrustumCulling,
                NotShadowCaster,
            ))
            .id();

        GalaxyPointsBuffer {
            entity,
            mesh,
            material,
            generation,
        }
    }

    fn release(&mut self, buffer: GalaxyPointsBuffer) -> Result<(), GalaxyError> {
        let generation = buffer.generation;
        self.commands.entity(buffer.entity).despawn();

        self.meshes
            .remove(&buffer.mesh)
            .ok_or(GalaxyError::ReleaseFailed {
                resource: "point mesh",
                generation,
            })?;
        self.materials
            .remove(&buffer.material)
            .ok_or(GalaxyError::ReleaseFailed {
                resource: "point material",
                generation,
            })?;
        Ok(())
    }
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct GalaxyPointsMaterial {
    #[uniform(0)]
    pub uniform: PointsUniform,
    pub alpha_mode: AlphaMode,
}

impl Material for GalaxyPointsMaterial {
    fn vertex_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn fragment_shader() -> ShaderRef {
        SHADER_ASSET_PATH.into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        self.alpha_mode
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        let vertex_layout = layout.0.get_layout(&[
            Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
            Mesh::ATTRIBUTE_COLOR.at_shader_location(1),
            ATTRIBUTE_SCALE.at_shader_location(2),
            ATTRIBUTE_CORNER.at_shader_location(3),
        ])?;
        descriptor.vertex.buffers = vec![vertex_layout];
        descriptor.primitive.cull_mode = None;
        if let Some(depth_stencil) = descriptor.depth_stencil.as_mut() {
            depth_stencil.depth_write_enabled = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::mesh::VertexAttributeValues;
    use rand::{rngs::StdRng, SeedableRng};

    fn small_field(count: u32) -> PointField {
        let params = GalaxyParameters { count, ..default() };
        PointField::generate(&params, &mut StdRng::seed_from_u64(4))
    }

    #[test]
    fn mesh_has_one_quad_per_point() {
        let field = small_field(250);
        let mesh = build_point_mesh(&field);

        assert_eq!(mesh.count_vertices(), 1000);
        assert_eq!(mesh.indices().map(Indices::len), Some(1500));
        for attribute in [
            Mesh::ATTRIBUTE_POSITION,
            Mesh::ATTRIBUTE_COLOR,
            ATTRIBUTE_SCALE,
            ATTRIBUTE_CORNER,
        ] {
            assert!(mesh.attribute(attribute).is_some());
        }
    }

    #[test]
    fn quad_vertices_share_point_attributes() {
        let field = small_field(3);
        let mesh = build_point_mesh(&field);

        let Some(VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("positions missing");
        };
        let Some(VertexAttributeValues::Float32(scales)) = mesh.attribute(ATTRIBUTE_SCALE) else {
            panic!("scales missing");
        };

        for (point, corners) in positions.chunks(4).enumerate() {
            assert!(corners.iter().all(|p| *p == field.positions()[point]));
        }
        for (point, corners) in scales.chunks(4).enumerate() {
            assert!(corners.iter().all(|s| *s == field.scales()[point]));
        }

        let Some(Indices::U32(indices)) = mesh.indices() else {
            panic!("indices missing");
        };
        assert_eq!(&indices[6..12], &[4, 5, 6, 4, 6, 7]);
    }
}
