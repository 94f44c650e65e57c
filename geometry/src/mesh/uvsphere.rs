use std::f32::consts::{FRAC_PI_2, PI, TAU};

use mesh_core::{
    mesh::{builder::MeshBuilder, Mesh, NORMAL_PROPERTY, TEXCOORD_PROPERTY},
    types::{Vec2f, Vec3f},
};

use crate::GeometryError;

/// Parameters of a UV sphere or hemisphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    pub radius: f32,
    /// Slices around the y axis.
    pub radial_segments: u32,
    /// Stacks from pole to pole. A hemisphere uses half of them.
    pub vertical_segments: u32,
    pub inward_normals: bool,
    pub hemisphere: bool,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            radius: 1f32,
            radial_segments: 16,
            vertical_segments: 8,
            inward_normals: false,
            hemisphere: false,
        }
    }
}

impl SphereParams {
    pub const MIN_RADIAL_SEGMENTS: u32 = 3;
    pub const MIN_VERTICAL_SEGMENTS: u32 = 2;

    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.radius.is_finite() || self.radius <= 0f32 {
            return Err(GeometryError::invalid(
                "radius",
                format!("must be a positive finite number, got {}", self.radius),
            ));
        }
        if self.radial_segments < Self::MIN_RADIAL_SEGMENTS {
            return Err(GeometryError::invalid(
                "radial_segments",
                format!(
                    "must be at least {}, got {}",
                    Self::MIN_RADIAL_SEGMENTS,
                    self.radial_segments
                ),
            ));
        }
        if self.vertical_segments < Self::MIN_VERTICAL_SEGMENTS {
            return Err(GeometryError::invalid(
                "vertical_segments",
                format!(
                    "must be at least {}, got {}",
                    Self::MIN_VERTICAL_SEGMENTS,
                    self.vertical_segments
                ),
            ));
        }
        let vertices = (self.radial_segments as u64 + 1) * (self.bands() as u64 + 1);
        if vertices > u32::MAX as u64 {
            return Err(GeometryError::invalid(
                "radial_segments",
                format!("{} vertices do not fit 32 bit indices", vertices),
            ));
        }
        let indices = self.radial_segments as u64 * self.bands() as u64 * 6;
        if indices > u32::MAX as u64 {
            return Err(GeometryError::invalid(
                "radial_segments",
                format!("{} indices exceed the 32 bit index count", indices),
            ));
        }
        Ok(())
    }

    /// Latitude bands actually tessellated.
    pub fn bands(&self) -> u32 {
        if self.hemisphere {
            (self.vertical_segments / 2).max(1)
        } else {
            self.vertical_segments
        }
    }

    pub fn vertex_count(&self) -> usize {
        (self.radial_segments as usize + 1) * (self.bands() as usize + 1)
    }

    pub fn triangle_count(&self) -> usize {
        self.radial_segments as usize * self.bands() as usize * 2
    }
}

// sin/cos of the polar angle of ring `i`, exact at the poles and the hemisphere rim
fn ring_sin_cos(i: u32, bands: u32, hemisphere: bool) -> (f32, f32) {
    if i == 0 {
        (0f32, 1f32)
    } else if i == bands {
        if hemisphere {
            (1f32, 0f32)
        } else {
            (0f32, -1f32)
        }
    } else {
        let sweep = if hemisphere { FRAC_PI_2 } else { PI };
        (i as f32 / bands as f32 * sweep).sin_cos()
    }
}

fn column_sin_cos(j: u32, segments: u32) -> (f32, f32) {
    if j == 0 || j == segments {
        (0f32, 1f32)
    } else {
        (j as f32 / segments as f32 * TAU).sin_cos()
    }
}

#[derive(Default)]
pub struct UVSphereBuilder {
    normal: bool,
    texcoord: bool,
    params: SphereParams,
}

impl UVSphereBuilder {
    pub fn from_params(params: SphereParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn enable_normal(mut self) -> Self {
        self.normal = true;
        self
    }

    pub fn enable_texcoord(mut self) -> Self {
        self.texcoord = true;
        self
    }

    pub fn set_radius(mut self, radius: f32) -> Self {
        self.params.radius = radius;
        self
    }

    // u: slices: xz
    // v: stacks: y
    pub fn set_segments(mut self, u: u32, v: u32) -> Self {
        self.params.radial_segments = u;
        self.params.vertical_segments = v;
        self
    }

    pub fn inward_normals(mut self, inward: bool) -> Self {
        self.params.inward_normals = inward;
        self
    }

    pub fn hemisphere(mut self, hemisphere: bool) -> Self {
        self.params.hemisphere = hemisphere;
        self
    }

    pub fn params(&self) -> &SphereParams {
        &self.params
    }

    pub fn build(self) -> Result<Mesh, GeometryError> {
        let params = self.params;
        params.validate()?;

        let segments = params.radial_segments;
        let bands = params.bands();
        let columns = segments + 1;

        let mut vertices = Vec::with_capacity(params.vertex_count());
        let mut normals = Vec::with_capacity(params.vertex_count());
        let mut texcoords = Vec::with_capacity(params.vertex_count());

        for i in 0..=bands {
            let (sin_t, cos_t) = ring_sin_cos(i, bands, params.hemisphere);
            let v = i as f32 / bands as f32;
            for j in 0..=segments {
                let (sin_p, cos_p) = column_sin_cos(j, segments);
                let dir = Vec3f::new(sin_t * cos_p, cos_t, sin_t * sin_p);

                vertices.push(dir * params.radius);
                normals.push(if params.inward_normals { -dir } else { dir });
                texcoords.push(Vec2f::new(j as f32 / segments as f32, v));
            }
        }

        // a-c
        // | |
        // b-d
        let mut indices = Vec::with_capacity(params.triangle_count() * 3);
        for i in 0..bands {
            for j in 0..segments {
                let a = i * columns + j;
                let b = a + columns;
                let c = a + 1;
                let d = b + 1;
                if params.inward_normals {
                    indices.extend_from_slice(&[a, b, c, c, b, d]);
                } else {
                    indices.extend_from_slice(&[a, c, b, c, d, b]);
                }
            }
        }

        let mut builder = MeshBuilder::new();
        let mesh_err = |e: anyhow::Error| GeometryError::Mesh(format!("{:#}", e));
        if self.normal {
            builder.add_property(NORMAL_PROPERTY).map_err(mesh_err)?;
        }
        if self.texcoord {
            builder.add_property(TEXCOORD_PROPERTY).map_err(mesh_err)?;
        }

        builder.add_position_vertices3(&vertices);
        if vertices.len() <= u16::MAX as usize + 1 {
            let indices: Vec<u16> = indices.iter().map(|i| *i as u16).collect();
            builder.add_indices16(&indices).map_err(mesh_err)?;
        } else {
            builder.add_indices32(&indices).map_err(mesh_err)?;
        }

        if self.normal {
            builder
                .add_property_vertices(NORMAL_PROPERTY, &normals)
                .map_err(mesh_err)?;
        }
        if self.texcoord {
            builder
                .add_property_vertices(TEXCOORD_PROPERTY, &texcoords)
                .map_err(mesh_err)?;
        }

        let mesh = builder.build().map_err(mesh_err)?;
        log::debug!(
            "uv sphere {:?}: {} vertices, {} triangles",
            params,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(mesh)
    }
}
