//! Triangular-prism strips written into fixed-size buffers
//!
//! Each subray becomes one strip: a triangle cross-section at every leaf
//! endpoint, consecutive cross-sections joined by the three side quads of a
//! prism (no caps). Buffers are sized once for the worst case and only the
//! cursors move between frames.

use crate::error::Result;
use crate::segment::Segment;
use glam::Vec3;
use std::io::Write;

/// Vertices per cross-section
pub const VERTICES_PER_SECTION: usize = 3;

/// Indices per prism (two triangles per side)
pub const INDICES_PER_PRISM: usize = 18;

const COS30: f32 = 0.866_025_4;
const SIN30: f32 = 0.5;

/// Faces of a prism, relative to the first vertex of the previous section
const PRISM_FACES: [u32; INDICES_PER_PRISM] = [
    1, 2, 5, 1, 5, 4, //
    0, 1, 4, 0, 4, 3, //
    2, 0, 3, 2, 3, 5,
];

/// `v` coordinate of the three vertices of a cross-section
const SECTION_V: [f32; VERTICES_PER_SECTION] = [0.0, 0.5, 1.0];

/// Flat vertex, index and optional UV buffers with write cursors
#[derive(Debug, Clone)]
pub struct MeshBuffers {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    uvs: Option<Vec<f32>>,
    vertex_count: usize,
    index_count: usize,
    strip_open: bool,
}

impl MeshBuffers {
    /// Allocate room for `max_vertices` vertices and `max_indices` indices
    pub fn with_capacity(max_vertices: usize, max_indices: usize, generate_uvs: bool) -> Self {
        Self {
            vertices: vec![0.0; max_vertices * 3],
            indices: vec![0; max_indices],
            uvs: generate_uvs.then(|| vec![0.0; max_vertices * 2]),
            vertex_count: 0,
            index_count: 0,
            strip_open: false,
        }
    }

    /// Worst-case buffers for `max_subrays` strips of `2^max_iterations` prisms
    pub fn for_bolt(max_iterations: u32, max_subrays: usize, generate_uvs: bool) -> Self {
        let prisms = 1usize << max_iterations;
        Self::with_capacity(
            VERTICES_PER_SECTION * (prisms + 1) * max_subrays,
            INDICES_PER_PRISM * prisms * max_subrays,
            generate_uvs,
        )
    }

    /// Rewind the cursors; stale data past them is ignored
    pub fn reset(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
        self.strip_open = false;
    }

    /// Start a new strip; the next prism also emits its start section
    pub fn begin_strip(&mut self) {
        self.strip_open = false;
    }

    /// Append the prism for `segment` to the current strip
    ///
    /// Returns false, leaving the buffers untouched, if it does not fit.
    pub fn push_prism(&mut self, segment: &Segment) -> bool {
        let sections = if self.strip_open { 1 } else { 2 };
        let needed_vertices = sections * VERTICES_PER_SECTION;
        let fits = (self.vertex_count + needed_vertices) * 3 <= self.vertices.len()
            && self.index_count + INDICES_PER_PRISM <= self.indices.len();
        if !fits {
            debug_assert!(
                false,
                "mesh buffer overflow: {} vertices, {} indices used",
                self.vertex_count, self.index_count
            );
            return false;
        }

        let forward = (segment.pos1 - segment.pos0).normalize_or(Vec3::Z);

        if !self.strip_open {
            self.push_section(
                segment.pos0,
                segment.up0,
                forward,
                segment.radius0,
                segment.fraction0,
            );
            self.strip_open = true;
        }
        self.push_section(
            segment.pos1,
            segment.up0,
            forward,
            segment.radius1,
            segment.fraction1,
        );

        let base = (self.vertex_count - 2 * VERTICES_PER_SECTION) as u32;
        let end = self.index_count + INDICES_PER_PRISM;
        for (slot, offset) in self.indices[self.index_count..end]
            .iter_mut()
            .zip(PRISM_FACES)
        {
            *slot = base + offset;
        }
        self.index_count = end;

        true
    }

    fn push_section(&mut self, pos: Vec3, up: Vec3, forward: Vec3, radius: f32, u: f32) {
        let side = up.cross(forward) * (radius * COS30);
        let down = up * (-radius * SIN30);
        let corners = [pos - side + down, pos + side + down, pos + up * radius];

        let start = self.vertex_count * 3;
        for (chunk, corner) in self.vertices[start..start + 9].chunks_exact_mut(3).zip(corners) {
            chunk.copy_from_slice(&corner.to_array());
        }

        if let Some(uvs) = &mut self.uvs {
            let start = self.vertex_count * 2;
            for (chunk, v) in uvs[start..start + 6].chunks_exact_mut(2).zip(SECTION_V) {
                chunk[0] = u;
                chunk[1] = v;
            }
        }

        self.vertex_count += VERTICES_PER_SECTION;
    }

    /// Valid vertex coordinates, 3 floats per vertex
    pub fn vertices(&self) -> &[f32] {
        &self.vertices[..self.vertex_count * 3]
    }

    /// Valid indices (the draw range)
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.index_count]
    }

    /// Valid UVs, 2 floats per vertex, when enabled
    pub fn uvs(&self) -> Option<&[f32]> {
        self.uvs.as_deref().map(|uvs| &uvs[..self.vertex_count * 2])
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }

    /// Vertex capacity
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Index capacity
    pub fn index_capacity(&self) -> usize {
        self.indices.len()
    }

    /// Write the valid range as a Wavefront OBJ object
    pub fn write_obj<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "# fractal-bolt mesh")?;
        writeln!(
            writer,
            "# {} vertices, {} triangles",
            self.vertex_count,
            self.triangle_count()
        )?;
        writeln!(writer, "o bolt")?;

        for v in self.vertices().chunks_exact(3) {
            writeln!(writer, "v {} {} {}", v[0], v[1], v[2])?;
        }

        let uvs = self.uvs();
        if let Some(uvs) = uvs {
            for uv in uvs.chunks_exact(2) {
                writeln!(writer, "vt {} {}", uv[0], uv[1])?;
            }
        }

        for tri in self.indices().chunks_exact(3) {
            let (a, b, c) = (tri[0] + 1, tri[1] + 1, tri[2] + 1);
            if uvs.is_some() {
                writeln!(writer, "f {a}/{a} {b}/{b} {c}/{c}")?;
            } else {
                writeln!(writer, "f {a} {b} {c}")?;
            }
        }

        Ok(())
    }
}
