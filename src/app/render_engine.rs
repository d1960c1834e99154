use super::data::{UniformMap, UniformValue};
use super::error::{Result, SceneError};
use super::model::{FLOATS_PER_VERTEX, MeshData};
use super::scene::FrameSnapshot;
use super::shader::ShaderSources;

use egui_glow::{ShaderVersion, glow};
use glow::HasContext as _;

const POSITION_LOCATION: u32 = 0;
const NORMAL_LOCATION: u32 = 1;
const UV_LOCATION: u32 = 2;

const VERTEX_PRELUDE: &str = r#"
uniform mat4 modelMatrix;
uniform mat4 viewMatrix;
uniform mat4 projectionMatrix;
uniform mat4 modelViewMatrix;

in vec3 position;
in vec3 normal;
in vec2 uv;
"#;

fn header(version: &ShaderVersion) -> String {
    let precision = if matches!(version, ShaderVersion::Es100 | ShaderVersion::Es300) {
        "precision highp float;\n"
    } else {
        ""
    };
    format!("{}\n{}", version.version_declaration(), precision)
}

/// Mesh buffers living on the GPU.
pub struct GpuMesh {
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    index_buffer: glow::Buffer,
    index_count: i32,
}

impl GpuMesh {
    pub fn upload(gl: &glow::Context, mesh: &MeshData) -> Result<Self> {
        let stride = (FLOATS_PER_VERTEX * std::mem::size_of::<f32>()) as i32;

        // SAFETY: Buffers are created and filled with a valid context; the
        // attribute layout matches FLOATS_PER_VERTEX.
        unsafe {
            let vertex_array = gl.create_vertex_array().map_err(SceneError::Gl)?;
            gl.bind_vertex_array(Some(vertex_array));

            let vertex_buffer = gl.create_buffer().map_err(SceneError::Gl)?;
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(&mesh.vertices),
                glow::STATIC_DRAW,
            );

            let index_buffer = gl.create_buffer().map_err(SceneError::Gl)?;
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(&mesh.indices),
                glow::STATIC_DRAW,
            );

            let attributes = [(POSITION_LOCATION, 3, 0), (NORMAL_LOCATION, 3, 3), (UV_LOCATION, 2, 6)];
            for (location, size, offset) in attributes {
                gl.enable_vertex_attrib_array(location);
                gl.vertex_attrib_pointer_f32(
                    location,
                    size,
                    glow::FLOAT,
                    false,
                    stride,
                    offset * std::mem::size_of::<f32>() as i32,
                );
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            Ok(Self {
                vertex_array,
                vertex_buffer,
                index_buffer,
                index_count: mesh.indices.len() as i32,
            })
        }
    }

    fn draw(&self, gl: &glow::Context) {
        // SAFETY: The vertex array and its buffers belong to this context.
        unsafe {
            gl.bind_vertex_array(Some(self.vertex_array));
            gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
        }
    }

    fn destroy(&self, gl: &glow::Context) {
        // SAFETY: Deleting resources created with the same context.
        unsafe {
            gl.delete_vertex_array(self.vertex_array);
            gl.delete_buffer(self.vertex_buffer);
            gl.delete_buffer(self.index_buffer);
        }
    }
}

fn compile_program(gl: &glow::Context, sources: &ShaderSources) -> Result<glow::Program> {
    let shader_version = ShaderVersion::get(gl);
    let header = header(&shader_version);

    // SAFETY: All OpenGL calls are made with a valid context.
    // Every object created on a failure path is deleted before returning.
    unsafe {
        let program = gl.create_program().map_err(SceneError::Gl)?;

        let shader_sources = [
            (glow::VERTEX_SHADER, "vertex", format!("{header}{VERTEX_PRELUDE}\n{}", sources.vertex)),
            (glow::FRAGMENT_SHADER, "fragment", format!("{header}\n{}", sources.fragment)),
        ];

        let mut shaders = Vec::with_capacity(shader_sources.len());

        for (shader_type, stage, source) in shader_sources.iter() {
            let shader = match gl.create_shader(*shader_type) {
                Ok(shader) => shader,
                Err(e) => {
                    for prev_shader in shaders {
                        gl.detach_shader(program, prev_shader);
                        gl.delete_shader(prev_shader);
                    }
                    gl.delete_program(program);
                    return Err(SceneError::Gl(e));
                }
            };

            gl.shader_source(shader, source);
            gl.compile_shader(shader);

            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                gl.delete_shader(shader);
                for prev_shader in shaders {
                    gl.detach_shader(program, prev_shader);
                    gl.delete_shader(prev_shader);
                }
                gl.delete_program(program);
                return Err(SceneError::ShaderCompile { stage: *stage, log });
            }

            gl.attach_shader(program, shader);
            shaders.push(shader);
        }

        gl.bind_attrib_location(program, POSITION_LOCATION, "position");
        gl.bind_attrib_location(program, NORMAL_LOCATION, "normal");
        gl.bind_attrib_location(program, UV_LOCATION, "uv");

        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        let link_log = if linked { String::new() } else { gl.get_program_info_log(program) };

        for shader in shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }

        if !linked {
            gl.delete_program(program);
            return Err(SceneError::ShaderLink(link_log));
        }

        Ok(program)
    }
}

/// One shader material plus the meshes it is applied to.
pub struct SceneRenderer {
    program: glow::Program,
    meshes: Vec<GpuMesh>,
}

impl SceneRenderer {
    pub fn new(gl: &glow::Context, sources: &ShaderSources) -> Result<Self> {
        Ok(Self {
            program: compile_program(gl, sources)?,
            meshes: Vec::new(),
        })
    }

    /// Swaps in a new program. On failure the current program stays.
    pub fn replace_program(&mut self, gl: &glow::Context, sources: &ShaderSources) -> Result<()> {
        let program = compile_program(gl, sources)?;
        // SAFETY: The old program was created with this context.
        unsafe { gl.delete_program(self.program) };
        self.program = program;
        Ok(())
    }

    /// Replaces every mesh. The material is shared by all of them.
    pub fn set_meshes(&mut self, gl: &glow::Context, meshes: &[MeshData]) -> Result<()> {
        let mut uploaded = Vec::with_capacity(meshes.len());
        for mesh in meshes {
            match GpuMesh::upload(gl, mesh) {
                Ok(gpu_mesh) => uploaded.push(gpu_mesh),
                Err(e) => {
                    uploaded.iter().for_each(|m| m.destroy(gl));
                    return Err(e);
                }
            }
        }

        self.clear_meshes(gl);
        self.meshes = uploaded;
        Ok(())
    }

    pub fn clear_meshes(&mut self, gl: &glow::Context) {
        for mesh in self.meshes.drain(..) {
            mesh.destroy(gl);
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        self.clear_meshes(gl);
        // SAFETY: Deleting resources that were created with the same context.
        // This is called during cleanup when the context is still valid.
        unsafe { gl.delete_program(self.program) };
    }

    /// Draws into the current viewport. Inside an egui paint callback that is
    /// the canvas rect, with scissoring already set to it.
    pub fn paint(&self, gl: &glow::Context, frame: &FrameSnapshot) {
        let view = frame.camera.view();
        let projection = frame.camera.projection();
        let model_view = view * frame.model;

        // SAFETY: Rendering with a valid OpenGL context and program.
        // Uniform locations are queried before use.
        unsafe {
            let [r, g, b] = frame.clear_color;
            gl.clear_color(r, g, b, 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.disable(glow::BLEND);

            gl.use_program(Some(self.program));

            let matrices = [
                ("modelMatrix", frame.model),
                ("viewMatrix", view),
                ("projectionMatrix", projection),
                ("modelViewMatrix", model_view),
            ];
            for (name, matrix) in matrices {
                if let Some(loc) = gl.get_uniform_location(self.program, name) {
                    let columns: &[f32; 16] = matrix.as_ref();
                    gl.uniform_matrix_4_f32_slice(Some(&loc), false, columns);
                }
            }

            self.set_uniforms(gl, &frame.uniforms);

            for mesh in &self.meshes {
                mesh.draw(gl);
            }

            gl.bind_vertex_array(None);
            gl.disable(glow::DEPTH_TEST);
        }
    }

    fn set_uniforms(&self, gl: &glow::Context, uniforms: &UniformMap) {
        // SAFETY: Called from `paint` with this program bound.
        unsafe {
            for (name, value) in uniforms.iter() {
                let Some(loc) = gl.get_uniform_location(self.program, name) else {
                    // Optimised out by the driver or never declared.
                    continue;
                };
                match value {
                    UniformValue::Float(val) => gl.uniform_1_f32(Some(&loc), *val),
                    UniformValue::Int(val) => gl.uniform_1_i32(Some(&loc), *val),
                    UniformValue::Vec2(vals) => gl.uniform_2_f32(Some(&loc), vals[0], vals[1]),
                    UniformValue::Vec3(vals) => gl.uniform_3_f32(Some(&loc), vals[0], vals[1], vals[2]),
                }
            }
        }
    }
}
