use crate::app::SceneApp;
use super::error::{Result, SceneError};

use glow::HasContext as _;

impl SceneApp {
    pub fn export_image(&self) {
        let [width, height] = self.export_resolution;
        log::info!("Exporting image at {}x{}", width, height);

        let pixels = match self.render_frame_to_buffer(width, height) {
            Ok(pixels) => pixels,
            Err(e) => {
                log::error!("Image export failed: {}", e);
                return;
            }
        };

        // Save on a worker thread so the dialog does not block the frame loop
        std::thread::spawn(move || {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("PNG Image", &["png"])
                .set_file_name("scene_export.png")
                .save_file()
            {
                match image::save_buffer(&path, &pixels, width, height, image::ColorType::Rgba8) {
                    Ok(_) => log::info!("Image exported successfully to {:?}", path),
                    Err(e) => log::error!("Failed to save image: {}", e),
                }
            }
        });
    }

    /// Renders the current frame offscreen and returns top-down RGBA rows.
    pub fn render_frame_to_buffer(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        let frame = self.scene.snapshot().with_target_size(width, height);
        let gl = &*self.gl;

        // SAFETY: Offscreen targets are created, used and deleted with the
        // app's context, which is current during `update`.
        unsafe {
            let fbo = gl.create_framebuffer().map_err(SceneError::Gl)?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));

            let texture = match gl.create_texture() {
                Ok(texture) => texture,
                Err(e) => {
                    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    gl.delete_framebuffer(fbo);
                    return Err(SceneError::Gl(e));
                }
            };
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D, 0, glow::RGBA as i32,
                width as i32, height as i32, 0,
                glow::RGBA, glow::UNSIGNED_BYTE, None,
            );
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
            gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER, glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D, Some(texture), 0,
            );

            let depth = match gl.create_renderbuffer() {
                Ok(depth) => depth,
                Err(e) => {
                    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    gl.delete_texture(texture);
                    gl.delete_framebuffer(fbo);
                    return Err(SceneError::Gl(e));
                }
            };
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT24, width as i32, height as i32);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER, glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER, Some(depth),
            );

            let cleanup = |gl: &glow::Context| {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                gl.bind_renderbuffer(glow::RENDERBUFFER, None);
                gl.bind_texture(glow::TEXTURE_2D, None);
                gl.delete_renderbuffer(depth);
                gl.delete_texture(texture);
                gl.delete_framebuffer(fbo);
            };

            if gl.check_framebuffer_status(glow::FRAMEBUFFER) != glow::FRAMEBUFFER_COMPLETE {
                cleanup(gl);
                return Err(SceneError::Gl("export framebuffer is not complete".into()));
            }

            gl.disable(glow::SCISSOR_TEST);
            gl.viewport(0, 0, width as i32, height as i32);
            self.renderer.lock().paint(gl, &frame);

            let mut pixels = vec![0u8; (width * height * 4) as usize];
            gl.read_pixels(
                0, 0, width as i32, height as i32,
                glow::RGBA, glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(&mut pixels),
            );

            cleanup(gl);
            Ok(flip_rows(&pixels, width, height))
        }
    }
}

/// GL reads bottom-up; images are stored top-down.
pub fn flip_rows(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row_size = (width * 4) as usize;
    let mut flipped = Vec::with_capacity(data.len());
    for row in data.chunks_exact(row_size).take(height as usize).rev() {
        flipped.extend_from_slice(row);
    }
    flipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_rows_reverses_row_order() {
        // 1x3 image, one RGBA pixel per row
        let data = [1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3];
        assert_eq!(flip_rows(&data, 1, 3), vec![3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1]);
    }
}
