use super::animation::AnimationClip;
use super::error::{Result, SceneError};

use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// position (3) + normal (3) + uv (2)
pub const FLOATS_PER_VERTEX: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    /// Plane in the XY plane facing +Z, `width_segments` by `height_segments`
    /// quads, UVs running left to right and bottom to top.
    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        let grid_x = width_segments.max(1);
        let grid_y = height_segments.max(1);
        let grid_x1 = grid_x + 1;
        let grid_y1 = grid_y + 1;
        let segment_width = width / grid_x as f32;
        let segment_height = height / grid_y as f32;

        let mut vertices = Vec::with_capacity((grid_x1 * grid_y1) as usize * FLOATS_PER_VERTEX);
        for iy in 0..grid_y1 {
            let y = height * 0.5 - iy as f32 * segment_height;
            for ix in 0..grid_x1 {
                let x = ix as f32 * segment_width - width * 0.5;
                vertices.extend_from_slice(&[
                    x,
                    y,
                    0.0,
                    0.0,
                    0.0,
                    1.0,
                    ix as f32 / grid_x as f32,
                    1.0 - iy as f32 / grid_y as f32,
                ]);
            }
        }

        let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
        for iy in 0..grid_y {
            for ix in 0..grid_x {
                let a = ix + grid_x1 * iy;
                let b = ix + grid_x1 * (iy + 1);
                let c = (ix + 1) + grid_x1 * (iy + 1);
                let d = (ix + 1) + grid_x1 * iy;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        Self {
            name: "plane".to_string(),
            vertices,
            indices,
        }
    }

    fn from_obj(mesh: &tobj::Mesh, name: String) -> Self {
        let count = mesh.positions.len() / 3;
        let normals = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            smooth_normals(&mesh.positions, &mesh.indices)
        };

        let mut vertices = Vec::with_capacity(count * FLOATS_PER_VERTEX);
        for i in 0..count {
            vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
            vertices.extend_from_slice(&normals[i * 3..i * 3 + 3]);
            match mesh.texcoords.get(i * 2..i * 2 + 2) {
                Some(uv) => vertices.extend_from_slice(uv),
                None => vertices.extend_from_slice(&[0.0, 0.0]),
            }
        }

        Self {
            name,
            vertices,
            indices: mesh.indices.clone(),
        }
    }
}

/// Area-weighted vertex normals for meshes that ship without them.
fn smooth_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let mut normals = vec![0.0f32; positions.len()];
    let vertex = |i: u32| {
        let i = i as usize * 3;
        [positions[i], positions[i + 1], positions[i + 2]]
    };

    for face in indices.chunks_exact(3) {
        let (a, b, c) = (vertex(face[0]), vertex(face[1]), vertex(face[2]));
        let ab = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
        let ac = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
        let n = [
            ab[1] * ac[2] - ab[2] * ac[1],
            ab[2] * ac[0] - ab[0] * ac[2],
            ab[0] * ac[1] - ab[1] * ac[0],
        ];
        for &index in face {
            let i = index as usize * 3;
            normals[i] += n[0];
            normals[i + 1] += n[1];
            normals[i + 2] += n[2];
        }
    }

    for n in normals.chunks_exact_mut(3) {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        if len > f32::EPSILON {
            n.iter_mut().for_each(|v| *v /= len);
        }
    }
    normals
}

#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub path: PathBuf,
    pub meshes: Vec<MeshData>,
    pub clips: Vec<AnimationClip>,
}

impl ModelAsset {
    pub fn load(path: &Path, clips: Vec<AnimationClip>) -> Result<Self> {
        let (models, _materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| SceneError::ObjLoad {
            path: path.to_path_buf(),
            source,
        })?;

        let meshes: Vec<MeshData> = models
            .iter()
            .filter(|m| !m.mesh.indices.is_empty())
            .map(|m| MeshData::from_obj(&m.mesh, m.name.clone()))
            .collect();

        if meshes.is_empty() {
            return Err(SceneError::EmptyModel(path.to_path_buf()));
        }

        Ok(Self {
            path: path.to_path_buf(),
            meshes,
            clips,
        })
    }
}

pub enum LoadPoll {
    Pending,
    Ready(ModelAsset),
    Failed(SceneError),
}

/// A model load running on a background thread. Resolves exactly once;
/// dropping it discards whatever the thread produces.
pub struct PendingModel {
    path: PathBuf,
    receiver: mpsc::Receiver<Result<ModelAsset>>,
}

impl PendingModel {
    pub fn spawn(path: PathBuf, clips: Vec<AnimationClip>) -> Self {
        let (tx, rx) = mpsc::channel();
        let thread_path = path.clone();

        std::thread::spawn(move || {
            let result = ModelAsset::load(&thread_path, clips);
            // The receiver is gone if the scene was switched or closed.
            let _ = tx.send(result);
        });

        log::info!("Loading model {:?}", path);
        Self { path, receiver: rx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll(&self) -> LoadPoll {
        match self.receiver.try_recv() {
            Ok(Ok(asset)) => LoadPoll::Ready(asset),
            Ok(Err(e)) => LoadPoll::Failed(e),
            Err(mpsc::TryRecvError::Empty) => LoadPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => LoadPoll::Failed(SceneError::LoaderDisconnected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn bundled_model() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("models/crystal.obj")
    }

    #[test]
    fn plane_matches_segment_counts() {
        let plane = MeshData::plane(5.0, 5.0, 50, 50);
        assert_eq!(plane.vertex_count(), 51 * 51);
        assert_eq!(plane.indices.len(), 50 * 50 * 6);
        assert!(plane.indices.iter().all(|&i| (i as usize) < plane.vertex_count()));

        // first vertex is the top-left corner
        assert_eq!(&plane.vertices[0..3], &[-2.5, 2.5, 0.0]);
        assert_eq!(&plane.vertices[6..8], &[0.0, 1.0]);
    }

    #[test]
    fn bundled_model_loads_with_normals() {
        let asset = ModelAsset::load(&bundled_model(), Vec::new()).unwrap();
        assert_eq!(asset.meshes.len(), 1);

        let mesh = &asset.meshes[0];
        assert_eq!(mesh.indices.len(), 16 * 3);
        for normal in mesh.vertices.chunks_exact(FLOATS_PER_VERTEX).map(|v| &v[3..6]) {
            let len = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn apex_normal_points_up() {
        let asset = ModelAsset::load(&bundled_model(), Vec::new()).unwrap();
        let top = asset.meshes[0]
            .vertices
            .chunks_exact(FLOATS_PER_VERTEX)
            .find(|v| v[1] > 89.0)
            .unwrap();
        assert!(top[4] > 0.99);
    }

    #[test]
    fn missing_model_is_an_error() {
        let err = ModelAsset::load(Path::new("does/not/exist.obj"), Vec::new()).unwrap_err();
        assert!(matches!(err, SceneError::ObjLoad { .. }));
    }

    #[test]
    fn pending_model_resolves_once() {
        let pending = PendingModel::spawn(bundled_model(), vec![AnimationClip::turntable("spin", 8.0)]);
        let deadline = Instant::now() + Duration::from_secs(10);

        let asset = loop {
            match pending.poll() {
                LoadPoll::Ready(asset) => break asset,
                LoadPoll::Pending if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(5)),
                LoadPoll::Pending => panic!("model load timed out"),
                LoadPoll::Failed(e) => panic!("model load failed: {e}"),
            }
        };
        assert_eq!(asset.clips.len(), 1);
        assert!(!matches!(pending.poll(), LoadPoll::Ready(_)));
    }

    #[test]
    fn failed_background_load_reports_the_parse_error_once() {
        let pending = PendingModel::spawn(PathBuf::from("does/not/exist.obj"), Vec::new());
        let deadline = Instant::now() + Duration::from_secs(10);

        let err = loop {
            match pending.poll() {
                LoadPoll::Failed(e) => break e,
                LoadPoll::Pending if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(5)),
                LoadPoll::Pending => panic!("model load timed out"),
                LoadPoll::Ready(_) => panic!("missing model loaded"),
            }
        };
        assert!(matches!(err, SceneError::ObjLoad { ref path, .. } if path.ends_with("exist.obj")));

        // the thread is done; nothing else arrives
        assert!(matches!(pending.poll(), LoadPoll::Failed(SceneError::LoaderDisconnected)));
    }

    #[test]
    fn dropped_loader_thread_is_a_disconnect() {
        let (tx, rx) = mpsc::channel::<Result<ModelAsset>>();
        let pending = PendingModel {
            path: bundled_model(),
            receiver: rx,
        };
        assert!(matches!(pending.poll(), LoadPoll::Pending));

        drop(tx);
        assert!(matches!(pending.poll(), LoadPoll::Failed(SceneError::LoaderDisconnected)));
    }
}
