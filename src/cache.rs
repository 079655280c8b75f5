//! 覆盖矩阵缓存
//!
//! Content-addressed memo of [CoverageMatrix] builds. The cache is an
//! explicit object handed to the reducers that want it; it is never global.
//! Concurrent callers asking for the same key wait for a single build.
//!
//! The per-key lock is reentrant. A build runs rayon jobs, and a rayon
//! worker waiting on them may pick up another request for the same key on
//! its own stack; that request builds again instead of blocking forever.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};

use crate::coverage_matrix::CoverageMatrix;
use crate::error::Result;
use crate::global_types::Pose;
use crate::providers::PointCloudProvider;
use crate::voxel_grid::VoxelGrid;

/// Grid parameters and input identities, floats kept as bit patterns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageKey {
    min_bound: [u64; 3],
    max_bound: [u64; 3],
    voxel_size: u64,
    point_clouds: Vec<PathBuf>,
    poses: Vec<[u64; 16]>,
}

impl CoverageKey {
    pub fn new(grid: &VoxelGrid, point_clouds: &[PointCloudProvider], poses: &[Pose]) -> Self {
        let bits = |p: &nalgebra::Point3<f64>| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
        Self {
            min_bound: bits(grid.min_bound()),
            max_bound: bits(grid.max_bound()),
            voxel_size: grid.voxel_size().to_bits(),
            point_clouds: point_clouds.iter().map(|p| p.path().to_path_buf()).collect(),
            poses: poses
                .iter()
                .map(|pose| {
                    let mut out = [0u64; 16];
                    for (o, v) in out.iter_mut().zip(pose.to_homogeneous().iter()) {
                        *o = v.to_bits();
                    }
                    out
                })
                .collect(),
        }
    }
}

type Slot = Arc<ReentrantMutex<RefCell<Option<Arc<CoverageMatrix>>>>>;

#[derive(Debug, Default)]
pub struct CoverageMatrixCache {
    slots: Mutex<HashMap<CoverageKey, Slot>>,
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: CoverageKey,
    matrix: CoverageMatrix,
}

impl CoverageMatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached matrix for these inputs, building it at most once.
    ///
    /// A failed build leaves the slot empty, so a later call retries.
    pub fn get_or_build(
        &self,
        grid: &VoxelGrid,
        point_clouds: &[PointCloudProvider],
        poses: &[Pose],
    ) -> Result<Arc<CoverageMatrix>> {
        let key = CoverageKey::new(grid, point_clouds, poses);
        let slot = self.slots.lock().entry(key).or_default().clone();
        // 同一个 key 只允许一个线程构建
        let guard = slot.lock();
        let cached = guard.borrow().clone();
        if let Some(matrix) = cached {
            log::debug!("coverage matrix cache hit");
            return Ok(matrix);
        }
        let matrix = Arc::new(CoverageMatrix::build(grid, point_clouds, poses)?);
        *guard.borrow_mut() = Some(matrix.clone());
        Ok(matrix)
    }

    /// Number of built entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.lock().borrow().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Writes every built entry as JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let entries: Vec<CacheEntry> = self
            .slots
            .lock()
            .iter()
            .filter_map(|(key, slot)| {
                let matrix = slot.lock().borrow().clone()?;
                Some(CacheEntry {
                    key: key.clone(),
                    matrix: matrix.as_ref().clone(),
                })
            })
            .collect();
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(file, &entries)?;
        log::info!("saved {} coverage matrices to {:?}", entries.len(), path);
        Ok(())
    }

    /// Reads a snapshot written by [CoverageMatrixCache::save_json].
    pub fn load_json(path: &Path) -> Result<Self> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let entries: Vec<CacheEntry> = serde_json::from_reader(file)?;
        let slots = entries
            .into_iter()
            .map(|entry| {
                let slot: Slot = Arc::new(ReentrantMutex::new(RefCell::new(Some(Arc::new(
                    entry.matrix,
                )))));
                (entry.key, slot)
            })
            .collect();
        Ok(Self {
            slots: Mutex::new(slots),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;
    use crate::error::VprError;
    use crate::point_cloud::PointCloud;
    use crate::providers::PointCloudLoader;
    use crate::test_data;

    /// Counts how many times the payload is read.
    struct CountingLoader {
        cloud: PointCloud,
        reads: Arc<AtomicUsize>,
    }

    impl PointCloudLoader for CountingLoader {
        fn load(&self, _path: &Path) -> Result<PointCloud> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.cloud.clone())
        }
    }

    #[test]
    fn test_build_once_under_concurrency() {
        let reads = Arc::new(AtomicUsize::new(0));
        let provider = PointCloudProvider::new(
            "counted.xyz",
            Arc::new(CountingLoader {
                cloud: test_data::lattice_cloud(5),
                reads: reads.clone(),
            }),
        );
        let providers = vec![provider];
        let poses = vec![Pose::identity()];
        let grid = VoxelGrid::new(
            nalgebra::Point3::origin(),
            nalgebra::Point3::new(5.0, 1.0, 1.0),
            1.0,
        )
        .unwrap();
        let cache = CoverageMatrixCache::new();

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let m = cache.get_or_build(&grid, &providers, &poses).unwrap();
                    assert_eq!(m.num_voxels(), 5);
                });
            }
        });
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        // 不同的体素大小是不同的 key
        let coarse = VoxelGrid::new(*grid.min_bound(), *grid.max_bound(), 2.5).unwrap();
        cache.get_or_build(&coarse, &providers, &poses).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    /// Asks the cache for the same key from inside the build, the way a
    /// rayon worker does when it picks up a sibling task while waiting.
    struct NestedLoader {
        cache: Arc<CoverageMatrixCache>,
        grid: VoxelGrid,
        nested: AtomicBool,
    }

    impl PointCloudLoader for NestedLoader {
        fn load(&self, path: &Path) -> Result<PointCloud> {
            if !self.nested.swap(true, Ordering::SeqCst) {
                let same_key = vec![PointCloudProvider::in_memory(
                    path.to_path_buf(),
                    test_data::lattice_cloud(5),
                )];
                let inner = self
                    .cache
                    .get_or_build(&self.grid, &same_key, &[Pose::identity()])?;
                assert_eq!(inner.num_voxels(), 5);
            }
            Ok(test_data::lattice_cloud(5))
        }
    }

    #[test]
    fn test_nested_request_on_building_thread() {
        let grid = VoxelGrid::new(
            nalgebra::Point3::origin(),
            nalgebra::Point3::new(5.0, 1.0, 1.0),
            1.0,
        )
        .unwrap();
        let cache = Arc::new(CoverageMatrixCache::new());
        let providers = vec![PointCloudProvider::new(
            "nested.xyz",
            Arc::new(NestedLoader {
                cache: cache.clone(),
                grid,
                nested: AtomicBool::new(false),
            }),
        )];
        // 单线程池: 构建和嵌套请求都在同一个 worker 上
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap();
        let matrix = pool
            .install(|| cache.get_or_build(&grid, &providers, &[Pose::identity()]))
            .unwrap();
        assert_eq!(matrix.num_voxels(), 5);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let db = test_data::line_database(&[0.0, 1.0]);
        let grid = VoxelGrid::from_bounds(&db.bounds().unwrap(), 1.0).unwrap();
        let cache = CoverageMatrixCache::new();
        let err = cache.get_or_build(&grid, db.point_clouds(), &db.trajectory()[..1]);
        assert!(matches!(err, Err(VprError::ShapeMismatch { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_json_snapshot() {
        let db = test_data::overlap_scene();
        let grid = VoxelGrid::from_bounds(&db.bounds().unwrap(), 1.0).unwrap();
        let cache = CoverageMatrixCache::new();
        let built = cache
            .get_or_build(&grid, db.point_clouds(), db.trajectory())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("coverage_cache.json");
        cache.save_json(&path).unwrap();
        let restored = CoverageMatrixCache::load_json(&path).unwrap();
        assert_eq!(restored.len(), 1);
        let hit = restored
            .get_or_build(&grid, db.point_clouds(), db.trajectory())
            .unwrap();
        assert_eq!(*hit, *built);
    }
}
