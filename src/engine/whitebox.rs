use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use gdal::spatial_ref::SpatialRef;
use gdal::vector::{Geometry as OgrGeometry, LayerAccess, LayerOptions};
use gdal::{Dataset, DriverManager};
use gdal_sys::OGRwkbGeometryType;
use ndarray::Array2;
use tracing::debug;

use super::{EngineError, VisibilityEngine};
use crate::io::raster::{Terrain, TerrainSource};
use crate::io::writers::tiff::write_tiff_f32;
use crate::types::{Point, VisibilityMask};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the WhiteboxTools `Viewshed` tool as a subprocess, one call per observer
#[derive(Debug, Clone)]
pub struct WhiteboxViewshed {
    executable: PathBuf,
}

impl Default for WhiteboxViewshed {
    fn default() -> Self {
        Self::new("whitebox_tools")
    }
}

impl WhiteboxViewshed {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(
        &self,
        workdir: &Path,
        dem: &Path,
        stations: &Path,
        output: &Path,
        height: f64,
    ) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("--run=Viewshed")
            .arg(format!("--wd={}", workdir.display()))
            .arg(format!("--dem={}", dem.display()))
            .arg(format!("--stations={}", stations.display()))
            .arg(format!("--output={}", output.display()))
            .arg(format!("--height={}", height))
            .arg("-v=false");
        cmd
    }
}

/// Single-point station shapefile in the terrain CRS.
fn write_station(path: &Path, observer: Point, projection: &str) -> Result<(), EngineError> {
    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")?;
    let mut ds = driver.create_vector_only(path)?;
    let srs = if projection.is_empty() {
        None
    } else {
        Some(SpatialRef::from_wkt(projection)?)
    };
    let mut layer = ds.create_layer(LayerOptions {
        name: "station",
        srs: srs.as_ref(),
        ty: OGRwkbGeometryType::wkbPoint,
        options: None,
    })?;
    let geom = OgrGeometry::from_wkt(&format!("POINT ({} {})", observer.x, observer.y))?;
    layer.create_feature(geom)?;
    Ok(())
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> Result<ExitStatus, EngineError> {
    let Some(limit) = timeout else {
        return Ok(child.wait()?);
    };
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if Instant::now() >= deadline {
            // Already-exited races surface as an error from kill; the timeout still stands
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Timeout(limit));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Cells with a positive value are visible; zero, negative and NaN are not.
fn read_mask(path: &Path, expected: (usize, usize)) -> Result<VisibilityMask, EngineError> {
    let dataset = Dataset::open(path)?;
    let (size_x, size_y) = dataset.raster_size();
    let actual = (size_y as usize, size_x as usize);
    if actual != expected {
        return Err(EngineError::ShapeMismatch { expected, actual });
    }
    let (rows, cols) = actual;
    let band = dataset.rasterband(1)?;
    let buf = band.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
    let visible: Vec<bool> = buf.data().iter().map(|&v| v > 0.0).collect();
    Array2::from_shape_vec(actual, visible)
        .map_err(|_| EngineError::ShapeMismatch { expected, actual })
}

/// DEM path handed to the tool. WhiteboxTools resolves bare file names against
/// `--wd`, so on-disk DEMs are passed absolute; in-memory ones are staged there.
fn stage_dem(terrain: &Terrain, workdir: &Path) -> Result<PathBuf, EngineError> {
    match &terrain.source {
        TerrainSource::File(path) => Ok(std::path::absolute(path)?),
        TerrainSource::InMemory(elevation) => {
            let path = workdir.join("dem.tif");
            write_tiff_f32(&path, &terrain.grid, &terrain.projection, elevation, None).map_err(
                |e| EngineError::Unavailable(format!("cannot stage in-memory DEM: {}", e)),
            )?;
            Ok(path)
        }
    }
}

impl VisibilityEngine for WhiteboxViewshed {
    fn name(&self) -> &str {
        "whitebox-viewshed"
    }

    fn visibility(
        &self,
        terrain: &Terrain,
        observer: Point,
        observer_height: f64,
        timeout: Option<Duration>,
    ) -> Result<VisibilityMask, EngineError> {
        let tmp = tempfile::Builder::new().prefix("fuzzyview-wbt-").tempdir()?;
        let workdir = tmp.path();

        let dem = stage_dem(terrain, workdir)?;
        let stations = workdir.join("station.shp");
        write_station(&stations, observer, &terrain.projection)?;
        let output = workdir.join("viewshed.tif");
        let stderr_path = workdir.join("stderr.log");

        let mut cmd = self.command(workdir, &dem, &stations, &output, observer_height);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(File::create(&stderr_path)?);
        debug!("Running {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                EngineError::Unavailable(format!("{} not found", self.executable.display()))
            }
            _ => EngineError::Io(e),
        })?;
        let status = wait_with_timeout(&mut child, timeout)?;
        if !status.success() {
            let stderr = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(EngineError::Failed {
                status: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !output.exists() {
            return Err(EngineError::Failed {
                status: status.code(),
                stderr: "no output raster produced".to_string(),
            });
        }

        read_mask(&output, terrain.grid.shape())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::GridModel;

    #[test]
    fn test_command_arguments() {
        let engine = WhiteboxViewshed::new("/opt/wbt/whitebox_tools");
        let cmd = engine.command(
            Path::new("/tmp/w"),
            Path::new("/data/dem.tif"),
            Path::new("/tmp/w/station.shp"),
            Path::new("/tmp/w/viewshed.tif"),
            1.65,
        );
        assert_eq!(cmd.get_program(), "/opt/wbt/whitebox_tools");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "--run=Viewshed",
                "--wd=/tmp/w",
                "--dem=/data/dem.tif",
                "--stations=/tmp/w/station.shp",
                "--output=/tmp/w/viewshed.tif",
                "--height=1.65",
                "-v=false",
            ]
        );
    }

    #[test]
    fn test_missing_executable_is_unavailable() {
        let engine = WhiteboxViewshed::new("/nonexistent/whitebox_tools");
        let grid = GridModel::new(3, 3, 1.0, 1.0, 0.0, 3.0).unwrap();
        let terrain = Terrain::in_memory(grid, "", Array2::zeros((3, 3))).unwrap();
        let err = engine
            .visibility(&terrain, Point::new(1.0, 1.0), 1.65, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)), "{err}");
    }

    #[test]
    fn test_file_dem_is_passed_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let grid = GridModel::new(3, 3, 1.0, 1.0, 0.0, 3.0).unwrap();
        let terrain = Terrain {
            grid,
            projection: String::new(),
            source: TerrainSource::File(PathBuf::from("dem.tif")),
        };

        let dem = stage_dem(&terrain, dir.path()).unwrap();
        assert!(dem.is_absolute());
        assert_eq!(dem, std::env::current_dir().unwrap().join("dem.tif"));

        let engine = WhiteboxViewshed::default();
        let cmd = engine.command(
            dir.path(),
            &dem,
            &dir.path().join("station.shp"),
            &dir.path().join("viewshed.tif"),
            1.65,
        );
        let dem_arg = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .find(|a| a.starts_with("--dem="))
            .unwrap();
        assert!(Path::new(dem_arg.trim_start_matches("--dem=")).is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_engine_is_killed_on_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow_wbt.sh");
        std::fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = WhiteboxViewshed::new(&script);
        let grid = GridModel::new(3, 3, 1.0, 1.0, 0.0, 3.0).unwrap();
        let terrain = Terrain::in_memory(grid, "", Array2::zeros((3, 3))).unwrap();

        let started = Instant::now();
        let err = engine
            .visibility(
                &terrain,
                Point::new(1.0, 1.0),
                1.65,
                Some(Duration::from_millis(200)),
            )
            .unwrap_err();
        assert!(
            matches!(err, EngineError::Timeout(limit) if limit == Duration::from_millis(200)),
            "{err}"
        );
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_read_mask_thresholds_and_checks_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vs.tif");
        let grid = GridModel::new(2, 2, 1.0, 1.0, 0.0, 2.0).unwrap();
        let data = ndarray::arr2(&[[1.0f32, 0.0], [-32768.0, f32::NAN]]);
        drop(write_tiff_f32(&path, &grid, "", &data, None).unwrap());

        let mask = read_mask(&path, (2, 2)).unwrap();
        assert_eq!(mask, ndarray::arr2(&[[true, false], [false, false]]));

        let err = read_mask(&path, (3, 2)).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));
    }
}
