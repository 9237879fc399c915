use std::path::Path;

use gdal::Dataset;
use gdal::vector::{FieldValue, Geometry as OgrGeometry, LayerAccess};
use gdal_sys::OGRwkbGeometryType;
use tracing::{debug, info, warn};

use crate::core::geometry::{Geometry, GeometryError, Polygon};
use crate::error::{Error, Result};
use crate::types::{FeatureRecord, Point};

fn ring_points(ring: &OgrGeometry) -> Vec<Point> {
    let mut points = Vec::new();
    ring.get_points(&mut points);
    points
        .into_iter()
        .map(|(x, y, _)| Point::new(x, y))
        .collect()
}

fn polygon_from_ogr(geom: &OgrGeometry) -> std::result::Result<Polygon, GeometryError> {
    let rings = geom.geometry_count();
    if rings == 0 {
        return Err(GeometryError::TooFewVertices(0));
    }
    let exterior = ring_points(&geom.get_geometry(0));
    let interiors = (1..rings)
        .map(|i| ring_points(&geom.get_geometry(i)))
        .collect();
    Ok(Polygon::with_interiors(exterior, interiors))
}

/// Convert an OGR geometry into the observer geometry variant.
pub fn geometry_from_ogr(geom: &OgrGeometry) -> std::result::Result<Geometry, GeometryError> {
    // Flatten 2.5D/measured variants to their 2D base type.
    // SAFETY: OGR_GT_Flatten is a pure function on the type code; it takes no
    // pointers and accepts any value.
    let ty = unsafe { gdal_sys::OGR_GT_Flatten(geom.geometry_type()) };
    match ty {
        OGRwkbGeometryType::wkbPoint => {
            let (x, y, _) = geom.get_point(0);
            Ok(Geometry::Point(Point::new(x, y)))
        }
        OGRwkbGeometryType::wkbPolygon => Ok(Geometry::Polygon(polygon_from_ogr(geom)?)),
        OGRwkbGeometryType::wkbMultiPolygon => {
            let parts = (0..geom.geometry_count())
                .map(|i| polygon_from_ogr(&geom.get_geometry(i)))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Geometry::MultiPolygon(parts))
        }
        _ => Err(GeometryError::Unsupported(geom.geometry_name())),
    }
}

fn field_to_string(value: FieldValue) -> Option<String> {
    match value {
        FieldValue::IntegerValue(v) => Some(v.to_string()),
        FieldValue::Integer64Value(v) => Some(v.to_string()),
        FieldValue::RealValue(v) => Some(v.to_string()),
        FieldValue::StringValue(v) => Some(v),
        other => other.into_string(),
    }
}

/// Read every feature of layer 0 with its identifier attribute.
///
/// A missing `id_field` is a configuration error; a null identifier falls
/// back to the feature FID. Geometry problems are recorded per feature.
pub fn read_features<P: AsRef<Path>>(path: P, id_field: &str) -> Result<Vec<FeatureRecord>> {
    let path = path.as_ref();
    info!("Opening features: {:?}", path);
    let dataset = Dataset::open(path)?;
    let mut layer = dataset.layer(0)?;

    let field_idx = layer
        .defn()
        .fields()
        .position(|f| f.name() == id_field)
        .ok_or_else(|| Error::configuration("id_field", id_field, "attribute not found in layer"))?;

    let mut records = Vec::new();
    for (n, feature) in layer.features().enumerate() {
        let fid = feature.fid().map(|f| f.to_string()).unwrap_or_else(|| n.to_string());
        let id = match feature.field(field_idx)? {
            Some(value) => field_to_string(value).unwrap_or_else(|| fid.clone()),
            None => {
                warn!("Feature {} has no {} value; using FID", fid, id_field);
                fid.clone()
            }
        };
        let geometry = match feature.geometry() {
            Some(g) => geometry_from_ogr(g),
            None => Err(GeometryError::Missing),
        };
        if let Err(e) = &geometry {
            debug!("Feature {} geometry rejected: {}", id, e);
        }
        records.push(FeatureRecord { id, geometry });
    }
    info!("Read {} features from {:?}", records.len(), path);
    Ok(records)
}
