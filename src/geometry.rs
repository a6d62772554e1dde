//! Owned geometry model used by GMT features.
//!
//! Geometries written to a layer can come from anything implementing
//! `geo_traits::GeometryTrait` (for example `geo_types` or `wkt` values);
//! they are converted into [`Geometry`] on the way in. Geometries read from
//! a layer are always [`Geometry`], which keeps the optional Z value that
//! the format can carry. Convert to `geo_types::Geometry` when you need the
//! georust algorithms (Z is dropped).

use crate::error::{GmtError, Result};
use crate::types::{Envelope, GeometryKind, merge_point};
use geo_traits::{
    CoordTrait, Dimensions, GeometryTrait, LineStringTrait, MultiLineStringTrait,
    MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coord {
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineString(pub Vec<Coord>);

impl LineString {
    pub fn coords(&self) -> &[Coord] {
        &self.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub exterior: LineString,
    pub interiors: Vec<LineString>,
}

impl Polygon {
    pub fn new(exterior: LineString, interiors: Vec<LineString>) -> Self {
        Self {
            exterior,
            interiors,
        }
    }

    /// Exterior ring followed by the interior rings.
    pub fn rings(&self) -> impl Iterator<Item = &LineString> {
        std::iter::once(&self.exterior).chain(self.interiors.iter())
    }

    /// The ring vertices are currently appended to: the last interior ring
    /// if any, else the exterior.
    pub(crate) fn last_ring_mut(&mut self) -> &mut LineString {
        match self.interiors.last_mut() {
            Some(ring) => ring,
            None => &mut self.exterior,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(Vec<Coord>),
    MultiLineString(Vec<LineString>),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::LineString,
            Geometry::Polygon(_) => GeometryKind::Polygon,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Empty container of `kind` ready to receive vertices. Polygons start
    /// with an (empty) exterior ring, multi geometries of lines and polygons
    /// with their first member. `Unknown` and `Point` yield a point at the
    /// origin that the caller overwrites.
    pub(crate) fn empty_of_kind(kind: GeometryKind) -> Self {
        match kind {
            GeometryKind::LineString => Geometry::LineString(LineString::default()),
            GeometryKind::Polygon => Geometry::Polygon(Polygon::default()),
            GeometryKind::MultiPolygon => Geometry::MultiPolygon(vec![Polygon::default()]),
            GeometryKind::MultiPoint => Geometry::MultiPoint(Vec::new()),
            GeometryKind::MultiLineString => {
                Geometry::MultiLineString(vec![LineString::default()])
            }
            GeometryKind::Point | GeometryKind::Unknown => Geometry::Point(Coord::xy(0.0, 0.0)),
        }
    }

    /// Append a vertex to the leaf geometry currently being built.
    pub(crate) fn push_vertex(&mut self, coord: Coord) {
        match self {
            Geometry::Point(point) => *point = coord,
            Geometry::LineString(line) => line.0.push(coord),
            Geometry::Polygon(polygon) => polygon.last_ring_mut().0.push(coord),
            Geometry::MultiPoint(points) => points.push(coord),
            Geometry::MultiLineString(lines) => {
                if lines.is_empty() {
                    lines.push(LineString::default());
                }
                if let Some(line) = lines.last_mut() {
                    line.0.push(coord);
                }
            }
            Geometry::MultiPolygon(polygons) => {
                if polygons.is_empty() {
                    polygons.push(Polygon::default());
                }
                if let Some(polygon) = polygons.last_mut() {
                    polygon.last_ring_mut().0.push(coord);
                }
            }
        }
    }

    /// Visit every vertex in file order.
    pub fn for_each_coord<F: FnMut(&Coord)>(&self, mut f: F) {
        match self {
            Geometry::Point(point) => f(point),
            Geometry::LineString(line) => line.0.iter().for_each(f),
            Geometry::Polygon(polygon) => polygon.rings().flat_map(|r| r.0.iter()).for_each(f),
            Geometry::MultiPoint(points) => points.iter().for_each(f),
            Geometry::MultiLineString(lines) => lines.iter().flat_map(|l| l.0.iter()).for_each(f),
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|p| p.rings())
                .flat_map(|r| r.0.iter())
                .for_each(f),
        }
    }

    pub fn envelope(&self) -> Option<Envelope> {
        let mut envelope = None;
        self.for_each_coord(|coord| merge_point(&mut envelope, coord.x, coord.y));
        envelope
    }

    pub fn has_z(&self) -> bool {
        let mut has_z = false;
        self.for_each_coord(|coord| has_z |= coord.z.is_some());
        has_z
    }

    /// Convert any `GeometryTrait` implementation into an owned geometry.
    ///
    /// Geometry collections, rectangles, triangles and bare lines cannot be
    /// stored in a GMT file and are rejected, as are empty points.
    pub fn from_geo_traits<G: GeometryTrait<T = f64>>(geometry: &G) -> Result<Self> {
        use geo_traits::GeometryType as GeoType;

        match geometry.as_type() {
            GeoType::Point(point) => point_to_coord(point)
                .map(Geometry::Point)
                .ok_or(GmtError::EmptyGeometry),
            GeoType::LineString(line) => Ok(Geometry::LineString(line_from_trait(line))),
            GeoType::Polygon(polygon) => Ok(Geometry::Polygon(polygon_from_trait(polygon))),
            GeoType::MultiPoint(multi) => Ok(Geometry::MultiPoint(
                multi.points().filter_map(|p| point_to_coord(&p)).collect(),
            )),
            GeoType::MultiLineString(multi) => Ok(Geometry::MultiLineString(
                multi.line_strings().map(|l| line_from_trait(&l)).collect(),
            )),
            GeoType::MultiPolygon(multi) => Ok(Geometry::MultiPolygon(
                multi.polygons().map(|p| polygon_from_trait(&p)).collect(),
            )),
            GeoType::GeometryCollection(_) => Err(GmtError::UnsupportedGeometryType(
                "GEOMETRYCOLLECTION".to_string(),
            )),
            GeoType::Rect(_) => Err(GmtError::UnsupportedGeometryType("RECT".to_string())),
            GeoType::Triangle(_) => {
                Err(GmtError::UnsupportedGeometryType("TRIANGLE".to_string()))
            }
            GeoType::Line(_) => Err(GmtError::UnsupportedGeometryType("LINE".to_string())),
        }
    }
}

fn coord_from_trait<C: CoordTrait<T = f64>>(coord: &C) -> Coord {
    let (x, y) = coord.x_y();
    let z = match coord.dim() {
        Dimensions::Xyz | Dimensions::Xyzm => coord.nth(2),
        _ => None,
    };
    Coord { x, y, z }
}

fn point_to_coord<P: PointTrait<T = f64>>(point: &P) -> Option<Coord> {
    point.coord().map(|coord| coord_from_trait(&coord))
}

fn line_from_trait<L: LineStringTrait<T = f64>>(line: &L) -> LineString {
    LineString(line.coords().map(|c| coord_from_trait(&c)).collect())
}

fn polygon_from_trait<P: PolygonTrait<T = f64>>(polygon: &P) -> Polygon {
    let exterior = polygon
        .exterior()
        .map(|ring| line_from_trait(&ring))
        .unwrap_or_default();
    let interiors = polygon
        .interiors()
        .map(|ring| line_from_trait(&ring))
        .collect();
    Polygon::new(exterior, interiors)
}

impl From<Coord> for geo_types::Coord<f64> {
    fn from(coord: Coord) -> Self {
        geo_types::coord! { x: coord.x, y: coord.y }
    }
}

impl From<&LineString> for geo_types::LineString<f64> {
    fn from(line: &LineString) -> Self {
        geo_types::LineString::new(line.0.iter().map(|c| (*c).into()).collect())
    }
}

impl From<&Polygon> for geo_types::Polygon<f64> {
    fn from(polygon: &Polygon) -> Self {
        geo_types::Polygon::new(
            (&polygon.exterior).into(),
            polygon.interiors.iter().map(Into::into).collect(),
        )
    }
}

impl From<&Geometry> for geo_types::Geometry<f64> {
    fn from(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point(coord) => geo_types::Point::from(geo_types::Coord::from(*coord)).into(),
            Geometry::LineString(line) => geo_types::LineString::from(line).into(),
            Geometry::Polygon(polygon) => geo_types::Polygon::from(polygon).into(),
            Geometry::MultiPoint(points) => geo_types::MultiPoint::new(
                points
                    .iter()
                    .map(|c| geo_types::Point::from(geo_types::Coord::from(*c)))
                    .collect(),
            )
            .into(),
            Geometry::MultiLineString(lines) => {
                geo_types::MultiLineString::new(lines.iter().map(Into::into).collect()).into()
            }
            Geometry::MultiPolygon(polygons) => {
                geo_types::MultiPolygon::new(polygons.iter().map(Into::into).collect()).into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Geometry, LineString, Polygon};
    use crate::Result;
    use crate::types::{Envelope, GeometryKind};
    use geo_types::{MultiPolygon, Point, polygon};
    use std::str::FromStr;
    use wkt::Wkt;

    #[test]
    fn converts_from_geo_types() -> Result<()> {
        let point = Geometry::from_geo_traits(&Point::new(1.0, 2.0))?;
        assert_eq!(point, Geometry::Point(Coord::xy(1.0, 2.0)));

        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 4.0, y: 0.0),
            (x: 4.0, y: 4.0),
            (x: 0.0, y: 0.0),
        ];
        let multi = Geometry::from_geo_traits(&MultiPolygon::new(vec![square]))?;
        assert_eq!(multi.kind(), GeometryKind::MultiPolygon);
        assert_eq!(multi.envelope(), Some(Envelope::new(0.0, 4.0, 0.0, 4.0)));
        Ok(())
    }

    #[test]
    fn keeps_z_from_wkt() -> Result<()> {
        let wkt = Wkt::<f64>::from_str("LINESTRING Z (0 0 5, 1 1 6)")
            .map_err(|err| crate::GmtError::Message(err.to_string()))?;
        let line = Geometry::from_geo_traits(&wkt)?;
        assert_eq!(
            line,
            Geometry::LineString(LineString(vec![
                Coord::xyz(0.0, 0.0, 5.0),
                Coord::xyz(1.0, 1.0, 6.0)
            ]))
        );
        assert!(line.has_z());
        Ok(())
    }

    #[test]
    fn rejects_collections() {
        let collection = geo_types::GeometryCollection::<f64>::new_from(vec![]);
        assert!(matches!(
            Geometry::from_geo_traits(&collection),
            Err(crate::GmtError::UnsupportedGeometryType(_))
        ));
    }

    #[test]
    fn pushes_vertices_into_last_ring() {
        let mut geometry = Geometry::empty_of_kind(GeometryKind::Polygon);
        geometry.push_vertex(Coord::xy(0.0, 0.0));
        if let Geometry::Polygon(polygon) = &mut geometry {
            polygon.interiors.push(LineString::default());
        }
        geometry.push_vertex(Coord::xy(1.0, 1.0));

        let expected = Polygon::new(
            LineString(vec![Coord::xy(0.0, 0.0)]),
            vec![LineString(vec![Coord::xy(1.0, 1.0)])],
        );
        assert_eq!(geometry, Geometry::Polygon(expected));
    }

    #[test]
    fn converts_to_geo_types() {
        let geometry = Geometry::MultiPoint(vec![Coord::xyz(1.0, 2.0, 3.0), Coord::xy(4.0, 5.0)]);
        let converted: geo_types::Geometry<f64> = (&geometry).into();
        assert_eq!(
            converted,
            geo_types::Geometry::MultiPoint(geo_types::MultiPoint::from(vec![
                Point::new(1.0, 2.0),
                Point::new(4.0, 5.0)
            ]))
        );
    }
}
