use gmt_vector::{FieldSpec, FieldType, GeometryKind, GmtLayer, SpatialRef, params};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use wkt::Wkt;

fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("write_gmt failed: {err}");
        std::process::exit(1);
    }
}

/// Two polygon features. The first one has a hole, written as an `# @H`
/// ring inside the same `>` block.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: write_gmt <output.gmt>")?;

    let mut layer = GmtLayer::create(
        path,
        GeometryKind::Polygon,
        Some(SpatialRef::from_epsg("4326")?),
    )?;
    layer.create_field(FieldSpec::new("name", FieldType::String), false)?;
    layer.create_field(FieldSpec::new("area_km2", FieldType::Real), false)?;
    layer.create_field(FieldSpec::new("lakes", FieldType::Integer), false)?;

    // Lake Biwa with Okishima cut out.
    let shore = rectangle_ring(135.85, 34.95, 136.30, 35.55);
    let okishima = rectangle_ring(136.05, 35.19, 136.08, 35.22);
    layer.insert(
        polygon_wkt(&[shore, okishima])?,
        params!["Lake Biwa", 2_035.5, 1_i64],
    )?;

    let awaji = rectangle_ring(134.70, 34.15, 135.05, 34.65);
    layer.insert(polygon_wkt(&[awaji])?, params!["Awaji", 592.2, 0_i64])?;

    layer.close()?;
    Ok(())
}

/// Closed ring of an axis-aligned rectangle, counter-clockwise.
fn rectangle_ring(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<(f64, f64)> {
    vec![
        (min_x, min_y),
        (max_x, min_y),
        (max_x, max_y),
        (min_x, max_y),
        (min_x, min_y),
    ]
}

/// First ring is the exterior, the rest are holes.
fn polygon_wkt(rings: &[Vec<(f64, f64)>]) -> Result<Wkt<f64>, Box<dyn std::error::Error>> {
    let rings: Vec<String> = rings
        .iter()
        .map(|ring| {
            let coords: Vec<String> = ring.iter().map(|(x, y)| format!("{x} {y}")).collect();
            format!("({})", coords.join(", "))
        })
        .collect();
    Ok(Wkt::from_str(&format!("POLYGON ({})", rings.join(", ")))?)
}
