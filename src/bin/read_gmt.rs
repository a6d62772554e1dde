use gmt_vector::{GmtLayer, Value};
use tracing_subscriber::EnvFilter;
use wkt::to_wkt::write_geometry;

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("read_gmt failed: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("Usage: read_gmt <path-to-gmt>")?;
    let mut layer = GmtLayer::open_read_only(path)?;
    let fields = layer.fields().to_vec();

    println!("layer: {} ({:?})", layer.name(), layer.geometry_kind());
    if let Some(extent) = layer.extent()? {
        println!(
            "extent: {} {} {} {}",
            extent.min_x, extent.max_x, extent.min_y, extent.max_y
        );
    }

    for feature in layer.features() {
        let feature = feature?;
        let mut values = Vec::with_capacity(fields.len() + 1);

        let mut wkt = String::new();
        if let Some(geometry) = feature.geometry() {
            let geometry = geo_types::Geometry::from(geometry);
            write_geometry(&mut wkt, &geometry)?;
        }
        values.push(format!("geometry={wkt}"));

        for (field, value) in fields.iter().zip(feature.properties()) {
            values.push(format!("{}={}", field.name, format_value(value)));
        }

        println!("  feature {}: {}", feature.id(), values.join(", "));
    }

    layer.close()?;
    Ok(())
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(value) => value.to_string(),
        Value::Real(value) => value.to_string(),
        Value::Text(value) => value.clone(),
    }
}
