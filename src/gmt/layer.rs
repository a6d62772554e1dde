use super::escape::tokenize;
use super::feature::{GmtFeature, GmtFeatureIterator};
use super::header::{RegionStub, read_header};
use super::reader::{Line, LineReader};
use super::writer;
use super::GmtFeatureBatchIterator;
use crate::Value;
use crate::config::WriterOptions;
use crate::error::{GmtError, Result};
use crate::geometry::{Coord, Geometry, LineString, Polygon};
use crate::spatial_ref::SpatialRef;
use crate::types::{
    Capability, Envelope, FieldSpec, FieldType, GeometryKind, LayerDefn, merge_envelope,
};
use geo_traits::GeometryTrait;
use std::fs::{File, OpenOptions};
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A GMT vector layer: one file, one layer.
///
/// The stream is a `File` for on-disk layers; any `Read + Write + Seek`
/// works, see [`GmtLayer::new_in_memory`] and [`GmtLayer::from_stream`].
///
/// Dropping the layer flushes the region line like [`GmtLayer::close`],
/// logging failures instead of returning them.
pub struct GmtLayer<S: Read + Write + Seek = File> {
    reader: LineReader<S>,
    defn: Arc<LayerDefn>,
    geometry_kind: GeometryKind,
    spatial_ref: Option<Arc<SpatialRef>>,
    region: Option<Envelope>,
    region_complete: bool,
    region_stub: Option<RegionStub>,
    /// Features were written since the region line was last flushed.
    region_dirty: bool,
    data_offset: u64,
    next_fid: i64,
    features_read: u64,
    update: bool,
    header_complete: bool,
    spatial_filter: Option<Envelope>,
    writer_options: WriterOptions,
    closed: bool,
}

impl GmtLayer<File> {
    /// Open an existing file without write access.
    ///
    /// Example:
    /// ```no_run
    /// use gmt_vector::GmtLayer;
    ///
    /// let mut layer = GmtLayer::open_read_only("data/roads.gmt")?;
    /// for feature in layer.features() {
    ///     let feature = feature?;
    ///     let _geom = feature.geometry();
    /// }
    /// # Ok::<(), gmt_vector::GmtError>(())
    /// ```
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_stream(file, layer_name_from_path(path), false)
    }

    /// Open an existing file for reading and appending features.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_stream(file, layer_name_from_path(path), true)
    }

    /// Create (or truncate) a file and open it for writing.
    ///
    /// The kind may be `GeometryKind::Unknown`, in which case it is fixed by
    /// the first written feature.
    ///
    /// Example:
    /// ```no_run
    /// use gmt_vector::{GeometryKind, GmtLayer, SpatialRef, params};
    /// use geo_types::Point;
    ///
    /// let mut layer = GmtLayer::create(
    ///     "data/points.gmt",
    ///     GeometryKind::Point,
    ///     Some(SpatialRef::from_epsg("4326")?),
    /// )?;
    /// layer.insert(Point::new(1.0, 2.0), params![])?;
    /// layer.close()?;
    /// # Ok::<(), gmt_vector::GmtError>(())
    /// ```
    pub fn create<P: AsRef<Path>>(
        path: P,
        kind: GeometryKind,
        spatial_ref: Option<SpatialRef>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(writer::preamble(kind, spatial_ref.as_ref()).as_bytes())?;
        Self::from_stream(file, layer_name_from_path(path), true)
    }
}

impl GmtLayer<Cursor<Vec<u8>>> {
    /// Create a writable layer backed by memory.
    ///
    /// Example:
    /// ```
    /// use gmt_vector::{FieldSpec, FieldType, GeometryKind, GmtLayer, params};
    /// use geo_types::Point;
    ///
    /// let mut layer = GmtLayer::new_in_memory("points", GeometryKind::Point, None)?;
    /// layer.create_field(FieldSpec::new("name", FieldType::String), false)?;
    /// layer.insert(Point::new(1.0, 2.0), params!["alpha"])?;
    ///
    /// let feature = layer.features().next().expect("one feature")?;
    /// let name: String = feature.property("name").ok_or("missing name")?.try_into()?;
    /// assert_eq!(name, "alpha");
    /// # Ok::<(), gmt_vector::GmtError>(())
    /// ```
    pub fn new_in_memory(
        name: &str,
        kind: GeometryKind,
        spatial_ref: Option<SpatialRef>,
    ) -> Result<Self> {
        let preamble = writer::preamble(kind, spatial_ref.as_ref());
        Self::from_stream(Cursor::new(preamble.into_bytes()), name, true)
    }

    /// Open GMT text held in memory without write access.
    pub fn from_bytes(name: &str, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::from_stream(Cursor::new(bytes.into()), name, false)
    }
}

impl<S: Read + Write + Seek> GmtLayer<S> {
    /// Parse the header of `stream` and position reading on the first
    /// feature. `update` grants write access.
    pub fn from_stream(stream: S, name: impl Into<String>, update: bool) -> Result<Self> {
        let mut reader = LineReader::new(stream);
        let header = read_header(&mut reader)?;

        let mut defn = LayerDefn::new(name);
        for field in header.fields {
            defn.push_field(field);
        }

        debug!(
            layer = %defn.name,
            fields = defn.field_count(),
            kind = ?header.geometry_kind,
            version = header.version.as_deref().unwrap_or(""),
            header_complete = header.complete,
            "Opened GMT layer"
        );

        Ok(Self {
            data_offset: reader.current().offset,
            reader,
            defn: Arc::new(defn),
            geometry_kind: header.geometry_kind,
            spatial_ref: header.spatial_ref.map(Arc::new),
            region: header.region,
            region_complete: header.region_declared,
            region_stub: header.region_stub,
            region_dirty: false,
            next_fid: 0,
            features_read: 0,
            update,
            header_complete: header.complete || !update,
            spatial_filter: None,
            writer_options: WriterOptions::from_env(),
            closed: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.defn.name
    }

    pub fn defn(&self) -> &LayerDefn {
        &self.defn
    }

    pub fn fields(&self) -> &[FieldSpec] {
        self.defn.fields()
    }

    pub fn geometry_kind(&self) -> GeometryKind {
        self.geometry_kind
    }

    pub fn spatial_ref(&self) -> Option<&SpatialRef> {
        self.spatial_ref.as_deref()
    }

    pub fn is_read_only(&self) -> bool {
        !self.update
    }

    pub fn writer_options(&self) -> WriterOptions {
        self.writer_options
    }

    pub fn set_writer_options(&mut self, options: WriterOptions) {
        self.writer_options = options;
    }

    /// Restrict `next_feature` to features whose envelope intersects
    /// `filter`. `None` removes the filter.
    pub fn set_spatial_filter(&mut self, filter: Option<Envelope>) {
        self.spatial_filter = filter;
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        self.reader.get_ref()
    }

    /// Restart reading at the first feature. Ids restart at 0.
    pub fn reset_reading(&mut self) {
        self.next_fid = 0;
        self.reader.seek(self.data_offset);
    }

    /// Iterate over all features from the start of the layer.
    pub fn features(&mut self) -> GmtFeatureIterator<'_, S> {
        self.reset_reading();
        GmtFeatureIterator {
            layer: self,
            done: false,
        }
    }

    /// Iterate over all features from the start of the layer, `batch_size`
    /// at a time.
    ///
    /// Example:
    /// ```no_run
    /// use gmt_vector::GmtLayer;
    ///
    /// let mut layer = GmtLayer::open_read_only("data/roads.gmt")?;
    /// for batch in layer.features_batch(100)? {
    ///     let features = batch?;
    ///     println!("{} features", features.len());
    /// }
    /// # Ok::<(), gmt_vector::GmtError>(())
    /// ```
    pub fn features_batch(&mut self, batch_size: usize) -> Result<GmtFeatureBatchIterator<'_, S>> {
        if batch_size == 0 {
            return Err("batch size must be positive".into());
        }
        self.reset_reading();
        Ok(GmtFeatureBatchIterator {
            layer: self,
            batch_size,
            end_or_invalid_state: false,
        })
    }

    /// Next feature passing the spatial filter, or `None` at the end.
    pub fn next_feature(&mut self) -> Result<Option<GmtFeature>> {
        loop {
            let Some(feature) = self.next_raw_feature()? else {
                return Ok(None);
            };
            if self.passes_filter(&feature) {
                return Ok(Some(feature));
            }
        }
    }

    fn passes_filter(&self, feature: &GmtFeature) -> bool {
        let Some(filter) = self.spatial_filter else {
            return true;
        };
        feature
            .geometry
            .as_ref()
            .and_then(Geometry::envelope)
            .is_some_and(|envelope| filter.intersects(&envelope))
    }

    fn next_raw_feature(&mut self) -> Result<Option<GmtFeature>> {
        // Also picks up features appended since the end was reached.
        if self.reader.current().eof {
            self.reader.advance()?;
        }

        let mut field_data = String::new();
        let mut geometry: Option<Geometry> = None;

        loop {
            match LineKind::of(self.reader.current()) {
                LineKind::End => break,
                LineKind::Separator => match geometry.as_mut() {
                    Some(Geometry::MultiPolygon(polygons)) => {
                        if self.scan_ahead_for_hole()? {
                            if let Some(polygon) = polygons.last_mut() {
                                polygon.interiors.push(LineString::default());
                            }
                        } else if !self.next_is_feature()? {
                            polygons.push(Polygon::default());
                        } else {
                            break;
                        }
                    }
                    Some(Geometry::Polygon(polygon)) => {
                        if self.scan_ahead_for_hole()? {
                            polygon.interiors.push(LineString::default());
                        } else {
                            break;
                        }
                    }
                    Some(Geometry::MultiLineString(lines)) => {
                        if self.next_is_feature()? {
                            break;
                        }
                        lines.push(LineString::default());
                    }
                    Some(_) => break,
                    None => {
                        if self.geometry_kind == GeometryKind::Unknown {
                            self.geometry_kind = GeometryKind::LineString;
                        }
                    }
                },
                LineKind::Comment(data) => {
                    if let Some(data) = data {
                        field_data = data;
                    }
                }
                LineKind::Vertex(coord) => {
                    let kind = self.geometry_kind;
                    geometry
                        .get_or_insert_with(|| Geometry::empty_of_kind(kind))
                        .push_vertex(coord);
                }
                LineKind::Other => {}
            }

            self.reader.advance()?;

            // A point is exactly one vertex line.
            if matches!(geometry, Some(Geometry::Point(_))) {
                break;
            }
        }

        let Some(geometry) = geometry else {
            return Ok(None);
        };

        let feature = GmtFeature {
            id: self.next_fid,
            geometry: Some(geometry),
            properties: self.parse_properties(&field_data),
            defn: Some(Arc::clone(&self.defn)),
            spatial_ref: self.spatial_ref.clone(),
        };
        self.next_fid += 1;
        self.features_read += 1;
        Ok(Some(feature))
    }

    /// Whether the comment lines following a `>` start with an `@H` hole
    /// marker. On success the marker line becomes the current line.
    fn scan_ahead_for_hole(&mut self) -> Result<bool> {
        let mut n = 0;
        loop {
            let is_hole = match self.reader.peek(n)? {
                Some(line) if line.is_comment() => line.keyed.first_key() == Some('H'),
                _ => return Ok(false),
            };
            if is_hole {
                for _ in 0..=n {
                    self.reader.advance()?;
                }
                return Ok(true);
            }
            n += 1;
        }
    }

    /// Whether the line after the current one carries attribute data, which
    /// means a new feature starts.
    fn next_is_feature(&mut self) -> Result<bool> {
        Ok(self
            .reader
            .peek(0)?
            .is_some_and(|line| line.is_comment() && line.text.contains("@D")))
    }

    fn parse_properties(&self, field_data: &str) -> Vec<Value> {
        let tokens = tokenize(field_data, '|');
        self.defn
            .fields()
            .iter()
            .enumerate()
            .map(|(idx, field)| match tokens.get(idx) {
                Some(token) => parse_value(field, token),
                None => Value::Null,
            })
            .collect()
    }

    /// Append a feature with geometry and ordered property values.
    ///
    /// Example:
    /// ```
    /// use gmt_vector::{FieldSpec, FieldType, GeometryKind, GmtLayer, Value};
    /// use geo_types::line_string;
    ///
    /// let mut layer = GmtLayer::new_in_memory("roads", GeometryKind::LineString, None)?;
    /// layer.create_field(FieldSpec::new("lanes", FieldType::Integer), false)?;
    ///
    /// let road = line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 5.0)];
    /// layer.insert(road, vec![Value::Integer(2)])?;
    /// # Ok::<(), gmt_vector::GmtError>(())
    /// ```
    pub fn insert<G, P>(&mut self, geometry: G, properties: P) -> Result<()>
    where
        G: GeometryTrait<T = f64>,
        P: IntoIterator<Item = Value>,
    {
        self.ensure_writable()?;
        let feature = GmtFeature::new(&geometry, properties)?;
        self.create_feature(&feature)
    }

    /// Append `feature` to the end of the layer.
    ///
    /// The first call completes the header. Nothing is written when the
    /// feature is rejected.
    pub fn create_feature(&mut self, feature: &GmtFeature) -> Result<()> {
        self.ensure_writable()?;

        let geometry = feature.geometry.as_ref().ok_or(GmtError::MissingGeometry)?;
        // A block without vertices is never read back as a feature.
        let envelope = geometry.envelope().ok_or(GmtError::EmptyGeometry)?;
        let kind = geometry.kind();
        if self.geometry_kind != GeometryKind::Unknown && self.geometry_kind != kind {
            return Err(GmtError::GeometryKindMismatch {
                expected: self.geometry_kind,
                actual: kind,
            });
        }
        if feature.properties.len() != self.defn.field_count() {
            return Err(GmtError::InvalidPropertyCount {
                expected: self.defn.field_count(),
                got: feature.properties.len(),
            });
        }

        let declare_kind = (self.geometry_kind == GeometryKind::Unknown).then_some(kind);

        let mut text = String::new();
        if !self.header_complete {
            text.push_str(&writer::header_completion(declare_kind, self.defn.fields()));
        }
        if kind != GeometryKind::Point {
            text.push_str(">\n");
        }
        if self.defn.field_count() > 0 {
            text.push_str(&writer::attribute_line(
                self.defn.fields(),
                &feature.properties,
            ));
        }
        writer::push_geometry(&mut text, geometry, self.writer_options.separator(), true);

        let stream = self.reader.stream_mut_at(SeekFrom::End(0))?;
        stream.write_all(text.as_bytes())?;

        if !self.header_complete {
            debug!(layer = %self.defn.name, kind = ?kind, "Completed GMT header");
            self.header_complete = true;
            self.region_complete = true;
        }
        self.geometry_kind = kind;
        merge_envelope(&mut self.region, envelope);
        self.region_dirty = true;
        Ok(())
    }

    /// Add a field to the schema. Only possible before the first feature
    /// is written.
    ///
    /// Types other than integer, real, string and date-time are rejected
    /// unless `approx_ok` is set, in which case dates and times become
    /// date-time fields and everything else a string field.
    pub fn create_field(&mut self, spec: FieldSpec, approx_ok: bool) -> Result<()> {
        self.ensure_writable()?;
        if self.header_complete {
            return Err(GmtError::FieldsLocked);
        }

        let field_type = match spec.field_type {
            FieldType::Integer | FieldType::Real | FieldType::String | FieldType::DateTime => {
                spec.field_type
            }
            other if !approx_ok => {
                return Err(GmtError::UnsupportedFieldType {
                    field: spec.name,
                    field_type: other,
                });
            }
            FieldType::Date | FieldType::Time => FieldType::DateTime,
            _ => FieldType::String,
        };

        Arc::make_mut(&mut self.defn).push_field(FieldSpec {
            name: spec.name,
            field_type,
        });
        Ok(())
    }

    /// Bounding box of all features.
    ///
    /// Answered from the header or the written features when known;
    /// otherwise the whole layer is scanned, ignoring the spatial filter,
    /// and reading restarts from the first feature. `None` for an empty
    /// layer.
    pub fn extent(&mut self) -> Result<Option<Envelope>> {
        if self.region_complete && self.region.is_some() {
            return Ok(self.region);
        }

        let filter = self.spatial_filter.take();
        let features_read = self.features_read;
        self.reset_reading();
        let scanned = self.scan_extent();
        self.spatial_filter = filter;
        self.features_read = features_read;
        self.reset_reading();

        let extent = scanned?;
        self.region = extent;
        self.region_complete = true;
        Ok(extent)
    }

    fn scan_extent(&mut self) -> Result<Option<Envelope>> {
        let mut extent = None;
        while let Some(feature) = self.next_raw_feature()? {
            if let Some(envelope) = feature.geometry.as_ref().and_then(Geometry::envelope) {
                merge_envelope(&mut extent, envelope);
            }
        }
        Ok(extent)
    }

    pub fn test_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::RandomRead | Capability::FastSpatialFilter => false,
            Capability::SequentialWrite | Capability::CreateField | Capability::ZGeometries => {
                true
            }
            Capability::FastGetExtent => self.region_complete,
        }
    }

    /// Rewrite the region line with the current bounding box.
    ///
    /// Only done for writable layers that recorded a region placeholder and
    /// wrote features since the last flush. The line is padded to the width
    /// of the placeholder and skipped when it does not fit.
    pub fn flush_region(&mut self) -> Result<()> {
        if !self.update || !self.region_dirty {
            return Ok(());
        }
        let (Some(stub), Some(region)) = (self.region_stub, self.region) else {
            return Ok(());
        };

        match writer::region_line(&region, stub.width) {
            Some(line) => {
                let stream = self.reader.stream_mut_at(SeekFrom::Start(stub.offset))?;
                stream.write_all(line.as_bytes())?;
                self.region_dirty = false;
                debug!(layer = %self.defn.name, region = %line.trim_end(), "Rewrote GMT region");
            }
            None => warn!(
                layer = %self.defn.name,
                width = stub.width,
                "GMT region does not fit its placeholder, leaving it unchanged"
            ),
        }
        Ok(())
    }

    /// Flush the region line and the stream, surfacing any failure.
    pub fn close(mut self) -> Result<()> {
        let result = self.finish();
        self.closed = true;
        result
    }

    fn finish(&mut self) -> Result<()> {
        if self.features_read > 0 {
            debug!(
                layer = %self.defn.name,
                features_read = self.features_read,
                "Closing GMT layer"
            );
        }
        if self.update {
            self.flush_region()?;
            self.reader.stream_mut_at(SeekFrom::End(0))?.flush()?;
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<()> {
        if !self.update {
            return Err(GmtError::ReadOnly);
        }
        Ok(())
    }
}

impl<S: Read + Write + Seek> Drop for GmtLayer<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(err) = self.finish() {
            warn!(layer = %self.defn.name, error = %err, "Failed to finalize GMT layer");
        }
    }
}

/// How the feature assembler treats a line.
enum LineKind {
    /// Blank line or end of stream.
    End,
    Separator,
    /// Comment, with its `@D` attribute data if any.
    Comment(Option<String>),
    Vertex(Coord),
    Other,
}

impl LineKind {
    fn of(line: &Line) -> Self {
        if line.text.is_empty() {
            LineKind::End
        } else if line.text.starts_with('>') {
            LineKind::Separator
        } else if line.is_comment() {
            LineKind::Comment(line.keyed.get('D').map(str::to_string))
        } else {
            match parse_vertex(&line.text) {
                Some(coord) => LineKind::Vertex(coord),
                None => LineKind::Other,
            }
        }
    }
}

/// Leading two or three numbers of a vertex line.
fn parse_vertex(text: &str) -> Option<Coord> {
    let mut values = [0.0_f64; 3];
    let mut count = 0;
    for token in text.split_whitespace().take(3) {
        match token.parse::<f64>() {
            Ok(value) => {
                values[count] = value;
                count += 1;
            }
            Err(_) => break,
        }
    }
    match count {
        2 => Some(Coord::xy(values[0], values[1])),
        3 => Some(Coord::xyz(values[0], values[1], values[2])),
        _ => None,
    }
}

fn parse_value(field: &FieldSpec, token: &str) -> Value {
    match field.field_type {
        FieldType::Integer | FieldType::Integer64 => {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            trimmed.parse::<i64>().map(Value::Integer).unwrap_or_else(|_| {
                warn!(field = %field.name, value = %token, "Ignoring unparsable integer attribute");
                Value::Null
            })
        }
        FieldType::Real => {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            trimmed.parse::<f64>().map(Value::Real).unwrap_or_else(|_| {
                warn!(field = %field.name, value = %token, "Ignoring unparsable real attribute");
                Value::Null
            })
        }
        _ => Value::Text(token.to_string()),
    }
}

fn layer_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
