//! Minimal DXF entity reader.
//!
//! DXF files are a flat stream of (group code, value) line pairs. This
//! reader scans the ENTITIES section and flattens LINE, LWPOLYLINE,
//! CIRCLE and ARC entities into polylines at the reader's tolerance.
//! The result is carried in the legacy `vector` section of the job
//! document, which is what the assembler's DXF branch operates on.

use jobkit_core::{JobDocument, Polyline, VectorSection};
use lyon::geom::euclid::default::Point2D;
use lyon::geom::{Angle, Arc};
use tracing::debug;

use crate::error::{ImportError, ImportResult};

/// Closed-polyline bit of the LWPOLYLINE flags word (group code 70).
const LWPOLYLINE_CLOSED: u32 = 1;

/// Reads one DXF document per call, flattening curved entities at the
/// tolerance fixed at construction.
#[derive(Debug)]
pub struct DxfReader {
    tolerance: f64,
}

/// Accumulator for the entity currently being scanned.
#[derive(Debug, Default)]
struct EntityData {
    name: String,
    x1: Option<f64>,
    y1: Option<f64>,
    x2: Option<f64>,
    y2: Option<f64>,
    radius: Option<f64>,
    start_angle: Option<f64>,
    end_angle: Option<f64>,
    flags: u32,
    vertices: Vec<[f64; 2]>,
    pending_x: Option<f64>,
}

impl DxfReader {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Parses a DXF document into the legacy vector section. The forced
    /// unit override is accepted for interface parity but not yet
    /// interpreted.
    pub fn parse(&self, text: &str, _forced_unit: Option<f64>) -> ImportResult<JobDocument> {
        let mut paths: Vec<Polyline> = Vec::new();
        let mut section = String::new();
        let mut section_pending = false;
        let mut entity: Option<EntityData> = None;

        let mut lines = text.lines();
        while let Some(code_line) = lines.next() {
            let Some(value_line) = lines.next() else {
                return Err(ImportError::Dxf("truncated group code pair".into()));
            };
            let code: u32 = code_line
                .trim()
                .parse()
                .map_err(|_| ImportError::Dxf(format!("bad group code: {code_line:?}")))?;
            let value = value_line.trim();

            if code == 0 {
                if let Some(done) = entity.take() {
                    self.finish_entity(done, &mut paths);
                }
                match value {
                    "SECTION" => section_pending = true,
                    "ENDSEC" => section.clear(),
                    name if section == "ENTITIES" => {
                        entity = Some(EntityData {
                            name: name.to_string(),
                            ..EntityData::default()
                        });
                    }
                    _ => {}
                }
                continue;
            }
            if section_pending && code == 2 {
                section = value.to_string();
                section_pending = false;
                continue;
            }

            let Some(data) = entity.as_mut() else { continue };
            let number = || value.parse::<f64>().ok();
            match code {
                10 => {
                    if data.name == "LWPOLYLINE" {
                        data.pending_x = number();
                    } else {
                        data.x1 = number();
                    }
                }
                20 => {
                    if data.name == "LWPOLYLINE" {
                        if let (Some(x), Some(y)) = (data.pending_x.take(), number()) {
                            data.vertices.push([x, y]);
                        }
                    } else {
                        data.y1 = number();
                    }
                }
                11 => data.x2 = number(),
                21 => data.y2 = number(),
                40 => data.radius = number(),
                50 => data.start_angle = number(),
                51 => data.end_angle = number(),
                70 => data.flags = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        if let Some(done) = entity.take() {
            self.finish_entity(done, &mut paths);
        }

        let mut job = JobDocument::new();
        job.vector = Some(VectorSection {
            paths,
            optimized: None,
        });
        Ok(job)
    }

    fn finish_entity(&self, data: EntityData, paths: &mut Vec<Polyline>) {
        match data.name.as_str() {
            "LINE" => {
                if let (Some(x1), Some(y1), Some(x2), Some(y2)) =
                    (data.x1, data.y1, data.x2, data.y2)
                {
                    paths.push(vec![[x1, y1], [x2, y2]]);
                }
            }
            "LWPOLYLINE" => {
                let mut vertices = data.vertices;
                if vertices.len() > 1 {
                    if data.flags & LWPOLYLINE_CLOSED != 0 {
                        let first = vertices[0];
                        vertices.push(first);
                    }
                    paths.push(vertices);
                }
            }
            "CIRCLE" => {
                if let (Some(cx), Some(cy), Some(r)) = (data.x1, data.y1, data.radius) {
                    if r > 0.0 {
                        paths.push(self.flatten_arc(cx, cy, r, 0.0, 360.0));
                    }
                }
            }
            "ARC" => {
                if let (Some(cx), Some(cy), Some(r), Some(start), Some(end)) = (
                    data.x1,
                    data.y1,
                    data.radius,
                    data.start_angle,
                    data.end_angle,
                ) {
                    if r > 0.0 {
                        paths.push(self.flatten_arc(cx, cy, r, start, end));
                    }
                }
            }
            other => debug!(entity = other, "skipping entity"),
        }
    }

    /// Flattens a circular arc given in degrees. DXF arcs run
    /// counter-clockwise from start to end angle.
    fn flatten_arc(&self, cx: f64, cy: f64, r: f64, start_deg: f64, end_deg: f64) -> Polyline {
        let mut sweep = end_deg - start_deg;
        if sweep <= 0.0 {
            sweep += 360.0;
        }
        let arc = Arc {
            center: Point2D::new(cx, cy),
            radii: lyon::geom::vector(r, r),
            start_angle: Angle::degrees(start_deg),
            sweep_angle: Angle::degrees(sweep),
            x_rotation: Angle::degrees(0.0),
        };
        let start = arc.from();
        let mut points: Polyline = vec![[start.x, start.y]];
        arc.for_each_cubic_bezier(&mut |curve| {
            for point in curve.flattened(self.tolerance) {
                points.push([point.x, point.y]);
            }
        });
        points
    }
}
