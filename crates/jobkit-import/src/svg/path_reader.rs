//! Path geometry consumer.
//!
//! Receives canonical path commands from the tag handlers (or a raw `d`
//! attribute, whose relative and shorthand forms are resolved here),
//! flattens curves and arcs to the parse tolerance, maps every vertex
//! through the tag's accumulated world transform, and accumulates the
//! resulting polylines keyed by stroke color for pass assignment.

use std::collections::BTreeMap;

use jobkit_core::{PathCommand, Polyline, Transform};
use lyon::geom::euclid::default::Point2D;
use lyon::geom::{Angle, Arc, ArcFlags, CubicBezierSegment, QuadraticBezierSegment, SvgArc};
use svgtypes::{PathParser, PathSegment};

use crate::error::{ImportError, ImportResult};

use super::node::Node;

/// Fallback boundary key for geometry with no resolvable stroke color.
const DEFAULT_COLOR: &str = "#000000";

/// Accumulates flattened boundary geometry for one parse, keyed by
/// color. Scoped to a single conversion: the tolerance is fixed at
/// construction and the collected boundaries are taken at the end.
#[derive(Debug)]
pub struct SvgPathReader {
    tolerance: f64,
    boundarys: BTreeMap<String, Vec<Polyline>>,
}

impl SvgPathReader {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            boundarys: BTreeMap::new(),
        }
    }

    /// Adds a canonical command sequence produced by a shape handler.
    pub fn add_path(&mut self, commands: &[PathCommand], node: &Node) {
        let mut tracer = Tracer::new(self.tolerance, node.xform_to_world);
        for command in commands {
            tracer.command(*command);
        }
        self.store(tracer.finish(), node);
    }

    /// Adds a raw `d` attribute: parses the full SVG path grammar,
    /// resolves relative coordinates and the `S`/`T` shorthands, and
    /// feeds the flattening core.
    pub fn add_raw(&mut self, d: &str, node: &Node) -> ImportResult<()> {
        let mut tracer = Tracer::new(self.tolerance, node.xform_to_world);
        let mut prev: Option<PathSegment> = None;
        for segment in PathParser::from(d) {
            let segment = segment.map_err(|e| ImportError::Svg(e.to_string()))?;
            tracer.raw_segment(segment, prev);
            prev = Some(segment);
        }
        self.store(tracer.finish(), node);
        Ok(())
    }

    /// The boundary map accumulated over the parse.
    pub fn into_boundarys(self) -> BTreeMap<String, Vec<Polyline>> {
        self.boundarys
    }

    fn store(&mut self, paths: Vec<Polyline>, node: &Node) {
        if paths.is_empty() {
            return;
        }
        let color = node
            .stroke
            .clone()
            .or_else(|| node.fill.clone())
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        self.boundarys.entry(color).or_default().extend(paths);
    }
}

/// Flattening pen: walks absolute commands, keeping the untransformed
/// current point for geometry and emitting world-space vertices.
struct Tracer {
    tolerance: f64,
    xform: Transform,
    current: (f64, f64),
    subpath_start: (f64, f64),
    line: Polyline,
    out: Vec<Polyline>,
}

impl Tracer {
    fn new(tolerance: f64, xform: Transform) -> Self {
        Self {
            tolerance,
            xform,
            current: (0.0, 0.0),
            subpath_start: (0.0, 0.0),
            line: Polyline::new(),
            out: Vec::new(),
        }
    }

    fn command(&mut self, command: PathCommand) {
        match command {
            PathCommand::MoveTo { x, y } => self.move_to(x, y),
            PathCommand::LineTo { x, y } => self.line_to(x, y),
            PathCommand::HorizontalTo { x } => self.line_to(x, self.current.1),
            PathCommand::VerticalTo { y } => self.line_to(self.current.0, y),
            PathCommand::CurveTo {
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => self.cubic_to(x1, y1, x2, y2, x, y),
            PathCommand::ArcTo {
                rx,
                ry,
                x_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => self.arc_to(rx, ry, x_rotation, large_arc, sweep, x, y),
            PathCommand::ClosePath => self.close(),
        }
    }

    /// One segment of the raw `d` grammar, resolved to absolute
    /// coordinates. `prev` feeds the smooth-shorthand control-point
    /// mirroring.
    fn raw_segment(&mut self, segment: PathSegment, prev: Option<PathSegment>) {
        let (cx, cy) = self.current;
        match segment {
            PathSegment::MoveTo { abs, x, y } => {
                let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                self.move_to(x, y);
            }
            PathSegment::LineTo { abs, x, y } => {
                let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                self.line_to(x, y);
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                let x = if abs { x } else { cx + x };
                self.line_to(x, cy);
            }
            PathSegment::VerticalLineTo { abs, y } => {
                let y = if abs { y } else { cy + y };
                self.line_to(cx, y);
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let (x1, y1, x2, y2, x, y) = if abs {
                    (x1, y1, x2, y2, x, y)
                } else {
                    (cx + x1, cy + y1, cx + x2, cy + y2, cx + x, cy + y)
                };
                self.cubic_to(x1, y1, x2, y2, x, y);
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let (x1, y1) = mirror_cubic_control(prev, (cx, cy));
                let (x2, y2, x, y) = if abs {
                    (x2, y2, x, y)
                } else {
                    (cx + x2, cy + y2, cx + x, cy + y)
                };
                self.cubic_to(x1, y1, x2, y2, x, y);
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let (x1, y1, x, y) = if abs {
                    (x1, y1, x, y)
                } else {
                    (cx + x1, cy + y1, cx + x, cy + y)
                };
                self.quadratic_to(x1, y1, x, y);
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let (x1, y1) = mirror_quadratic_control(prev, (cx, cy));
                let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                self.quadratic_to(x1, y1, x, y);
            }
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let (x, y) = if abs { (x, y) } else { (cx + x, cy + y) };
                self.arc_to(rx, ry, x_axis_rotation, large_arc, sweep, x, y);
            }
            PathSegment::ClosePath { .. } => self.close(),
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.flush();
        self.current = (x, y);
        self.subpath_start = (x, y);
        self.line.push(self.xform.apply(x, y));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_started();
        self.current = (x, y);
        self.line.push(self.xform.apply(x, y));
    }

    fn cubic_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64) {
        self.ensure_started();
        let curve = CubicBezierSegment {
            from: Point2D::new(self.current.0, self.current.1),
            ctrl1: Point2D::new(x1, y1),
            ctrl2: Point2D::new(x2, y2),
            to: Point2D::new(x, y),
        };
        for point in curve.flattened(self.tolerance) {
            self.line.push(self.xform.apply(point.x, point.y));
        }
        self.current = (x, y);
    }

    fn quadratic_to(&mut self, x1: f64, y1: f64, x: f64, y: f64) {
        self.ensure_started();
        let curve = QuadraticBezierSegment {
            from: Point2D::new(self.current.0, self.current.1),
            ctrl: Point2D::new(x1, y1),
            to: Point2D::new(x, y),
        };
        for point in curve.flattened(self.tolerance) {
            self.line.push(self.xform.apply(point.x, point.y));
        }
        self.current = (x, y);
    }

    fn arc_to(
        &mut self,
        rx: f64,
        ry: f64,
        x_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    ) {
        self.ensure_started();
        // Degenerate radii draw a straight line, per the SVG arc rules.
        if rx == 0.0 || ry == 0.0 || (self.current.0 == x && self.current.1 == y) {
            self.line_to(x, y);
            return;
        }
        let svg_arc = SvgArc {
            from: Point2D::new(self.current.0, self.current.1),
            to: Point2D::new(x, y),
            radii: lyon::geom::vector(rx.abs(), ry.abs()),
            x_rotation: Angle::degrees(x_rotation),
            flags: ArcFlags { large_arc, sweep },
        };
        let arc = Arc::from_svg_arc(&svg_arc);
        arc.for_each_cubic_bezier(&mut |curve| {
            for point in curve.flattened(self.tolerance) {
                self.line.push(self.xform.apply(point.x, point.y));
            }
        });
        self.current = (x, y);
    }

    fn close(&mut self) {
        if !self.line.is_empty() {
            let (x, y) = self.subpath_start;
            self.line.push(self.xform.apply(x, y));
        }
        self.flush();
        self.current = self.subpath_start;
    }

    /// A drawing command with no preceding move starts its subpath at
    /// the current point, so the polyline always has an origin vertex.
    fn ensure_started(&mut self) {
        if self.line.is_empty() {
            let (x, y) = self.current;
            self.line.push(self.xform.apply(x, y));
        }
    }

    fn flush(&mut self) {
        if self.line.len() > 1 {
            self.out.push(std::mem::take(&mut self.line));
        } else {
            self.line.clear();
        }
    }

    fn finish(mut self) -> Vec<Polyline> {
        self.flush();
        self.out
    }
}

/// Reflects the previous cubic control point about the current point;
/// falls back to the current point when the previous segment was not a
/// cubic, per the SVG smooth-curve rules.
fn mirror_cubic_control(prev: Option<PathSegment>, current: (f64, f64)) -> (f64, f64) {
    match prev {
        Some(PathSegment::CurveTo { x2, y2, x, y, abs, x1: _, y1: _ }) => mirror(abs, x2, y2, x, y, current),
        Some(PathSegment::SmoothCurveTo { x2, y2, x, y, abs }) => {
            mirror(abs, x2, y2, x, y, current)
        }
        _ => current,
    }
}

/// Reflects the previous quadratic control point about the current
/// point. Smooth-quadratic chains are rare in machine drawings; a `T`
/// following another `T` degrades to a line-like curve here.
fn mirror_quadratic_control(prev: Option<PathSegment>, current: (f64, f64)) -> (f64, f64) {
    match prev {
        Some(PathSegment::Quadratic { x1, y1, x, y, abs }) => mirror(abs, x1, y1, x, y, current),
        _ => current,
    }
}

fn mirror(
    abs: bool,
    ctrl_x: f64,
    ctrl_y: f64,
    end_x: f64,
    end_y: f64,
    current: (f64, f64),
) -> (f64, f64) {
    if abs {
        // current == previous end point, so reflect the absolute control
        // point about it.
        (2.0 * current.0 - ctrl_x, 2.0 * current.1 - ctrl_y)
    } else {
        // Relative: the previous control/end were deltas from the
        // previous start; the mirrored control is current + (end - ctrl).
        (current.0 + end_x - ctrl_x, current.1 + end_y - ctrl_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> SvgPathReader {
        SvgPathReader::new(0.1)
    }

    fn node_with_stroke(color: &str) -> Node {
        let mut node = Node::root();
        node.stroke = Some(color.to_string());
        node
    }

    #[test]
    fn line_commands_pass_through() {
        let mut r = reader();
        let node = node_with_stroke("#ff0000");
        r.add_path(
            &[
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::LineTo { x: 10.0, y: 0.0 },
                PathCommand::VerticalTo { y: 5.0 },
            ],
            &node,
        );
        let boundarys = r.into_boundarys();
        let paths = &boundarys["#ff0000"];
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0], vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0]]);
    }

    #[test]
    fn close_returns_to_subpath_start() {
        let mut r = reader();
        let node = node_with_stroke("#000000");
        r.add_path(
            &[
                PathCommand::MoveTo { x: 1.0, y: 2.0 },
                PathCommand::LineTo { x: 5.0, y: 2.0 },
                PathCommand::LineTo { x: 5.0, y: 6.0 },
                PathCommand::ClosePath,
            ],
            &node,
        );
        let boundarys = r.into_boundarys();
        let path = &boundarys["#000000"][0];
        assert_eq!(path.first(), path.last());
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn world_transform_applies_to_vertices() {
        let mut r = reader();
        let mut node = node_with_stroke("#000000");
        node.xform_to_world = Transform::translate(100.0, 0.0);
        r.add_path(
            &[
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::LineTo { x: 1.0, y: 1.0 },
            ],
            &node,
        );
        let boundarys = r.into_boundarys();
        assert_eq!(boundarys["#000000"][0], vec![[100.0, 0.0], [101.0, 1.0]]);
    }

    #[test]
    fn cubic_flattening_hits_endpoints_within_tolerance() {
        let mut r = SvgPathReader::new(0.01);
        let node = node_with_stroke("#000000");
        r.add_path(
            &[
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::CurveTo {
                    x1: 0.0,
                    y1: 10.0,
                    x2: 10.0,
                    y2: 10.0,
                    x: 10.0,
                    y: 0.0,
                },
            ],
            &node,
        );
        let boundarys = r.into_boundarys();
        let path = &boundarys["#000000"][0];
        assert_eq!(path[0], [0.0, 0.0]);
        let [lx, ly] = path[path.len() - 1];
        assert!((lx - 10.0).abs() < 1e-9 && ly.abs() < 1e-9);
        assert!(path.len() > 3, "curve should flatten to several vertices");
    }

    #[test]
    fn raw_relative_path_resolves_to_absolute() {
        let mut r = reader();
        let node = node_with_stroke("#000000");
        r.add_raw("m 1 1 l 2 0 l 0 2", &node).unwrap();
        let boundarys = r.into_boundarys();
        assert_eq!(
            boundarys["#000000"][0],
            vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0]]
        );
    }

    #[test]
    fn raw_path_parse_error_propagates() {
        let mut r = reader();
        let node = node_with_stroke("#000000");
        assert!(r.add_raw("M 0 0 L bogus", &node).is_err());
    }

    #[test]
    fn boundaries_group_by_color() {
        let mut r = reader();
        let red = node_with_stroke("#ff0000");
        let blue = node_with_stroke("#0000ff");
        let open = [
            PathCommand::MoveTo { x: 0.0, y: 0.0 },
            PathCommand::LineTo { x: 1.0, y: 0.0 },
        ];
        r.add_path(&open, &red);
        r.add_path(&open, &blue);
        r.add_path(&open, &red);
        let boundarys = r.into_boundarys();
        assert_eq!(boundarys["#ff0000"].len(), 2);
        assert_eq!(boundarys["#0000ff"].len(), 1);
    }

    #[test]
    fn single_vertex_subpaths_are_discarded() {
        let mut r = reader();
        let node = node_with_stroke("#000000");
        r.add_path(&[PathCommand::MoveTo { x: 4.0, y: 4.0 }], &node);
        assert!(r.into_boundarys().is_empty());
    }
}
