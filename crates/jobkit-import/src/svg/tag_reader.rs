//! Tag normalizer.
//!
//! Reduces every supported SVG drawing primitive to the canonical
//! path-command grammar. The walker hands each tag here together with
//! its [`Node`] context; this module parses the tag's attributes,
//! folds the tag's local transform into the accumulated world
//! transform, and rewrites the tag's geometry as canonical commands for
//! the path consumer. Numeric flattening never happens here - that is
//! the consumer's job.

use jobkit_core::PathCommand;
use tracing::{debug, warn};

use crate::error::ImportResult;

use super::attribute_reader::SvgAttributeReader;
use super::node::Node;
use super::path_reader::SvgPathReader;

/// The closed set of recognized tag kinds.
///
/// Anything outside this set is skipped entirely: no attribute parsing,
/// no transform accumulation, no geometry. The walker still visits the
/// children of a skipped tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvgTag {
    Group,
    Path,
    Polygon,
    Polyline,
    Rect,
    Line,
    Circle,
    Ellipse,
    Image,
    Defs,
    Style,
}

impl SvgTag {
    /// Maps a tag's local name (namespace prefix already stripped) to
    /// its kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "g" => Some(SvgTag::Group),
            "path" => Some(SvgTag::Path),
            "polygon" => Some(SvgTag::Polygon),
            "polyline" => Some(SvgTag::Polyline),
            "rect" => Some(SvgTag::Rect),
            "line" => Some(SvgTag::Line),
            "circle" => Some(SvgTag::Circle),
            "ellipse" => Some(SvgTag::Ellipse),
            "image" => Some(SvgTag::Image),
            "defs" => Some(SvgTag::Defs),
            "style" => Some(SvgTag::Style),
            _ => None,
        }
    }
}

/// Normalizes one tag at a time. Holds the attribute reader; all walk
/// state travels through the [`Node`] context, so a reader instance is
/// reentrant within its parse.
#[derive(Debug, Default)]
pub struct SvgTagReader {
    attrib_reader: SvgAttributeReader,
}

impl SvgTagReader {
    pub fn new() -> Self {
        Self {
            attrib_reader: SvgAttributeReader::new(),
        }
    }

    /// Reads one tag: attribute pass, transform accumulation, shape
    /// dispatch. `node` arrives carrying the parent's accumulated
    /// transform and inherited style.
    pub fn read_tag(
        &self,
        tag: &roxmltree::Node<'_, '_>,
        node: &mut Node,
        paths: &mut SvgPathReader,
    ) -> ImportResult<()> {
        let Some(kind) = SvgTag::from_name(tag.tag_name().name()) else {
            return Ok(());
        };
        debug!(tag = tag.tag_name().name(), "reading tag");

        for attr in tag.attributes() {
            self.attrib_reader
                .read_attrib(node, attr.name(), attr.value());
        }
        node.xform_to_world = node.xform_to_world.multiply(&node.xform);

        match kind {
            // Groups emit no geometry of their own; they only accumulate
            // transform and style for their descendants.
            SvgTag::Group => {}
            SvgTag::Path => {
                if let Some(d) = node.d.take() {
                    paths.add_raw(&d, node)?;
                }
            }
            SvgTag::Polygon => {
                if let Some(cmds) = polygon_commands(node) {
                    paths.add_path(&cmds, node);
                }
            }
            SvgTag::Polyline => {
                if let Some(cmds) = polyline_commands(node) {
                    paths.add_path(&cmds, node);
                }
            }
            SvgTag::Rect => paths.add_path(&rect_commands(node), node),
            SvgTag::Line => paths.add_path(&line_commands(node), node),
            SvgTag::Circle => {
                if let Some(cmds) = circle_commands(node) {
                    paths.add_path(&cmds, node);
                }
            }
            SvgTag::Ellipse => {
                if let Some(cmds) = ellipse_commands(node) {
                    paths.add_path(&cmds, node);
                }
            }
            SvgTag::Image => warn!("'image' tag is not supported, ignored"),
            SvgTag::Defs => warn!("'defs' tag is not supported, ignored"),
            SvgTag::Style => warn!(
                "'style' tag is not supported, use presentation attributes \
                 or the style attribute instead"
            ),
        }
        Ok(())
    }
}

/// `M <points> Z` - closed vertex chain.
fn polygon_commands(node: &Node) -> Option<Vec<PathCommand>> {
    let mut cmds = open_point_chain(node)?;
    cmds.push(PathCommand::ClosePath);
    Some(cmds)
}

/// `M <points>` - open vertex chain.
fn polyline_commands(node: &Node) -> Option<Vec<PathCommand>> {
    open_point_chain(node)
}

fn open_point_chain(node: &Node) -> Option<Vec<PathCommand>> {
    let points = node.points.as_deref()?;
    let (&[x, y], rest) = points.split_first()?;
    let mut cmds = Vec::with_capacity(points.len() + 1);
    cmds.push(PathCommand::MoveTo { x, y });
    cmds.extend(rest.iter().map(|&[x, y]| PathCommand::LineTo { x, y }));
    Some(cmds)
}

/// Axis-aligned rectangle, with the optional quarter-round corners.
fn rect_commands(node: &Node) -> Vec<PathCommand> {
    let x = node.x.unwrap_or(0.0);
    let y = node.y.unwrap_or(0.0);
    let w = node.width.unwrap_or(0.0);
    let h = node.height.unwrap_or(0.0);

    let (rx, ry) = match (node.rx, node.ry) {
        (Some(rx), Some(ry)) => (rx.abs(), ry.abs()),
        // Either radius absent: sharp corners.
        _ => (0.0, 0.0),
    };
    // A single meaningful radius mirrors onto the other axis.
    let (rx, ry) = if rx > 0.0 && ry == 0.0 {
        (rx, rx)
    } else if ry > 0.0 && rx == 0.0 {
        (ry, ry)
    } else {
        (rx, ry)
    };

    if rx == 0.0 || ry == 0.0 {
        return vec![
            PathCommand::MoveTo { x, y },
            PathCommand::HorizontalTo { x: x + w },
            PathCommand::VerticalTo { y: y + h },
            PathCommand::HorizontalTo { x },
            PathCommand::ClosePath,
        ];
    }

    // Eight segments clockwise from the top-left corner's end: straight
    // run, then a quarter-round whose control offsets are the corner
    // radii (a cubic approximation, bounded by the drawing tolerance).
    vec![
        PathCommand::MoveTo { x: x + rx, y },
        PathCommand::HorizontalTo { x: x + w - rx },
        PathCommand::CurveTo {
            x1: x + w,
            y1: y,
            x2: x + w,
            y2: y + ry,
            x: x + w,
            y: y + ry,
        },
        PathCommand::VerticalTo { y: y + h - ry },
        PathCommand::CurveTo {
            x1: x + w,
            y1: y + h,
            x2: x + w - rx,
            y2: y + h,
            x: x + w - rx,
            y: y + h,
        },
        PathCommand::HorizontalTo { x: x + rx },
        PathCommand::CurveTo {
            x1: x,
            y1: y + h,
            x2: x,
            y2: y + h - ry,
            x,
            y: y + h - ry,
        },
        PathCommand::VerticalTo { y: y + ry },
        PathCommand::CurveTo {
            x1: x,
            y1: y,
            x2: x + rx,
            y2: y,
            x: x + rx,
            y,
        },
        PathCommand::ClosePath,
    ]
}

/// Two-point open segment.
fn line_commands(node: &Node) -> Vec<PathCommand> {
    vec![
        PathCommand::MoveTo {
            x: node.x1.unwrap_or(0.0),
            y: node.y1.unwrap_or(0.0),
        },
        PathCommand::LineTo {
            x: node.x2.unwrap_or(0.0),
            y: node.y2.unwrap_or(0.0),
        },
    ]
}

/// Four quadrant arcs through the cardinal points, closed. Sweep flag
/// stays 0 on every quadrant, matching the established output of this
/// pipeline; downstream offsetting must not assume counter-clockwise
/// winding.
fn circle_commands(node: &Node) -> Option<Vec<PathCommand>> {
    let r = node.r?;
    quadrant_arcs(node.cx.unwrap_or(0.0), node.cy.unwrap_or(0.0), r, r)
}

/// As circle, with independent radii.
fn ellipse_commands(node: &Node) -> Option<Vec<PathCommand>> {
    let (rx, ry) = (node.rx?, node.ry?);
    quadrant_arcs(node.cx.unwrap_or(0.0), node.cy.unwrap_or(0.0), rx, ry)
}

fn quadrant_arcs(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Vec<PathCommand>> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }
    let arc = |x: f64, y: f64| PathCommand::ArcTo {
        rx,
        ry,
        x_rotation: 0.0,
        large_arc: false,
        sweep: false,
        x,
        y,
    };
    Some(vec![
        PathCommand::MoveTo { x: cx - rx, y: cy },
        arc(cx, cy + ry),
        arc(cx + rx, cy),
        arc(cx, cy - ry),
        arc(cx - rx, cy),
        PathCommand::ClosePath,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobkit_core::path::starts_with_move;

    fn node() -> Node {
        Node::root()
    }

    #[test]
    fn tag_names_map_to_kinds() {
        assert_eq!(SvgTag::from_name("rect"), Some(SvgTag::Rect));
        assert_eq!(SvgTag::from_name("g"), Some(SvgTag::Group));
        assert_eq!(SvgTag::from_name("text"), None);
        assert_eq!(SvgTag::from_name("clipPath"), None);
    }

    #[test]
    fn plain_rect_is_a_closed_four_segment_loop() {
        let mut n = node();
        n.width = Some(10.0);
        n.height = Some(5.0);
        let cmds = rect_commands(&n);
        assert!(starts_with_move(&cmds));
        assert_eq!(
            cmds,
            vec![
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::HorizontalTo { x: 10.0 },
                PathCommand::VerticalTo { y: 5.0 },
                PathCommand::HorizontalTo { x: 0.0 },
                PathCommand::ClosePath,
            ]
        );
    }

    #[test]
    fn rounded_rect_has_eight_drawing_segments_starting_inside_top_edge() {
        let mut n = node();
        n.width = Some(10.0);
        n.height = Some(5.0);
        n.rx = Some(2.0);
        n.ry = Some(2.0);
        let cmds = rect_commands(&n);
        assert_eq!(cmds.first(), Some(&PathCommand::MoveTo { x: 2.0, y: 0.0 }));
        assert_eq!(cmds.last(), Some(&PathCommand::ClosePath));
        let drawing: Vec<_> = cmds.iter().filter(|c| c.is_drawing()).collect();
        assert_eq!(drawing.len(), 8);
        let curves = drawing
            .iter()
            .filter(|c| matches!(c, PathCommand::CurveTo { .. }))
            .count();
        assert_eq!(curves, 4);
    }

    #[test]
    fn negative_radii_lose_their_sign() {
        let mut n = node();
        n.width = Some(10.0);
        n.height = Some(10.0);
        n.rx = Some(-3.0);
        n.ry = Some(-3.0);
        let cmds = rect_commands(&n);
        assert_eq!(cmds.first(), Some(&PathCommand::MoveTo { x: 3.0, y: 0.0 }));
    }

    #[test]
    fn single_radius_mirrors_to_the_other_axis() {
        let mut n = node();
        n.width = Some(10.0);
        n.height = Some(10.0);
        n.rx = Some(2.0);
        n.ry = Some(0.0);
        let cmds = rect_commands(&n);
        // Mirrored ry shows up in the first corner curve's endpoint.
        assert!(cmds
            .iter()
            .any(|c| matches!(c, PathCommand::CurveTo { x, y, .. } if *x == 10.0 && *y == 2.0)));
    }

    #[test]
    fn circle_emits_four_quadrant_arcs() {
        let mut n = node();
        n.r = Some(5.0);
        let cmds = circle_commands(&n).unwrap();
        assert_eq!(cmds.first(), Some(&PathCommand::MoveTo { x: -5.0, y: 0.0 }));
        assert_eq!(cmds.last(), Some(&PathCommand::ClosePath));
        let arcs: Vec<_> = cmds
            .iter()
            .filter(|c| matches!(c, PathCommand::ArcTo { .. }))
            .collect();
        assert_eq!(arcs.len(), 4);
        // Quadrant endpoints sit on the cardinal points.
        assert!(matches!(arcs[0], PathCommand::ArcTo { x, y, .. } if *x == 0.0 && *y == 5.0));
        assert!(matches!(arcs[2], PathCommand::ArcTo { x, y, .. } if *x == 0.0 && *y == -5.0));
    }

    #[test]
    fn zero_radius_circle_emits_nothing() {
        let mut n = node();
        n.r = Some(0.0);
        assert!(circle_commands(&n).is_none());
        n.r = Some(-1.0);
        assert!(circle_commands(&n).is_none());
        n.r = None;
        assert!(circle_commands(&n).is_none());
    }

    #[test]
    fn ellipse_requires_both_radii() {
        let mut n = node();
        n.rx = Some(4.0);
        assert!(ellipse_commands(&n).is_none());
        n.ry = Some(2.0);
        let cmds = ellipse_commands(&n).unwrap();
        assert_eq!(cmds.len(), 6);
    }

    #[test]
    fn polygon_closes_and_polyline_stays_open() {
        let mut n = node();
        n.points = Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        let polygon = polygon_commands(&n).unwrap();
        assert_eq!(
            polygon,
            vec![
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::LineTo { x: 1.0, y: 0.0 },
                PathCommand::LineTo { x: 1.0, y: 1.0 },
                PathCommand::ClosePath,
            ]
        );
        let polyline = polyline_commands(&n).unwrap();
        assert_eq!(polyline.len(), 3);
        assert!(!polyline.contains(&PathCommand::ClosePath));
    }

    #[test]
    fn empty_point_list_emits_nothing() {
        let mut n = node();
        n.points = Some(vec![]);
        assert!(polygon_commands(&n).is_none());
        n.points = None;
        assert!(polyline_commands(&n).is_none());
    }

    #[test]
    fn line_defaults_missing_coordinates_to_zero() {
        let mut n = node();
        n.x2 = Some(3.0);
        n.y2 = Some(4.0);
        assert_eq!(
            line_commands(&n),
            vec![
                PathCommand::MoveTo { x: 0.0, y: 0.0 },
                PathCommand::LineTo { x: 3.0, y: 4.0 },
            ]
        );
    }
}
