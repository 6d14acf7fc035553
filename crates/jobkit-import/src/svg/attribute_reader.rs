//! SVG attribute parsing.
//!
//! Parses the presentation attributes the pipeline cares about into the
//! per-tag [`Node`]. Unknown attribute names are ignored without error;
//! later attributes overwrite earlier values when a key repeats.

use jobkit_core::Transform;
use svgtypes::{Color, Length, LengthUnit, PointsParser, TransformListParser, TransformListToken};
use tracing::debug;

use super::node::Node;

/// Parser for tag attributes. One instance serves a whole parse; it
/// holds no per-tag state.
#[derive(Debug, Default)]
pub struct SvgAttributeReader;

impl SvgAttributeReader {
    pub fn new() -> Self {
        Self
    }

    /// Parses one attribute into `node`.
    pub fn read_attrib(&self, node: &mut Node, name: &str, value: &str) {
        match name {
            "id" => node.id = Some(value.to_string()),
            "transform" => {
                if let Some(t) = parse_transform(value) {
                    node.xform = t;
                }
            }
            "style" => self.read_style(node, value),
            "stroke" => node.stroke = parse_color(value),
            "fill" => node.fill = parse_color(value),
            "d" => node.d = Some(value.to_string()),
            "points" => {
                node.points = Some(PointsParser::from(value).map(|(x, y)| [x, y]).collect())
            }
            "x" => node.x = parse_length(value),
            "y" => node.y = parse_length(value),
            "width" => node.width = parse_length(value),
            "height" => node.height = parse_length(value),
            "rx" => node.rx = parse_length(value),
            "ry" => node.ry = parse_length(value),
            "r" => node.r = parse_length(value),
            "cx" => node.cx = parse_length(value),
            "cy" => node.cy = parse_length(value),
            "x1" => node.x1 = parse_length(value),
            "y1" => node.y1 = parse_length(value),
            "x2" => node.x2 = parse_length(value),
            "y2" => node.y2 = parse_length(value),
            _ => debug!(attribute = name, "ignoring attribute"),
        }
    }

    /// Re-dispatches `style="prop:val;..."` declarations through the
    /// attribute handlers, so inline style and presentation attributes
    /// share one code path.
    fn read_style(&self, node: &mut Node, value: &str) {
        for declaration in value.split(';') {
            if let Some((prop, val)) = declaration.split_once(':') {
                let prop = prop.trim();
                // Only stroke/fill are styleable here; recursing through
                // read_attrib would let style="d:..." inject geometry.
                if prop == "stroke" || prop == "fill" {
                    self.read_attrib(node, prop, val.trim());
                }
            }
        }
    }
}

/// Parses a transform list into one composed matrix, left to right.
/// Returns `None` when the list fails to parse.
fn parse_transform(value: &str) -> Option<Transform> {
    let mut combined = Transform::identity();
    for token in TransformListParser::from(value) {
        let step = match token.ok()? {
            TransformListToken::Matrix { a, b, c, d, e, f } => Transform::new(a, b, c, d, e, f),
            TransformListToken::Translate { tx, ty } => Transform::translate(tx, ty),
            TransformListToken::Scale { sx, sy } => Transform::scale(sx, sy),
            TransformListToken::Rotate { angle } => Transform::rotate(angle),
            TransformListToken::SkewX { angle } => Transform::skew_x(angle),
            TransformListToken::SkewY { angle } => Transform::skew_y(angle),
        };
        combined = combined.multiply(&step);
    }
    Some(combined)
}

/// Normalizes a paint value to a `#rrggbb` key. `none`, `inherit` and
/// values that fail to parse all clear the paint.
fn parse_color(value: &str) -> Option<String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("inherit") {
        return None;
    }
    let color: Color = value.parse().ok()?;
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        color.red, color.green, color.blue
    ))
}

/// Parses a coordinate/length value to its px-equivalent number.
/// Relative units fall back to the raw number.
fn parse_length(value: &str) -> Option<f64> {
    let length: Length = value.trim().parse().ok()?;
    let px = match length.unit {
        LengthUnit::None | LengthUnit::Px => length.number,
        LengthUnit::Mm => length.number * 96.0 / 25.4,
        LengthUnit::Cm => length.number * 96.0 / 2.54,
        LengthUnit::In => length.number * 96.0,
        LengthUnit::Pt => length.number * 96.0 / 72.0,
        LengthUnit::Pc => length.number * 16.0,
        LengthUnit::Em | LengthUnit::Ex | LengthUnit::Percent => length.number,
    };
    Some(px)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(name: &str, value: &str) -> Node {
        let mut node = Node::root();
        SvgAttributeReader::new().read_attrib(&mut node, name, value);
        node
    }

    #[test]
    fn numeric_attributes_parse_with_units() {
        assert_eq!(read("width", "100").width, Some(100.0));
        assert_eq!(read("width", "10px").width, Some(10.0));
        assert_eq!(read("x", "1in").x, Some(96.0));
        let mm = read("height", "25.4mm").height.unwrap();
        assert!((mm - 96.0).abs() < 1e-9);
    }

    #[test]
    fn colors_normalize_to_hex() {
        assert_eq!(read("stroke", "red").stroke.as_deref(), Some("#ff0000"));
        assert_eq!(read("stroke", "#0f0").stroke.as_deref(), Some("#00ff00"));
        assert_eq!(read("fill", "none").fill, None);
    }

    #[test]
    fn style_declarations_set_stroke_and_fill() {
        let mut node = Node::root();
        let reader = SvgAttributeReader::new();
        reader.read_attrib(&mut node, "style", "fill:none;stroke:#ff00ff; opacity:0.5");
        assert_eq!(node.stroke.as_deref(), Some("#ff00ff"));
        assert_eq!(node.fill, None);
    }

    #[test]
    fn later_attribute_overrides_earlier() {
        let mut node = Node::root();
        let reader = SvgAttributeReader::new();
        reader.read_attrib(&mut node, "stroke", "red");
        reader.read_attrib(&mut node, "stroke", "blue");
        assert_eq!(node.stroke.as_deref(), Some("#0000ff"));
    }

    #[test]
    fn transform_list_composes_left_to_right() {
        let node = read("transform", "translate(10,20) scale(2)");
        assert_eq!(node.xform.apply(1.0, 1.0), [12.0, 22.0]);
    }

    #[test]
    fn matrix_transform_parses_components() {
        let node = read("transform", "matrix(1,0,0,1,5,6)");
        assert_eq!(node.xform, Transform::translate(5.0, 6.0));
    }

    #[test]
    fn points_parse_into_pairs() {
        let node = read("points", "0,0 1,0 1,1");
        assert_eq!(
            node.points,
            Some(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]])
        );
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let node = read("filter", "url(#blur)");
        assert!(node.id.is_none());
        assert!(node.d.is_none());
    }
}
