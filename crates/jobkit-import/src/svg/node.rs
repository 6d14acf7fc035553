//! Per-tag parse context.

use jobkit_core::Transform;

/// Transient context for one tag visit.
///
/// Holds the attributes parsed so far, the tag's local transform, and
/// the transform accumulated from the root down to this tag. A node is
/// created per tag by the tree walker, populated by the attribute
/// reader and the tag handlers, and discarded when the visit returns -
/// it is never shared between concurrent visits, so the walk stays
/// reentrant.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub id: Option<String>,
    /// Effective stroke color, inherited by descendants.
    pub stroke: Option<String>,
    /// Effective fill color, inherited by descendants.
    pub fill: Option<String>,
    /// Raw path data of a `path` tag.
    pub d: Option<String>,
    /// Vertex list of a `polygon`/`polyline` tag.
    pub points: Option<Vec<[f64; 2]>>,

    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rx: Option<f64>,
    pub ry: Option<f64>,
    pub r: Option<f64>,
    pub cx: Option<f64>,
    pub cy: Option<f64>,
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub x2: Option<f64>,
    pub y2: Option<f64>,

    /// The tag's own transform.
    pub xform: Transform,
    /// Accumulated transform from the root to this tag.
    pub xform_to_world: Transform,
}

impl Node {
    /// Context for the document root: identity transforms, nothing
    /// inherited.
    pub fn root() -> Self {
        Self::default()
    }

    /// Derives the context a child tag starts from: the accumulated
    /// world transform and inheritable style carry over, everything
    /// element-specific resets.
    pub fn child(&self) -> Self {
        Node {
            stroke: self.stroke.clone(),
            fill: self.fill.clone(),
            xform_to_world: self.xform_to_world,
            ..Node::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_inherits_style_and_world_transform() {
        let mut parent = Node::root();
        parent.stroke = Some("#ff0000".into());
        parent.d = Some("M 0 0".into());
        parent.xform_to_world = Transform::translate(5.0, 5.0);

        let child = parent.child();
        assert_eq!(child.stroke.as_deref(), Some("#ff0000"));
        assert_eq!(child.xform_to_world, Transform::translate(5.0, 5.0));
        // Element-specific state must not leak into children.
        assert!(child.d.is_none());
        assert_eq!(child.xform, Transform::identity());
    }
}
