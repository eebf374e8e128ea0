use geo_types::{coord, LineString, MultiPolygon, Polygon, Rect};
use ordered_float::OrderedFloat;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// A region drawn over one plane (or every plane) of an image.
#[derive(Debug, Clone)]
pub struct Roi {
    /// Optional label, only used to identify the ROI in messages.
    pub name: Option<String>,
    /// Outline of the region. Interior rings are holes, member polygons may
    /// overlap each other and rings may self-intersect.
    pub outline: MultiPolygon<f64>,
    /// 1-based stack slice the ROI was drawn on, 0 when it was drawn on a
    /// single-plane image.
    pub position: u32,
    /// Class group, 0 when the ROI is ungrouped.
    pub group: u32,
}

impl Hash for Roi {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.name.hash(state);
        self.position.hash(state);
        self.group.hash(state);
        self.to_ordered_float_outline().hash(state);
    }
}

impl PartialEq for Roi {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq(&other.name)
            && self.position == other.position
            && self.group == other.group
            && self
                .to_ordered_float_outline()
                .eq(&other.to_ordered_float_outline())
    }
}

impl Eq for Roi {}

impl Display for Roi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "ROI '{name}'"),
            None => write!(f, "unnamed ROI"),
        }?;
        write!(f, " (position {}, group {})", self.position, self.group)
    }
}

fn ordered_ring(ring: &LineString<f64>) -> LineString<OrderedFloat<f64>> {
    ring.coords()
        .map(|&c| coord! {x: OrderedFloat(c.x), y: OrderedFloat(c.y)})
        .collect()
}

impl Roi {
    /// Ungrouped ROI at position 0 with the given outline.
    pub fn new(outline: impl Into<MultiPolygon<f64>>) -> Self {
        Roi {
            name: None,
            outline: outline.into(),
            position: 0,
            group: 0,
        }
    }

    /// Axis-aligned rectangle covering `[x, x + width) x [y, y + height)`.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Rect::new(coord! {x: x, y: y}, coord! {x: x + width, y: y + height}).to_polygon())
    }

    /// Closed polygon through the given vertices.
    pub fn polygon(vertices: &[(f64, f64)]) -> Self {
        Self::new(Polygon::new(LineString::from(vertices.to_vec()), vec![]))
    }

    /// Sets the slice position.
    pub fn with_position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }

    /// Sets the class group.
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Outline with coordinates wrapped so that it can be hashed and compared exactly.
    pub fn to_ordered_float_outline(&self) -> MultiPolygon<OrderedFloat<f64>> {
        self.outline
            .iter()
            .map(|polygon| {
                Polygon::new(
                    ordered_ring(polygon.exterior()),
                    polygon.interiors().iter().map(ordered_ring).collect(),
                )
            })
            .collect()
    }
}
