//! Scan conversion of ROI outlines into pixel spans.
//!
//! A pixel `(x, y)` belongs to an outline when its center `(x + 0.5, y + 0.5)`
//! is inside according to the fill rule. Every ring of every polygon of the
//! outline contributes edges, so holes, composite outlines and self-intersecting
//! rings are resolved by the rule alone. Horizontal edges never cross a pixel
//! center row and are ignored; other edges are half-open in y so that a vertex
//! shared by two edges is counted once.

use geo_types::MultiPolygon;
use std::ops::Range;
use strum_macros::{Display, EnumString};

/// Decides which parts of an outline are interior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum FillRule {
    /// Inside when a ray from the point crosses the outline an odd number of
    /// times. This is the rule of the ImageJ polygon filler.
    #[default]
    EvenOdd,
    /// Inside when the signed number of crossings is not zero.
    NonZero,
}

/// Strategy turning an outline into runs of interior pixels.
pub trait SpanFiller {
    /// Calls `span(y, xs)` for each run of interior pixels of row `y`, clipped
    /// to a `width x height` canvas. Spans of one row do not overlap.
    fn fill_spans(
        &self,
        outline: &MultiPolygon<f64>,
        width: usize,
        height: usize,
        span: &mut dyn FnMut(usize, Range<usize>),
    );
}

/// Active-edge scanline filler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanlineFiller {
    pub rule: FillRule,
}

impl ScanlineFiller {
    pub fn new(rule: FillRule) -> Self {
        ScanlineFiller { rule }
    }
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    /// +1 for edges going down the image, -1 for edges going up
    winding: i32,
}

impl Edge {
    fn x_at(&self, y: f64) -> f64 {
        self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0)
    }
}

fn collect_edges(outline: &MultiPolygon<f64>) -> Vec<Edge> {
    outline
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.lines())
        .filter(|line| line.start.y != line.end.y)
        .map(|line| {
            let (top, bottom, winding) = if line.start.y < line.end.y {
                (line.start, line.end, 1)
            } else {
                (line.end, line.start, -1)
            };
            Edge {
                x0: top.x,
                y0: top.y,
                x1: bottom.x,
                y1: bottom.y,
                winding,
            }
        })
        .collect()
}

/// First pixel index whose center is at or after `coord`, clamped to `[0, limit]`.
fn first_center_at_or_after(coord: f64, limit: usize) -> usize {
    (coord - 0.5).ceil().clamp(0.0, limit as f64) as usize
}

impl SpanFiller for ScanlineFiller {
    fn fill_spans(
        &self,
        outline: &MultiPolygon<f64>,
        width: usize,
        height: usize,
        span: &mut dyn FnMut(usize, Range<usize>),
    ) {
        let mut edges = collect_edges(outline);
        if edges.is_empty() || width == 0 {
            return;
        }
        edges.sort_by(|a, b| a.y0.total_cmp(&b.y0));

        let top = edges[0].y0;
        let bottom = edges.iter().map(|e| e.y1).fold(f64::MIN, f64::max);
        let rows = first_center_at_or_after(top, height)..first_center_at_or_after(bottom, height);

        let mut next_edge = 0;
        let mut active: Vec<Edge> = Vec::new();
        let mut crossings: Vec<(f64, i32)> = Vec::new();

        for y in rows {
            let yc = y as f64 + 0.5;
            while next_edge < edges.len() && edges[next_edge].y0 <= yc {
                active.push(edges[next_edge]);
                next_edge += 1;
            }
            active.retain(|e| e.y1 > yc);

            crossings.clear();
            crossings.extend(active.iter().map(|e| (e.x_at(yc), e.winding)));
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut emit = |from: f64, to: f64| {
                let xs = first_center_at_or_after(from, width)..first_center_at_or_after(to, width);
                if !xs.is_empty() {
                    span(y, xs);
                }
            };

            match self.rule {
                FillRule::EvenOdd => {
                    for pair in crossings.chunks_exact(2) {
                        emit(pair[0].0, pair[1].0);
                    }
                }
                FillRule::NonZero => {
                    let mut winding = 0;
                    let mut start = 0.0;
                    for &(x, w) in &crossings {
                        if winding == 0 {
                            start = x;
                        }
                        winding += w;
                        if winding == 0 {
                            emit(start, x);
                        }
                    }
                }
            }
        }
    }
}
