//! Polyline tessellation with lyon.
//!
//! Input is already flattened (see [`crate::geometry::flatten`]); output is an
//! indexed triangle list in the same coordinate space.

use lyon::math::point;
use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, StrokeOptions,
    StrokeTessellator, StrokeVertex, VertexBuffers,
};

use crate::coords::{Rect, Vec2};
use crate::geometry::flatten::{dash_polyline, Polyline};
use crate::paint::{LineCap, LineJoin, StrokeStyleDesc};

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Mesh {
    pub positions: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn quad(rect: Rect) -> Self {
        let r = rect.normalized();
        let (min, max) = (r.min(), r.max());
        Self {
            positions: vec![
                min,
                Vec2::new(max.x, min.y),
                max,
                Vec2::new(min.x, max.y),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    fn from_buffers(buffers: VertexBuffers<Vec2, u32>) -> Self {
        Self {
            positions: buffers.vertices,
            indices: buffers.indices,
        }
    }
}

fn build_path<'a>(lines: impl IntoIterator<Item = (&'a [Vec2], bool)>) -> Path {
    let mut builder = Path::builder();
    for (points, closed) in lines {
        let Some((first, rest)) = points.split_first() else { continue };
        builder.begin(point(first.x, first.y));
        for p in rest {
            builder.line_to(point(p.x, p.y));
        }
        builder.end(closed);
    }
    builder.build()
}

/// Fills every polyline marked `filled` with the non-zero rule.
pub(crate) fn fill(polylines: &[Polyline], tolerance: f32) -> Mesh {
    let lines = polylines
        .iter()
        .filter(|p| p.filled && p.points.len() >= 3)
        .map(|p| (p.points.as_slice(), true));
    let path = build_path(lines);

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let options = FillOptions::tolerance(tolerance).with_fill_rule(FillRule::NonZero);
    let result = FillTessellator::new().tessellate_path(
        &path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
            let p = v.position();
            Vec2::new(p.x, p.y)
        }),
    );
    if let Err(e) = result {
        log::debug!("fill tessellation failed: {e:?}");
        return Mesh::default();
    }
    Mesh::from_buffers(buffers)
}

/// Strokes every polyline, applying the dash pattern first.
pub(crate) fn stroke(
    polylines: &[Polyline],
    width: f32,
    style: &StrokeStyleDesc,
    tolerance: f32,
) -> Mesh {
    if !(width.is_finite() && width > 0.0) {
        return Mesh::default();
    }

    let pattern: Vec<f32> = style.dash.pattern().iter().map(|v| v * width).collect();
    let mut pieces: Vec<(Vec<Vec2>, bool)> = Vec::new();
    for line in polylines.iter().filter(|p| p.points.len() >= 2) {
        if pattern.is_empty() {
            pieces.push((line.points.clone(), line.closed));
        } else {
            pieces.extend(
                dash_polyline(&line.points, line.closed, &pattern)
                    .into_iter()
                    .map(|dash| (dash, false)),
            );
        }
    }
    let path = build_path(pieces.iter().map(|(points, closed)| (points.as_slice(), *closed)));

    let options = StrokeOptions::tolerance(tolerance)
        .with_line_width(width)
        .with_line_cap(map_cap(style.cap))
        .with_line_join(map_join(style.join))
        .with_miter_limit(style.miter_limit.max(StrokeOptions::MINIMUM_MITER_LIMIT));

    let mut buffers: VertexBuffers<Vec2, u32> = VertexBuffers::new();
    let result = StrokeTessellator::new().tessellate_path(
        &path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, |v: StrokeVertex| {
            let p = v.position();
            Vec2::new(p.x, p.y)
        }),
    );
    if let Err(e) = result {
        log::debug!("stroke tessellation failed: {e:?}");
        return Mesh::default();
    }
    Mesh::from_buffers(buffers)
}

fn map_cap(cap: LineCap) -> lyon::tessellation::LineCap {
    use lyon::tessellation::LineCap as L;
    match cap {
        LineCap::Flat => L::Butt,
        LineCap::Square => L::Square,
        // lyon has no triangular cap.
        LineCap::Round | LineCap::Triangle => L::Round,
    }
}

fn map_join(join: LineJoin) -> lyon::tessellation::LineJoin {
    use lyon::tessellation::LineJoin as L;
    match join {
        LineJoin::Miter => L::MiterClip,
        LineJoin::MiterOrBevel => L::Miter,
        LineJoin::Bevel => L::Bevel,
        LineJoin::Round => L::Round,
    }
}
