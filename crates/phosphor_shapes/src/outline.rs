//! Packed outlines
//!
//! An outline is a flat list of numbers: the total vertex count, then for
//! each sub-path its vertex count followed by that many `x, y` pairs.
//!
//! ```text
//! [total, n0, x, y, x, y, ..., n1, x, y, ...]
//! ```
//!
//! Sub-paths are read until their counts add up to `total`.

use phosphor_core::LineSink;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// Counts run past the end of the data
    #[error("Outline truncated: needed {needed} values at index {index}, {available} available")]
    Truncated {
        index: usize,
        needed: usize,
        available: usize,
    },

    /// A count that is negative, fractional or not finite
    #[error("Invalid vertex count {count} at index {index}")]
    InvalidCount { index: usize, count: f64 },
}

pub type Result<T> = std::result::Result<T, ShapeError>;

fn read_count(points: &[f64], index: usize) -> Result<usize> {
    let count = *points.get(index).ok_or(ShapeError::Truncated {
        index,
        needed: 1,
        available: 0,
    })?;
    if !count.is_finite() || count < 0.0 || count.fract() != 0.0 {
        return Err(ShapeError::InvalidCount { index, count });
    }
    Ok(count as usize)
}

/// A sub-path found while walking an outline
struct SubPath<'a> {
    coords: &'a [f64],
}

/// Split an outline into sub-paths without drawing anything
fn parse(points: &[f64]) -> Result<Vec<SubPath<'_>>> {
    let mut remaining = read_count(points, 0)?;
    let mut index = 1;
    let mut paths = Vec::new();

    while remaining > 0 {
        let count = read_count(points, index)?;
        if count == 0 {
            return Err(ShapeError::InvalidCount {
                index,
                count: 0.0,
            });
        }
        index += 1;

        let needed = count * 2;
        let available = points.len() - index;
        if available < needed {
            return Err(ShapeError::Truncated {
                index,
                needed,
                available,
            });
        }
        paths.push(SubPath {
            coords: &points[index..index + needed],
        });
        index += needed;
        remaining = remaining.saturating_sub(count);
    }

    Ok(paths)
}

/// Draw a packed outline scaled by (sx, sy), rotated by `angle` and
/// translated to (x, y)
///
/// The whole list is validated first, so a malformed outline draws nothing.
pub fn draw_shape<S: LineSink + ?Sized>(
    sink: &mut S,
    points: &[f64],
    x: f64,
    y: f64,
    sx: f64,
    sy: f64,
    angle: f64,
) -> Result<()> {
    let paths = parse(points)?;
    let (sin, cos) = angle.sin_cos();
    let place = |px: f64, py: f64| {
        let (px, py) = (px * sx, py * sy);
        (px * cos - py * sin + x, px * sin + py * cos + y)
    };

    tracing::trace!(paths = paths.len(), "drawing outline");
    for path in paths {
        let mut coords = path.coords.chunks_exact(2);
        let Some(first) = coords.next() else {
            continue;
        };
        let (px, py) = place(first[0], first[1]);
        sink.begin_draw(px, py);
        for pair in coords {
            let (px, py) = place(pair[0], pair[1]);
            sink.draw_to(px, py);
        }
        sink.end_draw();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::tests::Recorder;

    #[test]
    fn test_two_subpaths() {
        let outline = [5.0, 2.0, 0.0, 0.0, 1.0, 0.0, 3.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        let mut rec = Recorder::default();
        draw_shape(&mut rec, &outline, 10.0, 20.0, 1.0, 1.0, 0.0).unwrap();
        assert_eq!(
            rec.paths,
            vec![
                vec![(10.0, 20.0), (11.0, 20.0)],
                vec![(10.0, 21.0), (11.0, 21.0), (11.0, 20.0)],
            ]
        );
    }

    #[test]
    fn test_scale_then_rotate() {
        let outline = [2.0, 2.0, 0.0, 0.0, 1.0, 0.0];
        let mut rec = Recorder::default();
        draw_shape(
            &mut rec,
            &outline,
            0.0,
            0.0,
            3.0,
            1.0,
            std::f64::consts::FRAC_PI_2,
        )
        .unwrap();
        let (x, y) = rec.paths[0][1];
        assert!(x.abs() < 1e-9);
        assert!((y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_outline() {
        let mut rec = Recorder::default();
        draw_shape(&mut rec, &[0.0], 0.0, 0.0, 1.0, 1.0, 0.0).unwrap();
        assert!(rec.paths.is_empty());
    }

    #[test]
    fn test_truncated() {
        let mut rec = Recorder::default();
        let err = draw_shape(&mut rec, &[2.0, 2.0, 0.0, 0.0, 1.0], 0.0, 0.0, 1.0, 1.0, 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            ShapeError::Truncated {
                index: 2,
                needed: 4,
                available: 3
            }
        );
        assert!(rec.paths.is_empty());

        let err = draw_shape(&mut rec, &[4.0, 1.0, 0.0, 0.0], 0.0, 0.0, 1.0, 1.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, ShapeError::Truncated { index: 4, .. }));
        assert!(rec.paths.is_empty());

        assert!(draw_shape(&mut rec, &[], 0.0, 0.0, 1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_invalid_counts() {
        let mut rec = Recorder::default();
        assert!(matches!(
            draw_shape(&mut rec, &[-1.0], 0.0, 0.0, 1.0, 1.0, 0.0),
            Err(ShapeError::InvalidCount { index: 0, .. })
        ));
        assert!(matches!(
            draw_shape(&mut rec, &[2.0, 0.0, 1.0, 1.0], 0.0, 0.0, 1.0, 1.0, 0.0),
            Err(ShapeError::InvalidCount { index: 1, .. })
        ));
        assert!(matches!(
            draw_shape(&mut rec, &[1.5, 1.0, 0.0, 0.0], 0.0, 0.0, 1.0, 1.0, 0.0),
            Err(ShapeError::InvalidCount { .. })
        ));
    }
}
