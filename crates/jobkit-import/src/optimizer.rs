//! In-place path optimization.
//!
//! Two tolerance-bounded stages: joining polylines whose endpoints
//! coincide (so the machine cuts one continuous segment instead of many
//! fragments), then Ramer-Douglas-Peucker simplification, which drops
//! vertices whose removal deviates from the original chain by less than
//! the tolerance.

use jobkit_core::Polyline;

/// Optimizes boundary paths in place: join, then simplify, then drop
/// degenerate leftovers.
pub fn optimize(paths: &mut Vec<Polyline>, tolerance: f64) {
    join_segments(paths, tolerance);
    for path in paths.iter_mut() {
        simplify(path, tolerance);
    }
    paths.retain(|p| p.len() > 1);
}

/// DXF-side variant of [`optimize`].
///
/// Same join+simplify stages; kept as its own entry point because the
/// DXF branch stamps its result on the legacy `vector` section rather
/// than the document head.
pub fn dxf_optimize(paths: &mut Vec<Polyline>, tolerance: f64) {
    optimize(paths, tolerance);
}

/// Joins polylines whose endpoints coincide within `epsilon`, reversing
/// chains where needed. Greedy: grows one chain at a time from the
/// remaining pool.
fn join_segments(paths: &mut Vec<Polyline>, epsilon: f64) {
    let eps2 = epsilon * epsilon;
    let mut remaining: Vec<Polyline> = std::mem::take(paths)
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    let mut joined: Vec<Polyline> = Vec::with_capacity(remaining.len());

    while let Some(mut chain) = remaining.pop() {
        let mut tried_reverse = false;
        loop {
            let tail = chain[chain.len() - 1];
            let next = remaining.iter().position(|p| {
                dist2(tail, p[0]) <= eps2 || dist2(tail, p[p.len() - 1]) <= eps2
            });
            match next {
                Some(i) => {
                    let mut other = remaining.swap_remove(i);
                    if dist2(tail, other[0]) > eps2 {
                        other.reverse();
                    }
                    chain.extend(other.into_iter().skip(1));
                    tried_reverse = false;
                }
                // The chain may continue from its head instead; flip once
                // and keep growing from the other end.
                None if !tried_reverse => {
                    chain.reverse();
                    tried_reverse = true;
                }
                None => break,
            }
        }
        joined.push(chain);
    }

    *paths = joined;
}

/// Ramer-Douglas-Peucker simplification in place.
///
/// Keeps both endpoints, recursively (via an explicit stack) keeping the
/// farthest vertex of every span that deviates more than `tolerance`.
pub fn simplify(path: &mut Polyline, tolerance: f64) {
    if path.len() < 3 {
        return;
    }
    let tol2 = tolerance * tolerance;
    let mut keep = vec![false; path.len()];
    keep[0] = true;
    keep[path.len() - 1] = true;

    let mut spans = vec![(0usize, path.len() - 1)];
    while let Some((first, last)) = spans.pop() {
        let mut max_d2 = 0.0;
        let mut split = first;
        for i in first + 1..last {
            let d2 = deviation2(path[i], path[first], path[last]);
            if d2 > max_d2 {
                max_d2 = d2;
                split = i;
            }
        }
        if max_d2 > tol2 {
            keep[split] = true;
            spans.push((first, split));
            spans.push((split, last));
        }
    }

    let mut i = 0;
    path.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Squared distance from `p` to the line through `a` and `b`; falls back
/// to point distance when the span is degenerate.
fn deviation2(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let len2 = dist2(a, b);
    if len2 == 0.0 {
        return dist2(p, a);
    }
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    cross * cross / len2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify_drops_collinear_vertices() {
        let mut path = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        simplify(&mut path, 0.01);
        assert_eq!(path, vec![[0.0, 0.0], [3.0, 0.0]]);
    }

    #[test]
    fn simplify_keeps_significant_corners() {
        let mut path = vec![[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]];
        simplify(&mut path, 0.1);
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn simplify_respects_tolerance_scale() {
        let mut bumpy = vec![[0.0, 0.0], [5.0, 0.05], [10.0, 0.0]];
        simplify(&mut bumpy, 0.1);
        assert_eq!(bumpy, vec![[0.0, 0.0], [10.0, 0.0]]);

        let mut kept = vec![[0.0, 0.0], [5.0, 0.5], [10.0, 0.0]];
        simplify(&mut kept, 0.1);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn join_merges_touching_chains() {
        let mut paths = vec![
            vec![[0.0, 0.0], [1.0, 0.0]],
            vec![[1.0, 0.0], [1.0, 1.0]],
        ];
        optimize(&mut paths, 0.01);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
    }

    #[test]
    fn join_reverses_opposing_chains() {
        let mut paths = vec![
            vec![[0.0, 0.0], [1.0, 0.0]],
            vec![[2.0, 1.0], [1.0, 0.0]],
        ];
        optimize(&mut paths, 0.01);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
    }

    #[test]
    fn disjoint_chains_stay_separate() {
        let mut paths = vec![
            vec![[0.0, 0.0], [1.0, 0.0]],
            vec![[5.0, 5.0], [6.0, 5.0]],
        ];
        optimize(&mut paths, 0.01);
        assert_eq!(paths.len(), 2);
    }
}
