//! Brute-force descriptor matching and per-axis displacement voting.
//!
//! Every query descriptor is paired with its nearest train descriptor by L2
//! distance. Two optional filters narrow the set: Lowe's ratio test against
//! the second-nearest neighbour and a mutual cross-check. With the `parallel`
//! feature each query is matched on the rayon pool; the output order is the
//! query order either way.

pub mod median;

pub use median::{median, AxisSamples};

use crate::features::Descriptor;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Correspondence between query keypoint `query` and train keypoint `train`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    pub query: usize,
    pub train: usize,
    pub distance: f32,
}

/// Matching filters. Both are off by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherParams {
    /// Keep a match only when `best < ratio × second_best`.
    pub ratio_threshold: Option<f32>,
    /// Keep a match only when the train descriptor's nearest query is the
    /// same query.
    pub cross_check: bool,
}

#[inline]
fn squared_distance(a: &Descriptor, b: &Descriptor) -> f32 {
    a.iter().zip(b.iter()).map(|(u, v)| (u - v) * (u - v)).sum()
}

/// Nearest and second-nearest squared distances from `desc` into `train`.
fn nearest_two(desc: &Descriptor, train: &[Descriptor]) -> Option<(usize, f32, f32)> {
    let mut best: Option<(usize, f32)> = None;
    let mut second = f32::INFINITY;
    for (j, t) in train.iter().enumerate() {
        let d = squared_distance(desc, t);
        match best {
            Some((_, b)) if d >= b => second = second.min(d),
            Some((_, b)) => {
                second = b;
                best = Some((j, d));
            }
            None => best = Some((j, d)),
        }
    }
    best.map(|(j, d)| (j, d, second))
}

fn match_query(
    qi: usize,
    desc: &Descriptor,
    train: &[Descriptor],
    params: &MatcherParams,
) -> Option<Match> {
    let (ti, best, second) = nearest_two(desc, train)?;
    if let Some(ratio) = params.ratio_threshold {
        // Squared distances: compare against ratio².
        if second.is_finite() && best >= ratio * ratio * second {
            return None;
        }
    }
    Some(Match {
        query: qi,
        train: ti,
        distance: best.sqrt(),
    })
}

/// Match `query` against `train`, replacing the contents of `out`.
pub fn match_descriptors(
    query: &[Descriptor],
    train: &[Descriptor],
    params: &MatcherParams,
    out: &mut Vec<Match>,
) {
    out.clear();
    if query.is_empty() || train.is_empty() {
        return;
    }

    #[cfg(feature = "parallel")]
    {
        let found: Vec<Option<Match>> = query
            .par_iter()
            .enumerate()
            .map(|(qi, d)| match_query(qi, d, train, params))
            .collect();
        out.extend(found.into_iter().flatten());
    }
    #[cfg(not(feature = "parallel"))]
    {
        out.extend(
            query
                .iter()
                .enumerate()
                .filter_map(|(qi, d)| match_query(qi, d, train, params)),
        );
    }

    if params.cross_check {
        out.retain(|m| {
            nearest_two(&train[m.train], query)
                .map(|(back, _, _)| back == m.query)
                .unwrap_or(false)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::DESCRIPTOR_LEN;

    fn unit(i: usize) -> Descriptor {
        let mut d = [0.0; DESCRIPTOR_LEN];
        d[i] = 1.0;
        d
    }

    fn mixed(i: usize, j: usize, wi: f32) -> Descriptor {
        let mut d = [0.0; DESCRIPTOR_LEN];
        d[i] = wi;
        d[j] = (1.0 - wi * wi).sqrt();
        d
    }

    #[test]
    fn nearest_neighbour_finds_identical_descriptor() {
        let train = vec![unit(0), unit(5), unit(9)];
        let query = vec![unit(9), unit(0)];
        let mut out = Vec::new();
        match_descriptors(&query, &train, &MatcherParams::default(), &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].query, out[0].train), (0, 2));
        assert_eq!((out[1].query, out[1].train), (1, 0));
        assert!(out.iter().all(|m| m.distance == 0.0));
    }

    #[test]
    fn ratio_test_drops_ambiguous_queries() {
        let train = vec![unit(0), unit(1)];
        // Equidistant from both train entries.
        let ambiguous = mixed(0, 1, std::f32::consts::FRAC_1_SQRT_2);
        let query = vec![ambiguous, mixed(0, 1, 0.99)];
        let params = MatcherParams {
            ratio_threshold: Some(0.8),
            cross_check: false,
        };
        let mut out = Vec::new();
        match_descriptors(&query, &train, &params, &mut out);
        assert_eq!(out.len(), 1, "{out:?}");
        assert_eq!((out[0].query, out[0].train), (1, 0));
    }

    #[test]
    fn cross_check_requires_mutual_nearest() {
        let train = vec![unit(0)];
        let query = vec![mixed(0, 1, 0.6), mixed(0, 1, 0.95)];
        let mut out = Vec::new();
        match_descriptors(&query, &train, &MatcherParams::default(), &mut out);
        assert_eq!(out.len(), 2);

        let params = MatcherParams {
            ratio_threshold: None,
            cross_check: true,
        };
        match_descriptors(&query, &train, &params, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].query, 1);
    }

    #[test]
    fn empty_sides_yield_no_matches() {
        let mut out = vec![Match {
            query: 0,
            train: 0,
            distance: 0.0,
        }];
        match_descriptors(&[], &[unit(0)], &MatcherParams::default(), &mut out);
        assert!(out.is_empty());
        match_descriptors(&[unit(0)], &[], &MatcherParams::default(), &mut out);
        assert!(out.is_empty());
    }
}
