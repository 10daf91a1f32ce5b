//! Inferring spaces from unusually large gaps between characters.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::candidate::CandidateBox;
use crate::errors::*;

/// What a "normal" distance between characters is.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacingBase {
    /// The smallest distance between neighbors.
    #[default]
    Min,
    /// The average distance between neighbors.
    Average,
}

/// Settings for space detection.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SpacingConfig {
    /// A distance of `factor` times the base distance counts as one space.
    pub factor: f64,
    /// How to compute the base distance.
    pub base: SpacingBase,
}

impl SpacingConfig {
    /// The factor used unless told otherwise.
    pub const DEFAULT_FACTOR: f64 = 1.4;
}

impl Default for SpacingConfig {
    fn default() -> Self {
        SpacingConfig {
            factor: SpacingConfig::DEFAULT_FACTOR,
            base: SpacingBase::Min,
        }
    }
}

/// Set `spaces` on each candidate according to the distance between its
/// right edge and the next candidate's right edge.  Needs at least three
/// candidates to have a meaningful base distance.
pub fn infer_spaces(config: &SpacingConfig, candidates: &mut [CandidateBox]) -> Result<()> {
    if candidates.len() <= 2 {
        return Ok(());
    }
    let distances = candidates
        .windows(2)
        .map(|pair| cast::f64(pair[1].x2 - pair[0].x2))
        .collect::<Vec<_>>();
    let base = match config.base {
        SpacingBase::Min => distances.iter().copied().fold(f64::INFINITY, f64::min),
        SpacingBase::Average => distances.iter().sum::<f64>() / cast::f64(distances.len()),
    };
    let base = base.max(1.0);
    debug!("spacing: base distance {:.2}, factor {}", base, config.factor);
    for (c, distance) in candidates.iter_mut().zip(&distances) {
        let spaces = (distance / (config.factor * base)).floor();
        c.spaces = cast::u32(spaces).map_err(|_| Error::overflow("space count", spaces))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use quickcheck::quickcheck;

    use super::*;

    /// Equal-width candidates separated by the given gaps.
    fn spaced(width: usize, gaps: &[usize]) -> Vec<CandidateBox> {
        let mut x = 0;
        let mut candidates = vec![CandidateBox::new(x, 0, x + width, 20)];
        for gap in gaps {
            x += width + gap;
            candidates.push(CandidateBox::new(x, 0, x + width, 20));
        }
        candidates
    }

    fn spaces(candidates: &[CandidateBox]) -> Vec<u32> {
        candidates.iter().map(|c| c.spaces).collect()
    }

    #[test]
    fn one_space_before_outlier_gap() {
        let mut candidates = spaced(10, &[5, 15, 5]);
        infer_spaces(&SpacingConfig::default(), &mut candidates).unwrap();
        assert_eq!(spaces(&candidates), vec![0, 1, 0, 0]);
    }

    #[test]
    fn average_base_absorbs_outliers() {
        let mut candidates = spaced(10, &[5, 15, 5]);
        let config = SpacingConfig {
            base: SpacingBase::Average,
            ..SpacingConfig::default()
        };
        infer_spaces(&config, &mut candidates).unwrap();
        // Distances 15, 25, 15 average to 18.33, and 25 / (1.4 * 18.33) < 1.
        assert_eq!(spaces(&candidates), vec![0, 0, 0, 0]);
    }

    #[test]
    fn two_candidates_are_never_spaced() {
        let mut candidates = spaced(10, &[40]);
        infer_spaces(&SpacingConfig::default(), &mut candidates).unwrap();
        assert_eq!(spaces(&candidates), vec![0, 0]);
    }

    #[test]
    fn base_is_at_least_one_pixel() {
        // Overlapping right edges give a distance of zero.
        let mut candidates = vec![
            CandidateBox::new(0, 0, 5, 20),
            CandidateBox::new(2, 0, 5, 20),
            CandidateBox::new(6, 0, 9, 20),
        ];
        infer_spaces(&SpacingConfig::default(), &mut candidates).unwrap();
        // 4 / (1.4 * 1)
        assert_eq!(spaces(&candidates), vec![0, 2, 0]);
    }

    quickcheck! {
        fn evenly_spaced_candidates_have_no_spaces(width: u8, gap: u8, count: u8) -> bool {
            let count = usize::from(count % 10) + 3;
            let gaps = vec![usize::from(gap); count - 1];
            let mut candidates = spaced(usize::from(width) + 1, &gaps);
            infer_spaces(&SpacingConfig::default(), &mut candidates).unwrap();
            candidates.iter().all(|c| c.spaces == 0)
        }
    }
}
