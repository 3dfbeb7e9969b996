//! RSSI observation models built on a directional receive antenna.
//!
//! # Models
//! - [`DualRssiModel`] (`doublerssi`): two back-to-back antennas; each reading
//!   scored with its own Gaussian kernel (σ = 15 dB), product over antennas.
//! - [`DualRssiLofiModel`] (`doublerssilofi`): same antennas, but only the
//!   front − back difference is scored. Path-loss bias common to both
//!   antennas cancels, so the weight is bearing-sensitive and range-invariant.
//! - [`SingleRssiModel`] (`singlerssi`): front antenna only, Gaussian kernel
//!   on the raw reading. Two historical widths are kept (15 dB and 6 dB).
//!
//! Readings from several emitters are summed in linear power before being
//! converted back to dB.

use crate::config::SensorConfig;
use crate::error::{Result, SensorError};
use crate::observation::{
    check_sigma, gaussian_kernel, Hypotheses, Observation, ObservationModel, TargetState,
};
use crate::pattern::RadiationPattern;
use crate::propagation::{
    db_to_power, free_space_power_db, power_to_db, received_power_db, LinkBudget,
};
use nalgebra::{DMatrix, DVector};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Gaussian width (dB) of the per-antenna raw RSSI kernel.
pub const RSSI_SIGMA_WIDE_DB: f64 = 15.0;
/// Narrow raw-RSSI width (dB), also the width of the difference kernel.
pub const RSSI_SIGMA_NARROW_DB: f64 = 6.0;

/// Adaptive sigma = this factor × std-dev of the hypothesis differences.
pub const ADAPTIVE_SIGMA_SCALE: f64 = 0.7;
/// Added to every adaptive-sigma weight.
pub const ADAPTIVE_WEIGHT_FLOOR: f64 = 0.001;

/// Dead band for the three-way front/back classification.
pub const THREE_WAY_EPSILON: f64 = 1e-8;

const FRONT: f64 = 0.0;
const BACK: f64 = PI;

// ---------------------------------------------------------------------------
// Shared antenna front end
// ---------------------------------------------------------------------------

/// Receive antenna pattern plus the transmitter link budget.
#[derive(Clone, Debug)]
pub struct AntennaFrontEnd {
    pattern: RadiationPattern,
    link: LinkBudget,
}

impl AntennaFrontEnd {
    pub fn new(pattern: RadiationPattern, link: LinkBudget) -> Result<Self> {
        link.validate()?;
        Ok(Self { pattern, link })
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.radiation_pattern()?, config.link_budget())
    }

    pub fn pattern(&self) -> &RadiationPattern {
        &self.pattern
    }

    pub fn link(&self) -> &LinkBudget {
        &self.link
    }

    /// Combined RSSI (dB) for antennas pointing `offsets` radians off boresight.
    ///
    /// With `rng` each emitter/antenna pair gets its own fading draw; without
    /// it the noise-free link budget is used.
    pub fn readings<const N: usize>(
        &self,
        state: &[TargetState],
        offsets: [f64; N],
        mut rng: Option<&mut dyn RngCore>,
    ) -> Result<[f64; N]> {
        if state.is_empty() {
            return Err(SensorError::InvalidState("scenario has no targets".into()));
        }
        let mut power = [0.0; N];
        for ts in state {
            let theta = ts.bearing_rad();
            for (acc, offset) in power.iter_mut().zip(offsets) {
                let gain_rx = self.pattern.gain(theta + offset);
                let db = match rng.as_deref_mut() {
                    Some(rng) => received_power_db(ts.distance, gain_rx, &self.link, rng)?,
                    None => free_space_power_db(ts.distance, gain_rx, &self.link)?,
                };
                *acc += db_to_power(db);
            }
        }
        Ok(power.map(power_to_db))
    }

    /// Noise-free readings for each candidate, one matrix row per candidate.
    pub fn expected_hypotheses<const N: usize>(
        &self,
        candidates: &[TargetState],
        offsets: [f64; N],
    ) -> Result<Hypotheses> {
        let mut data = Vec::with_capacity(candidates.len() * N);
        for candidate in candidates {
            data.extend(self.readings(std::slice::from_ref(candidate), offsets, None)?);
        }
        Ok(Hypotheses::Expected(DMatrix::from_row_slice(
            candidates.len(),
            N,
            &data,
        )))
    }
}

// ---------------------------------------------------------------------------
// Scoring rules
// ---------------------------------------------------------------------------

fn expected_matrix<'a>(
    model: &'static str,
    hyp: &'a Hypotheses,
    ncols: usize,
) -> Result<&'a DMatrix<f64>> {
    match hyp {
        Hypotheses::Expected(m) if m.ncols() == ncols => Ok(m),
        other => Err(SensorError::HypothesisShape {
            model,
            expected: format!("N x {ncols} expected readings"),
            found: other.describe(),
        }),
    }
}

/// Elementwise Gaussian on raw readings, product across columns.
pub fn raw_rssi_weight(expected: &DMatrix<f64>, observed: &[f64], sigma: f64) -> DVector<f64> {
    DVector::from_iterator(
        expected.nrows(),
        expected.row_iter().map(|row| {
            row.iter()
                .zip(observed)
                .map(|(e, o)| gaussian_kernel(e - o, sigma))
                .product::<f64>()
        }),
    )
}

/// Gaussian on the front − back difference.
pub fn difference_weight(expected_diff: &DVector<f64>, observed_diff: f64, sigma: f64) -> DVector<f64> {
    expected_diff.map(|d| gaussian_kernel(d - observed_diff, sigma))
}

/// Difference kernel with σ taken from the spread of the hypotheses.
pub fn adaptive_difference_weight(expected_diff: &DVector<f64>, observed_diff: f64) -> DVector<f64> {
    let n = expected_diff.len();
    if n == 0 {
        return DVector::zeros(0);
    }
    let mean = expected_diff.mean();
    let std = (expected_diff.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    let sigma = ADAPTIVE_SIGMA_SCALE * std;
    tracing::debug!(std, sigma, observed_diff, "adaptive difference sigma");
    expected_diff.map(|d| {
        let kernel = if sigma > 0.0 {
            gaussian_kernel(d - observed_diff, sigma)
        } else if d == observed_diff {
            // zero spread collapses the kernel to an indicator
            1.0
        } else {
            0.0
        };
        kernel + ADAPTIVE_WEIGHT_FLOOR
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dominance {
    Front,
    Unsure,
    Back,
}

fn dominance(diff: f64) -> Dominance {
    if diff > THREE_WAY_EPSILON {
        Dominance::Front
    } else if diff < -THREE_WAY_EPSILON {
        Dominance::Back
    } else {
        Dominance::Unsure
    }
}

/// Confusion-table weight for the three-way front/back classification.
pub fn three_way_weight(expected_diff: &DVector<f64>, observed_diff: f64) -> DVector<f64> {
    let hit = 0.9f64.sqrt();
    let half = 0.5f64.sqrt();
    let miss = 0.1f64.sqrt();
    let observed = dominance(observed_diff);
    expected_diff.map(|d| match (observed, dominance(d)) {
        (Dominance::Front, Dominance::Front) | (Dominance::Back, Dominance::Back) => hit,
        (Dominance::Front, Dominance::Unsure) | (Dominance::Back, Dominance::Unsure) => half,
        (Dominance::Front, Dominance::Back) | (Dominance::Back, Dominance::Front) => miss,
        (Dominance::Unsure, Dominance::Unsure) => hit,
        (Dominance::Unsure, _) => miss,
    })
}

// ---------------------------------------------------------------------------
// Dual antenna, raw readings
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct DualRssiModel {
    front_end: AntennaFrontEnd,
    sigma: f64,
}

impl DualRssiModel {
    pub fn new(front_end: AntennaFrontEnd) -> Self {
        Self {
            front_end,
            sigma: RSSI_SIGMA_WIDE_DB,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        Ok(Self::new(AntennaFrontEnd::from_config(config)?))
    }

    pub fn front_end(&self) -> &AntennaFrontEnd {
        &self.front_end
    }

    /// Fading-free `[front, back]` readings for a scenario.
    pub fn expected(&self, state: &[TargetState]) -> Result<[f64; 2]> {
        self.front_end.readings(state, [FRONT, BACK], None)
    }
}

impl ObservationModel for DualRssiModel {
    fn name(&self) -> &'static str {
        "doublerssi"
    }

    fn hypotheses(&self, candidates: &[TargetState]) -> Result<Hypotheses> {
        self.front_end.expected_hypotheses(candidates, [FRONT, BACK])
    }

    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation> {
        let [front_db, back_db] = self.front_end.readings(state, [FRONT, BACK], Some(rng))?;
        Ok(Observation::FrontBack { front_db, back_db })
    }

    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>> {
        let Observation::FrontBack { front_db, back_db } = *obs else {
            return Err(SensorError::ObservationMismatch {
                model: self.name(),
                found: obs.kind(),
            });
        };
        let expected = expected_matrix(self.name(), hyp, 2)?;
        Ok(raw_rssi_weight(expected, &[front_db, back_db], self.sigma))
    }
}

// ---------------------------------------------------------------------------
// Dual antenna, difference ("lofi") scoring
// ---------------------------------------------------------------------------

/// Which weighting rule the lofi model applies to the front − back difference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LofiScoring {
    /// Gaussian kernel, fixed σ = 6 dB
    #[default]
    Gaussian,
    /// Gaussian kernel, σ = 0.7 × spread of hypotheses, plus a 0.001 floor
    AdaptiveSigma,
    /// Front / unsure / back classes scored by a fixed confusion table
    ThreeWay,
}

#[derive(Clone, Debug)]
pub struct DualRssiLofiModel {
    front_end: AntennaFrontEnd,
    sigma: f64,
    scoring: LofiScoring,
}

impl DualRssiLofiModel {
    pub fn new(front_end: AntennaFrontEnd, scoring: LofiScoring) -> Self {
        Self {
            front_end,
            sigma: RSSI_SIGMA_NARROW_DB,
            scoring,
        }
    }

    pub fn from_config(config: &SensorConfig) -> Result<Self> {
        Ok(Self::new(
            AntennaFrontEnd::from_config(config)?,
            config.lofi_scoring,
        ))
    }

    pub fn front_end(&self) -> &AntennaFrontEnd {
        &self.front_end
    }

    pub fn scoring(&self) -> LofiScoring {
        self.scoring
    }

    pub fn expected(&self, state: &[TargetState]) -> Result<[f64; 2]> {
        self.front_end.readings(state, [FRONT, BACK], None)
    }
}

impl ObservationModel for DualRssiLofiModel {
    fn name(&self) -> &'static str {
        "doublerssilofi"
    }

    fn hypotheses(&self, candidates: &[TargetState]) -> Result<Hypotheses> {
        self.front_end.expected_hypotheses(candidates, [FRONT, BACK])
    }

    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation> {
        let [front_db, back_db] = self.front_end.readings(state, [FRONT, BACK], Some(rng))?;
        Ok(Observation::FrontBack { front_db, back_db })
    }

    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>> {
        let Observation::FrontBack { front_db, back_db } = *obs else {
            return Err(SensorError::ObservationMismatch {
                model: self.name(),
                found: obs.kind(),
            });
        };
        let expected = expected_matrix(self.name(), hyp, 2)?;
        let expected_diff: DVector<f64> = expected.column(0) - expected.column(1);
        let observed_diff = front_db - back_db;
        Ok(match self.scoring {
            LofiScoring::Gaussian => difference_weight(&expected_diff, observed_diff, self.sigma),
            LofiScoring::AdaptiveSigma => adaptive_difference_weight(&expected_diff, observed_diff),
            LofiScoring::ThreeWay => three_way_weight(&expected_diff, observed_diff),
        })
    }
}

// ---------------------------------------------------------------------------
// Single antenna
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct SingleRssiModel {
    front_end: AntennaFrontEnd,
    sigma: f64,
}

impl SingleRssiModel {
    pub fn with_sigma(front_end: AntennaFrontEnd, sigma: f64) -> Result<Self> {
        Ok(Self {
            front_end,
            sigma: check_sigma("rssi", sigma)?,
        })
    }

    /// σ = 15 dB parameterisation.
    pub fn wide(config: &SensorConfig) -> Result<Self> {
        Self::with_sigma(AntennaFrontEnd::from_config(config)?, RSSI_SIGMA_WIDE_DB)
    }

    /// σ = 6 dB parameterisation.
    pub fn narrow(config: &SensorConfig) -> Result<Self> {
        Self::with_sigma(AntennaFrontEnd::from_config(config)?, RSSI_SIGMA_NARROW_DB)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn expected(&self, state: &[TargetState]) -> Result<f64> {
        let [front] = self.front_end.readings(state, [FRONT], None)?;
        Ok(front)
    }
}

impl ObservationModel for SingleRssiModel {
    fn name(&self) -> &'static str {
        "singlerssi"
    }

    fn hypotheses(&self, candidates: &[TargetState]) -> Result<Hypotheses> {
        self.front_end.expected_hypotheses(candidates, [FRONT])
    }

    fn observation(&self, state: &[TargetState], rng: &mut dyn RngCore) -> Result<Observation> {
        let [front_db] = self.front_end.readings(state, [FRONT], Some(rng))?;
        Ok(Observation::Front { front_db })
    }

    fn weight(&self, hyp: &Hypotheses, obs: &Observation) -> Result<DVector<f64>> {
        let Observation::Front { front_db } = *obs else {
            return Err(SensorError::ObservationMismatch {
                model: self.name(),
                found: obs.kind(),
            });
        };
        let expected = expected_matrix(self.name(), hyp, 1)?;
        Ok(raw_rssi_weight(expected, &[front_db], self.sigma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PATTERN_LEN;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// 10 dB forward half-plane, −10 dB behind, already boresight-aligned.
    fn half_plane_front_end(fading: Option<f64>) -> AntennaFrontEnd {
        let gains = (0..PATTERN_LEN)
            .map(|deg| if deg < 90 || deg >= 270 { 10.0 } else { -10.0 })
            .collect();
        AntennaFrontEnd::new(
            RadiationPattern::from_aligned(gains).unwrap(),
            LinkBudget {
                fading_sigma_db: fading,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn diffs(v: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(v)
    }

    #[test]
    fn front_back_readings_follow_pattern() {
        let fe = half_plane_front_end(None);
        let [front, back] = fe.readings(&[TargetState::new(100.0, 10.5)], [FRONT, BACK], None).unwrap();
        assert_abs_diff_eq!(front - back, 20.0, epsilon = 1e-9);
        let [front, back] = fe.readings(&[TargetState::new(100.0, 180.5)], [FRONT, BACK], None).unwrap();
        assert_abs_diff_eq!(front - back, -20.0, epsilon = 1e-9);
    }

    #[test]
    fn identical_targets_add_in_linear_power() {
        let fe = half_plane_front_end(None);
        let t = TargetState::new(60.0, 30.5);
        let [one] = fe.readings(&[t], [FRONT], None).unwrap();
        let [two] = fe.readings(&[t, t], [FRONT], None).unwrap();
        assert_abs_diff_eq!(two - one, 10.0 * 2f64.log10(), epsilon = 1e-9);
    }

    #[test]
    fn empty_or_invalid_scenario_fails() {
        let fe = half_plane_front_end(None);
        assert!(matches!(
            fe.readings(&[], [FRONT], None),
            Err(SensorError::InvalidState(_))
        ));
        assert!(matches!(
            fe.readings(&[TargetState::new(0.0, 0.0)], [FRONT], None),
            Err(SensorError::InvalidState(_))
        ));
    }

    #[test]
    fn fading_observation_is_seed_reproducible() {
        let model = DualRssiModel::new(half_plane_front_end(Some(3.0)));
        let state = [TargetState::new(75.0, 45.5)];
        let a = model.observation(&state, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        let b = model.observation(&state, &mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        assert_eq!(a, b);
        let clean = model.expected(&state).unwrap();
        assert_ne!(a, Observation::FrontBack { front_db: clean[0], back_db: clean[1] });
    }

    #[test]
    fn difference_weight_is_one_at_match_and_symmetric() {
        let w = difference_weight(&diffs(&[5.0, 4.0, 6.0, 2.0, 8.0]), 5.0, RSSI_SIGMA_NARROW_DB);
        assert_eq!(w[0], 1.0);
        assert_abs_diff_eq!(w[1], w[2], epsilon = 1e-15);
        assert_abs_diff_eq!(w[3], w[4], epsilon = 1e-15);
        assert!(w[1] > w[3]);
        assert!(w.iter().all(|x| *x > 0.0 && *x <= 1.0));
    }

    #[test]
    fn lofi_ignores_absolute_power() {
        let model = DualRssiLofiModel::new(half_plane_front_end(None), LofiScoring::Gaussian);
        let hyp = Hypotheses::from_rows(&[vec![-40.0, -60.0], vec![-80.0, -100.0], vec![-50.0, -50.0]]).unwrap();
        let obs = Observation::FrontBack { front_db: -55.0, back_db: -75.0 };
        let w = model.weight(&hyp, &obs).unwrap();
        assert_eq!(w[0], 1.0);
        assert_eq!(w[1], 1.0);
        assert_abs_diff_eq!(w[2], gaussian_kernel(20.0, 6.0), epsilon = 1e-15);
    }

    #[test]
    fn adaptive_sigma_tracks_spread_and_keeps_floor() {
        let expected = diffs(&[-10.0, 0.0, 10.0]);
        let w = adaptive_difference_weight(&expected, 0.0);
        let std = (200.0f64 / 3.0).sqrt();
        assert_abs_diff_eq!(w[1], 1.0 + ADAPTIVE_WEIGHT_FLOOR, epsilon = 1e-12);
        assert_abs_diff_eq!(
            w[0],
            gaussian_kernel(10.0, ADAPTIVE_SIGMA_SCALE * std) + ADAPTIVE_WEIGHT_FLOOR,
            epsilon = 1e-12
        );

        let far = adaptive_difference_weight(&expected, 1e6);
        assert!(far.iter().all(|x| *x == ADAPTIVE_WEIGHT_FLOOR));
    }

    #[test]
    fn adaptive_sigma_with_no_spread_stays_finite() {
        let w = adaptive_difference_weight(&diffs(&[3.0, 3.0]), 3.0);
        assert_eq!(w[0], 1.0 + ADAPTIVE_WEIGHT_FLOOR);
        let w = adaptive_difference_weight(&diffs(&[3.0, 3.0]), 4.0);
        assert_eq!(w[1], ADAPTIVE_WEIGHT_FLOOR);
        assert!(adaptive_difference_weight(&diffs(&[]), 0.0).is_empty());
    }

    #[test]
    fn three_way_confusion_table() {
        let expected = diffs(&[12.0, 0.0, -7.0]);
        let front = three_way_weight(&expected, 4.0);
        assert_abs_diff_eq!(front[0], 0.9f64.sqrt());
        assert_abs_diff_eq!(front[1], 0.5f64.sqrt());
        assert_abs_diff_eq!(front[2], 0.1f64.sqrt());

        let back = three_way_weight(&expected, -4.0);
        assert_abs_diff_eq!(back[0], 0.1f64.sqrt());
        assert_abs_diff_eq!(back[1], 0.5f64.sqrt());
        assert_abs_diff_eq!(back[2], 0.9f64.sqrt());

        let unsure = three_way_weight(&expected, 1e-9);
        assert_abs_diff_eq!(unsure[0], 0.1f64.sqrt());
        assert_abs_diff_eq!(unsure[1], 0.9f64.sqrt());
        assert_abs_diff_eq!(unsure[2], 0.1f64.sqrt());
    }

    #[test]
    fn dual_raw_weight_is_product_over_antennas() {
        let model = DualRssiModel::new(half_plane_front_end(None));
        let hyp = Hypotheses::from_rows(&[vec![-50.0, -70.0], vec![-65.0, -55.0]]).unwrap();
        let obs = Observation::FrontBack { front_db: -50.0, back_db: -70.0 };
        let w = model.weight(&hyp, &obs).unwrap();
        assert_eq!(w[0], 1.0);
        assert_abs_diff_eq!(
            w[1],
            gaussian_kernel(15.0, 15.0) * gaussian_kernel(15.0, 15.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn single_widths_differ() {
        let cfg = SensorConfig::default();
        let wide = SingleRssiModel::wide(&cfg).unwrap();
        let narrow = SingleRssiModel::narrow(&cfg).unwrap();
        assert_eq!(wide.sigma(), 15.0);
        assert_eq!(narrow.sigma(), 6.0);

        let hyp = Hypotheses::from_rows(&[vec![-60.0], vec![-70.0]]).unwrap();
        let obs = Observation::Front { front_db: -60.0 };
        let ww = wide.weight(&hyp, &obs).unwrap();
        let wn = narrow.weight(&hyp, &obs).unwrap();
        assert_eq!(ww[0], 1.0);
        assert!(wn[1] < ww[1]);
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let model = SingleRssiModel::with_sigma(half_plane_front_end(None), 15.0).unwrap();
        let two_cols = Hypotheses::from_rows(&[vec![-60.0, -70.0]]).unwrap();
        assert!(matches!(
            model.weight(&two_cols, &Observation::Front { front_db: -60.0 }),
            Err(SensorError::HypothesisShape { .. })
        ));
        let one_col = Hypotheses::from_rows(&[vec![-60.0]]).unwrap();
        assert!(matches!(
            model.weight(&one_col, &Observation::Class { index: 0 }),
            Err(SensorError::ObservationMismatch { .. })
        ));
    }

    #[test]
    fn single_width_must_be_positive() {
        for sigma in [0.0, -6.0, f64::NAN] {
            assert!(matches!(
                SingleRssiModel::with_sigma(half_plane_front_end(None), sigma),
                Err(SensorError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn front_end_rejects_unusable_link() {
        let gains = vec![0.0; PATTERN_LEN];
        let link = LinkBudget {
            freq_hz: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            AntennaFrontEnd::new(RadiationPattern::from_aligned(gains).unwrap(), link),
            Err(SensorError::InvalidConfig(_))
        ));
        assert_eq!(half_plane_front_end(None).link().freq_hz, 5.7e9);
    }

    #[test]
    fn lofi_scoring_comes_from_config() {
        let cfg = SensorConfig {
            lofi_scoring: LofiScoring::ThreeWay,
            ..Default::default()
        };
        let model = DualRssiLofiModel::from_config(&cfg).unwrap();
        assert_eq!(model.scoring(), LofiScoring::ThreeWay);
        let hyp = Hypotheses::from_rows(&[vec![-40.0, -60.0], vec![-60.0, -40.0]]).unwrap();
        let w = model.weight(&hyp, &Observation::FrontBack { front_db: -50.0, back_db: -70.0 }).unwrap();
        assert_abs_diff_eq!(w[0], 0.9f64.sqrt());
        assert_abs_diff_eq!(w[1], 0.1f64.sqrt());
    }
}
