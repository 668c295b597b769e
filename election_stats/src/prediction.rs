/*!
Heuristic winner predictions.

None of the models here is fitted on historical data: each one turns the
party totals of the current count into a score, and the scores into win
probabilities. They are deterministic, so the same records always produce
the same prediction.

- `Ensemble` weighs the total votes, the number of constituencies contested
  and the average constituency share.
- `LinearRegression` extrapolates the counted votes to a full count, assuming
  that the remaining ballots split like the counted ones.
- `RandomForest` weighs the overall share, the share of constituencies won and
  the average constituency share.
- `Bayesian` takes the posterior mean of the vote shares under a uniform
  Dirichlet prior.

Every party also gets a normal-approximation interval on its predicted share.
*/

use std::fmt::Display;
use std::str::FromStr;

use log::{debug, info, warn};

use crate::numeric::{mean, pct};
use crate::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Default)]
pub enum PredictionModel {
    LinearRegression,
    RandomForest,
    Bayesian,
    #[default]
    Ensemble,
}

impl PredictionModel {
    pub const ALL: [PredictionModel; 4] = [
        PredictionModel::LinearRegression,
        PredictionModel::RandomForest,
        PredictionModel::Bayesian,
        PredictionModel::Ensemble,
    ];
}

impl Display for PredictionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PredictionModel::LinearRegression => "Linear Regression",
            PredictionModel::RandomForest => "Random Forest",
            PredictionModel::Bayesian => "Bayesian",
            PredictionModel::Ensemble => "Ensemble",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PredictionModel {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !(c.is_whitespace() || *c == '_' || *c == '-'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "linearregression" | "linear" => Ok(PredictionModel::LinearRegression),
            "randomforest" | "forest" => Ok(PredictionModel::RandomForest),
            "bayesian" => Ok(PredictionModel::Bayesian),
            "ensemble" => Ok(PredictionModel::Ensemble),
            _ => Err(StatsError::MalformedInput {
                reason: format!("unknown prediction model {:?}", s),
            }),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct PartyPrediction {
    pub party: String,
    pub total_votes: u64,
    pub score: f64,
    /// Rounded to 2 decimals.
    pub win_probability_pct: f64,
    pub predicted_votes: u64,
    pub predicted_share_pct: f64,
    pub interval_low_pct: f64,
    pub interval_high_pct: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct PredictionResult {
    pub model: PredictionModel,
    pub confidence_level: f64,
    pub predicted_winner: String,
    /// Sorted by decreasing win probability.
    pub parties: Vec<PartyPrediction>,
}

// Inputs of the scores, per party.
struct PartyInputs<'a> {
    party: &'a str,
    total_votes: u64,
    counted_votes: u64,
    rows: usize,
    avg_share_pct: f64,
    constituencies_won: usize,
}

fn party_inputs<'a>(records: &'a [ElectionRecord]) -> Vec<PartyInputs<'a>> {
    let won = winners(records, TieBreak::FirstEncountered);
    group_by(records, |r| r.party.as_str())
        .into_iter()
        .map(|(party, rows)| {
            let shares: Vec<f64> = rows
                .iter()
                .map(|r| r.vote_share_pct)
                .filter(|s| s.is_finite())
                .collect();
            PartyInputs {
                party,
                total_votes: rows.iter().map(|r| r.votes).sum(),
                // Rows without counting data are taken as fully counted.
                counted_votes: rows.iter().map(|r| r.counted_votes.unwrap_or(r.votes)).sum(),
                rows: rows.len(),
                avg_share_pct: if shares.is_empty() { 0.0 } else { mean(&shares) },
                constituencies_won: won.iter().filter(|w| w.party == party).count(),
            }
        })
        .collect()
}

impl PredictionModel {
    /// Predicts the winner of the election from the current records.
    ///
    /// Fails on an empty election, or when the confidence level is not
    /// strictly between 0 and 1.
    pub fn predict(
        &self,
        records: &[ElectionRecord],
        confidence_level: f64,
    ) -> Result<PredictionResult, StatsError> {
        info!(
            "predict: model {} on {:?} records, confidence {}",
            self,
            records.len(),
            confidence_level
        );
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(StatsError::InvalidParameter {
                name: "confidence_level".to_string(),
                value: confidence_level.to_string(),
            });
        }
        if records.is_empty() {
            return Err(StatsError::EmptyElection);
        }

        let inputs = party_inputs(records);
        let grand_total: u64 = inputs.iter().map(|p| p.total_votes).sum();
        let scored: Vec<(f64, u64)> = match self {
            PredictionModel::Ensemble => inputs
                .iter()
                .map(|p| {
                    let score = p.total_votes as f64 * 0.5
                        + p.rows as f64 * 1000.0 * 0.3
                        + p.avg_share_pct * 100.0 * 0.2;
                    (score, (p.total_votes as f64 * 1.05).floor() as u64)
                })
                .collect(),
            PredictionModel::LinearRegression => {
                let counted: u64 = inputs.iter().map(|p| p.counted_votes).sum();
                let completion = counted as f64 / grand_total as f64;
                debug!("predict: completion ratio {}", completion);
                inputs
                    .iter()
                    .map(|p| {
                        let projected = if completion.is_finite() && completion > 0.0 {
                            (p.counted_votes as f64 / completion).round()
                        } else {
                            p.total_votes as f64
                        };
                        (projected, projected as u64)
                    })
                    .collect()
            }
            PredictionModel::RandomForest => {
                let constituencies: usize = inputs.iter().map(|p| p.constituencies_won).sum();
                inputs
                    .iter()
                    .map(|p| {
                        let share = pct(p.total_votes as f64, grand_total as f64);
                        let won_share =
                            pct(p.constituencies_won as f64, constituencies as f64);
                        let score = 0.4 * finite_or_zero(share)
                            + 0.4 * finite_or_zero(won_share)
                            + 0.2 * p.avg_share_pct;
                        (score, p.total_votes)
                    })
                    .collect()
            }
            PredictionModel::Bayesian => {
                let denominator = grand_total as f64 + inputs.len() as f64;
                inputs
                    .iter()
                    .map(|p| {
                        let posterior = (p.total_votes as f64 + 1.0) / denominator;
                        (posterior, (posterior * grand_total as f64).round() as u64)
                    })
                    .collect()
            }
        };

        let score_sum: f64 = scored.iter().map(|(s, _)| s).sum();
        let predicted_sum: u64 = scored.iter().map(|(_, v)| v).sum();
        let z = z_score_for(confidence_level);
        let mut parties: Vec<PartyPrediction> = inputs
            .iter()
            .zip(scored.iter())
            .map(|(p, (score, predicted_votes))| {
                let win_probability_pct = if score_sum > 0.0 {
                    round2(score / score_sum * 100.0)
                } else {
                    round2(100.0 / inputs.len() as f64)
                };
                let predicted_share_pct = pct(*predicted_votes as f64, predicted_sum as f64);
                let (interval_low_pct, interval_high_pct) =
                    share_interval(predicted_share_pct, predicted_sum, z);
                PartyPrediction {
                    party: p.party.to_string(),
                    total_votes: p.total_votes,
                    score: *score,
                    win_probability_pct,
                    predicted_votes: *predicted_votes,
                    predicted_share_pct,
                    interval_low_pct,
                    interval_high_pct,
                }
            })
            .collect();
        parties.sort_by(|a, b| b.win_probability_pct.total_cmp(&a.win_probability_pct));
        for p in parties.iter() {
            debug!("predict: {:?}", p);
        }
        let predicted_winner = match parties.first() {
            Some(p) => p.party.clone(),
            None => {
                warn!("predict: no party in the records");
                return Err(StatsError::EmptyElection);
            }
        };
        Ok(PredictionResult {
            model: *self,
            confidence_level,
            predicted_winner,
            parties,
        })
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Normal-approximation interval on a share, clamped to [0, 100].
fn share_interval(share_pct: f64, n: u64, z: f64) -> (f64, f64) {
    if n == 0 || !share_pct.is_finite() {
        return (f64::NAN, f64::NAN);
    }
    let p = share_pct / 100.0;
    let half_width = z * (p * (1.0 - p) / n as f64).sqrt();
    (
        (p - half_width).max(0.0) * 100.0,
        (p + half_width).min(1.0) * 100.0,
    )
}

/// The two-sided critical value of the standard normal distribution.
pub fn z_score_for(confidence_level: f64) -> f64 {
    inverse_normal_cdf((1.0 + confidence_level) / 2.0)
}

// Rational approximation of the standard normal quantile (P. J. Acklam),
// with a relative error below 1.2e-9.
fn inverse_normal_cdf(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e+01,
        2.209460984245205e+02,
        -2.759285104469687e+02,
        1.383577518672690e+02,
        -3.066479806614716e+01,
        2.506628277459239e+00,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e+01,
        1.615858368580409e+02,
        -1.556989798598866e+02,
        6.680131188771972e+01,
        -1.328068155288572e+01,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-03,
        -3.223964580411365e-01,
        -2.400758277161838e+00,
        -2.549732539343734e+00,
        4.374664141464968e+00,
        2.938163982698783e+00,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-03,
        3.224671290700398e-01,
        2.445134137142996e+00,
        3.754408661907416e+00,
    ];
    const P_LOW: f64 = 0.02425;

    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -inverse_normal_cdf(1.0 - p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;

    fn scenario() -> Vec<ElectionRecord> {
        records(&[
            ("North", "X", "Party A", 600, 2000),
            ("North", "X", "Party B", 400, 2000),
        ])
    }

    #[test]
    fn parse_model_names() {
        for m in PredictionModel::ALL.iter() {
            assert_eq!(m.to_string().parse::<PredictionModel>(), Ok(*m));
        }
        assert_eq!(
            "random_forest".parse::<PredictionModel>(),
            Ok(PredictionModel::RandomForest)
        );
        assert!("neural".parse::<PredictionModel>().is_err());
    }

    #[test]
    fn critical_values() {
        assert!((z_score_for(0.95) - 1.959964).abs() < 1e-6);
        assert!((z_score_for(0.99) - 2.575829).abs() < 1e-6);
        assert!((z_score_for(0.80) - 1.281552).abs() < 1e-6);
    }

    #[test]
    fn ensemble_weights() {
        let res = PredictionModel::Ensemble.predict(&scenario(), 0.95).unwrap();
        assert_eq!(res.predicted_winner, "Party A");
        let a = &res.parties[0];
        assert_close(a.score, 600.0 * 0.5 + 300.0 + 60.0 * 20.0);
        assert_eq!(a.win_probability_pct, 58.06);
        assert_eq!(res.parties[1].win_probability_pct, 41.94);
        assert_eq!(a.predicted_votes, 630);
        assert_eq!(res.parties[1].predicted_votes, 420);
        assert_close(a.predicted_share_pct, 60.0);
        assert!(a.interval_low_pct < 60.0 && 60.0 < a.interval_high_pct);
        assert_close(60.0 - a.interval_low_pct, a.interval_high_pct - 60.0);
    }

    #[test]
    fn linear_extrapolation() {
        let mut rs = scenario();
        rs[0].counted_votes = Some(400);
        rs[1].counted_votes = Some(100);
        let res = PredictionModel::LinearRegression.predict(&rs, 0.9).unwrap();
        assert_eq!(res.predicted_winner, "Party A");
        assert_eq!(res.parties[0].predicted_votes, 800);
        assert_eq!(res.parties[1].predicted_votes, 200);
        assert_eq!(res.parties[0].win_probability_pct, 80.0);
    }

    #[test]
    fn bayesian_posterior() {
        let res = PredictionModel::Bayesian.predict(&scenario(), 0.95).unwrap();
        assert_close(res.parties[0].score, 601.0 / 1002.0);
        assert_eq!(res.parties[0].predicted_votes, 600);
    }

    #[test]
    fn forest_counts_seats() {
        let rs = records(&[
            ("North", "N1", "A", 900, 2000),
            ("North", "N1", "B", 100, 2000),
            ("North", "N2", "A", 400, 2000),
            ("North", "N2", "B", 450, 2000),
            ("North", "N3", "A", 400, 2000),
            ("North", "N3", "B", 450, 2000),
        ]);
        let res = PredictionModel::RandomForest.predict(&rs, 0.95).unwrap();
        // B wins more seats, A has more votes.
        let b = res.parties.iter().find(|p| p.party == "B").unwrap();
        let share_b = 1000.0 * 100.0 / 2700.0;
        let avg_b = (10.0 + 450.0 * 100.0 / 850.0 * 2.0) / 3.0;
        assert_close(b.score, 0.4 * share_b + 0.4 * 200.0 / 3.0 + 0.2 * avg_b);
    }

    #[test]
    fn parameters_are_checked() {
        assert_eq!(
            PredictionModel::Ensemble.predict(&[], 0.95),
            Err(StatsError::EmptyElection)
        );
        for level in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                PredictionModel::Ensemble.predict(&scenario(), level),
                Err(StatsError::InvalidParameter { .. })
            ));
        }
    }
}
