#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use itertools::Itertools;
use log::{debug, warn};

use super::step::{e_step, ln_likelihood, lower_bound, m_step_with};
use super::{DegeneratePolicy, EmError};
use crate::data::{ResponsibilityMatrix, Sample};
use crate::dist::MixtureModel;

/// Relative decrease in log-likelihood tolerated as floating-point noise
/// before an iteration is reported as non-monotone
const MONOTONE_SLACK: f64 = 1E-10;

/// Why an EM run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum StopReason {
    /// The log-likelihood improved by less than the tolerance
    Converged,
    /// The iteration budget ran out
    MaxIterations,
}

/// Where an [`Em`] is in its iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum EmState {
    /// Holding the initial model; no responsibilities yet
    Initialized,
    /// Responsibilities are current for the model
    EStepDone,
    /// The model was just replaced by an M-step
    MStepDone,
    /// No further steps will run
    Stopped(StopReason),
}

/// An operation on an [`Em`] that depends on its state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum Transition {
    EStep,
    MStep,
    /// Evaluating the lower bound, which needs responsibilities
    LowerBound,
}

/// Parameters for an EM run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct EmParams {
    /// Maximum number of E+M iterations to run
    pub max_iter: usize,
    /// Stop once the log-likelihood improves by less than this
    pub tol: f64,
    /// How the M-step handles components with no responsibility mass
    pub degenerate_policy: DegeneratePolicy,
}

impl Default for EmParams {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tol: 1E-8,
            degenerate_policy: DegeneratePolicy::Fail,
        }
    }
}

impl EmParams {
    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self { max_iter, ..self }
    }

    pub fn with_tol(self, tol: f64) -> Self {
        Self { tol, ..self }
    }

    pub fn with_degenerate_policy(
        self,
        degenerate_policy: DegeneratePolicy,
    ) -> Self {
        Self {
            degenerate_policy,
            ..self
        }
    }
}

/// The outcome of [`Em::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct EmFit {
    /// The final model
    pub model: MixtureModel,
    /// Responsibilities from the last E-step, computed under the model that
    /// preceded `model`. `None` if no iteration ran.
    pub responsibilities: Option<ResponsibilityMatrix>,
    /// Number of completed E+M iterations
    pub n_iter: usize,
    pub stop_reason: StopReason,
    /// Log-likelihood of the initial model followed by that of each
    /// iteration's model
    pub ln_likelihoods: Vec<f64>,
}

impl EmFit {
    /// Log-likelihood of the final model
    pub fn ln_likelihood(&self) -> f64 {
        self.ln_likelihoods
            .last()
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// `true` if no iteration decreased the log-likelihood by more than `tol`
    pub fn is_monotone(&self, tol: f64) -> bool {
        self.ln_likelihoods
            .iter()
            .tuple_windows()
            .all(|(prev, next)| *next >= prev - tol)
    }
}

/// Runs EM over a borrowed sample.
///
/// The model is replaced, never mutated, by every M-step. Steps must
/// alternate: calling [`Em::m_step`] before [`Em::e_step`], or either after
/// the run has stopped, is an [`EmError::InvalidTransition`]. A failed step
/// leaves the state untouched.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let sample = Sample::new(vec![-0.2, 0.0, 0.3, 1.8, 2.0, 2.1]).unwrap();
/// let init = MixtureModel::from_parts(
///     vec![0.5, 0.5],
///     vec![-1.0, 0.0],
///     vec![0.5, 0.5],
/// ).unwrap();
///
/// let mut em = Em::new(&sample, init).unwrap();
/// assert_eq!(em.state(), EmState::Initialized);
///
/// em.e_step().unwrap();
/// assert_eq!(em.state(), EmState::EStepDone);
///
/// em.m_step().unwrap();
/// assert_eq!(em.state(), EmState::MStepDone);
///
/// // can't M-step twice in a row
/// assert!(em.m_step().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Em<'s> {
    sample: &'s Sample,
    model: MixtureModel,
    resp: Option<ResponsibilityMatrix>,
    state: EmState,
    n_iter: usize,
    policy: DegeneratePolicy,
}

impl<'s> Em<'s> {
    /// Start EM from an initial model.
    ///
    /// # Errors
    ///
    /// The initial model must be valid: weights summing to one and positive
    /// standard deviations.
    pub fn new(sample: &'s Sample, model: MixtureModel) -> Result<Self, EmError> {
        let model =
            MixtureModel::new(model.weights().to_vec(), model.components().to_vec())?;
        Ok(Em {
            sample,
            model,
            resp: None,
            state: EmState::Initialized,
            n_iter: 0,
            policy: DegeneratePolicy::default(),
        })
    }

    /// Set how the M-step handles components with no responsibility mass
    pub fn with_policy(self, policy: DegeneratePolicy) -> Self {
        Self { policy, ..self }
    }

    #[inline]
    pub fn state(&self) -> EmState {
        self.state
    }

    /// The current model
    #[inline]
    pub fn model(&self) -> &MixtureModel {
        &self.model
    }

    #[inline]
    pub fn sample(&self) -> &Sample {
        self.sample
    }

    /// Responsibilities from the most recent E-step
    #[inline]
    pub fn responsibilities(&self) -> Option<&ResponsibilityMatrix> {
        self.resp.as_ref()
    }

    /// Number of completed M-steps
    #[inline]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    /// Recompute the responsibilities under the current model.
    pub fn e_step(&mut self) -> Result<&ResponsibilityMatrix, EmError> {
        match self.state {
            EmState::Initialized | EmState::MStepDone => {
                let resp = e_step(self.sample, &self.model)?;
                self.state = EmState::EStepDone;
                Ok(self.resp.insert(resp))
            }
            from => Err(EmError::InvalidTransition {
                from,
                attempted: Transition::EStep,
            }),
        }
    }

    /// Replace the model with the maximizer of the lower bound built by the
    /// last E-step.
    pub fn m_step(&mut self) -> Result<&MixtureModel, EmError> {
        let resp = match (self.state, self.resp.as_ref()) {
            (EmState::EStepDone, Some(resp)) => resp,
            (from, _) => {
                return Err(EmError::InvalidTransition {
                    from,
                    attempted: Transition::MStep,
                })
            }
        };

        self.model = m_step_with(self.sample, resp, &self.model, self.policy)?;
        self.n_iter += 1;
        self.state = EmState::MStepDone;
        Ok(&self.model)
    }

    /// Run one full E+M iteration and return the log-likelihood of the new
    /// model.
    pub fn step(&mut self) -> Result<f64, EmError> {
        self.e_step()?;
        self.m_step()?;
        ln_likelihood(self.sample, &self.model)
    }

    /// The lower bound at the current model using the current
    /// responsibilities.
    ///
    /// Right after an E-step this equals the log-likelihood; right after the
    /// following M-step it is at least as large as it was.
    pub fn lower_bound(&self) -> Result<f64, EmError> {
        match self.resp.as_ref() {
            Some(resp) => lower_bound(self.sample, &self.model, resp),
            None => Err(EmError::InvalidTransition {
                from: self.state,
                attempted: Transition::LowerBound,
            }),
        }
    }

    /// Stop the iteration. Further steps fail.
    pub fn stop(&mut self, reason: StopReason) {
        self.state = EmState::Stopped(reason);
    }

    /// Iterate until the log-likelihood stops improving by at least
    /// `params.tol` or `params.max_iter` iterations have run.
    ///
    /// A pending M-step (state [`EmState::EStepDone`]) is finished first and
    /// counts as an iteration. `params.degenerate_policy` replaces any policy
    /// set with [`Em::with_policy`].
    ///
    /// # Errors
    ///
    /// Fails with [`EmError::InvalidTransition`] if the run already stopped,
    /// and with the first error of any step.
    pub fn run(mut self, params: &EmParams) -> Result<EmFit, EmError> {
        self.policy = params.degenerate_policy;

        if self.state == EmState::EStepDone {
            self.m_step()?;
        }

        let mut prev = ln_likelihood(self.sample, &self.model)?;
        let mut ln_likelihoods = vec![prev];
        debug!("em: init ln_likelihood = {}, model = {}", prev, self.model);

        let stop_reason = loop {
            if self.n_iter >= params.max_iter {
                break StopReason::MaxIterations;
            }

            let ll = self.step()?;
            debug!(
                "em: iter = {}, ln_likelihood = {}, model = {}",
                self.n_iter, ll, self.model
            );

            if ll < prev - MONOTONE_SLACK * prev.abs().max(1.0) {
                warn!(
                    "em: ln_likelihood decreased from {} to {} at iter {}",
                    prev, ll, self.n_iter
                );
            }

            ln_likelihoods.push(ll);
            let improvement = ll - prev;
            prev = ll;

            if improvement.abs() < params.tol {
                break StopReason::Converged;
            }
        };

        self.stop(stop_reason);

        Ok(EmFit {
            model: self.model,
            responsibilities: self.resp,
            n_iter: self.n_iter,
            stop_reason,
            ln_likelihoods,
        })
    }
}

/// Run EM from `init` until it stops.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
///
/// let sample = Sample::new(vec![-0.2, 0.0, 0.3, 1.8, 2.0, 2.1]).unwrap();
/// let init = MixtureModel::from_parts(
///     vec![0.5, 0.5],
///     vec![-1.0, 3.0],
///     vec![1.0, 1.0],
/// ).unwrap();
///
/// let res = fit(&sample, init, &EmParams::default()).unwrap();
///
/// assert!(res.is_monotone(1E-9));
/// let means = res.model.means();
/// assert!((means[0] - 0.033).abs() < 0.05);
/// assert!((means[1] - 1.967).abs() < 0.05);
/// ```
pub fn fit(
    sample: &Sample,
    init: MixtureModel,
    params: &EmParams,
) -> Result<EmFit, EmError> {
    Em::new(sample, init)?.run(params)
}
