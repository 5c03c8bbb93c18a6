use crate::data::{ResponsibilityMatrix, Sample};
use crate::dist::MixtureModel;
use crate::em::{ln_likelihood, lower_bound, EmError};
use crate::traits::{ContinuousDistr, Parameterized};

use super::{Curve, Mark, Style};

/// One scalar parameter of a mixture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// Weight of component j. The other weights are rescaled so the total
    /// stays one.
    Weight(usize),
    /// Mean of component j
    Mean(usize),
    /// Standard deviation of component j
    Stddev(usize),
}

impl Param {
    #[inline]
    pub fn component(&self) -> usize {
        match self {
            Self::Weight(j) | Self::Mean(j) | Self::Stddev(j) => *j,
        }
    }

    fn label(&self) -> String {
        match self {
            Self::Weight(j) => format!("π{j}"),
            Self::Mean(j) => format!("μ{j}"),
            Self::Stddev(j) => format!("σ{j}"),
        }
    }
}

/// `n` evenly spaced points from `lo` to `hi`, inclusive
///
/// # Example
///
/// ```
/// use gmm_em::diagnostics::linspace;
///
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
/// ```
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| step.mul_add(i as f64, lo)).collect()
        }
    }
}

/// Copy of `model` with one parameter replaced.
///
/// The result is validated; a σ of zero or a weight outside of [0, 1] is
/// [`EmError::InvalidParameters`].
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
/// use gmm_em::diagnostics::{with_param, Param};
///
/// let mm = MixtureModel::from_parts(
///     vec![0.2, 0.3, 0.5],
///     vec![0.0, 1.0, 2.0],
///     vec![1.0, 1.0, 1.0],
/// ).unwrap();
///
/// let mm2 = with_param(&mm, Param::Weight(0), 0.6).unwrap();
/// let ws = mm2.weights();
/// assert!((ws[0] - 0.6).abs() < 1E-12);
/// assert!((ws[1] - 0.15).abs() < 1E-12);
/// assert!((ws[2] - 0.25).abs() < 1E-12);
/// ```
pub fn with_param(
    model: &MixtureModel,
    param: Param,
    value: f64,
) -> Result<MixtureModel, EmError> {
    let k = model.k();
    let component = param.component();
    if component >= k {
        return Err(EmError::NoSuchComponent { component, k });
    }

    let edited = model.map_params(|mut params| {
        match param {
            Param::Mean(j) => params.means[j] = value,
            Param::Stddev(j) => params.stddevs[j] = value,
            Param::Weight(j) => {
                let rest = 1.0 - params.weights[j];
                let n_rest = (k - 1) as f64;
                params.weights.iter_mut().enumerate().for_each(|(ix, w)| {
                    if ix == j {
                        *w = value;
                    } else if rest > 0.0 {
                        *w *= (1.0 - value) / rest;
                    } else {
                        *w = (1.0 - value) / n_rest;
                    }
                });
            }
        }
        params
    });

    MixtureModel::try_from(edited.emit_params()).map_err(EmError::from)
}

fn is_skippable(err: &EmError) -> bool {
    matches!(
        err,
        EmError::InvalidParameters(_) | EmError::DegenerateModel(_)
    )
}

/// Evaluate `f` at the model with `param` set to each value of `grid`,
/// skipping values where the model is invalid or degenerate.
fn sweep<F>(
    model: &MixtureModel,
    param: Param,
    grid: &[f64],
    style: Style,
    f: F,
) -> Result<Curve, EmError>
where
    F: Fn(&MixtureModel) -> Result<f64, EmError>,
{
    let mut xs = Vec::with_capacity(grid.len());
    let mut ys = Vec::with_capacity(grid.len());

    for &value in grid {
        let res = with_param(model, param, value).and_then(|mm| f(&mm));
        match res {
            Ok(y) => {
                xs.push(value);
                ys.push(y);
            }
            Err(err) if is_skippable(&err) => (),
            Err(err) => return Err(err),
        }
    }

    Ok(Curve { xs, ys, style })
}

/// Log-likelihood as a function of one parameter, all others fixed.
///
/// Grid values that make the model invalid (e.g., σ ≤ 0) or give zero
/// density somewhere are left out of the curve.
pub fn sweep_ln_likelihood(
    sample: &Sample,
    model: &MixtureModel,
    param: Param,
    grid: &[f64],
) -> Result<Curve, EmError> {
    let style = Style::new(format!("ln p(x | {})", param.label()), Mark::Line);
    sweep(model, param, grid, style, |mm| ln_likelihood(sample, mm))
}

/// The lower bound built from `resp` as a function of one parameter, all
/// others fixed.
///
/// When `resp` is the E-step output for `model`, this curve touches the
/// [`sweep_ln_likelihood`] curve at the parameter's current value and lies
/// below it elsewhere.
pub fn sweep_lower_bound(
    sample: &Sample,
    model: &MixtureModel,
    resp: &ResponsibilityMatrix,
    param: Param,
    grid: &[f64],
) -> Result<Curve, EmError> {
    let style = Style::new(format!("bound({})", param.label()), Mark::Dashed);
    sweep(model, param, grid, style, |mm| lower_bound(sample, mm, resp))
}

/// Mixture density over `grid`. Points off the support or with a non-finite
/// density are left out.
pub fn mixture_density_curve(
    model: &MixtureModel,
    grid: &[f64],
    style: Style,
) -> Curve {
    let (xs, ys) = grid
        .iter()
        .map(|&x| (x, model.pdf(&x)))
        .filter(|(_, y)| y.is_finite())
        .unzip();
    Curve { xs, ys, style }
}

/// The weighted density of each component over `grid`
pub fn component_density_curves(model: &MixtureModel, grid: &[f64]) -> Vec<Curve> {
    (0..model.k())
        .map(|j| {
            let w = model.weights()[j];
            let cpnt = &model.components()[j];
            let (xs, ys) = grid
                .iter()
                .map(|&x| (x, w * cpnt.pdf(&x)))
                .filter(|(_, y)| y.is_finite())
                .unzip();
            Curve {
                xs,
                ys,
                style: Style::new(format!("π{j} {cpnt}"), Mark::Dashed),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::{Gaussian, MixtureError};
    use crate::em::e_step;
    use crate::traits::HasDensity;

    const TOL: f64 = 1E-12;

    fn sample() -> Sample {
        Sample::new(vec![-0.6, -0.1, 0.2, 0.4, 1.7, 1.95, 2.1, 2.2]).unwrap()
    }

    fn model() -> MixtureModel {
        MixtureModel::from_parts(
            vec![0.5, 0.5],
            vec![-1.0, 0.0],
            vec![0.2, 0.2],
        )
        .unwrap()
    }

    #[test]
    fn linspace_endpoints() {
        let xs = linspace(-1.0, 1.0, 11);
        assert_eq!(xs.len(), 11);
        assert::close(xs[0], -1.0, TOL);
        assert::close(xs[5], 0.0, TOL);
        assert::close(xs[10], 1.0, TOL);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn with_param_mean_and_stddev() {
        let mm = with_param(&model(), Param::Mean(1), 2.0).unwrap();
        assert_eq!(mm.means(), vec![-1.0, 2.0]);
        let mm = with_param(&mm, Param::Stddev(0), 0.7).unwrap();
        assert_eq!(mm.stddevs(), vec![0.7, 0.2]);
    }

    #[test]
    fn with_param_weight_keeps_sum() {
        let mm = with_param(&model(), Param::Weight(1), 0.9).unwrap();
        assert::close(mm.weights()[0], 0.1, TOL);
        assert::close(mm.weights()[1], 0.9, TOL);
    }

    #[test]
    fn with_param_weight_from_one_spreads_remainder() {
        let mm = MixtureModel::from_parts(
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 2.0],
            vec![1.0, 1.0, 1.0],
        )
        .unwrap();
        let mm = with_param(&mm, Param::Weight(0), 0.5).unwrap();
        assert::close(mm.weights().to_vec(), vec![0.5, 0.25, 0.25], TOL);
    }

    #[test]
    fn with_param_rejects_bad_values() {
        assert!(matches!(
            with_param(&model(), Param::Stddev(0), 0.0),
            Err(EmError::InvalidParameters(MixtureError::Component {
                ix: 0,
                ..
            }))
        ));
        assert!(matches!(
            with_param(&model(), Param::Weight(0), 1.5),
            Err(EmError::InvalidParameters(MixtureError::WeightTooLow {
                ix: 1,
                ..
            }))
        ));
    }

    #[test]
    fn with_param_rejects_missing_component() {
        assert_eq!(
            with_param(&model(), Param::Mean(2), 0.0),
            Err(EmError::NoSuchComponent { component: 2, k: 2 })
        );
    }

    #[test]
    fn sweep_skips_invalid_grid_points() {
        let grid = vec![-0.1, 0.0, 0.1, 0.2];
        let curve =
            sweep_ln_likelihood(&sample(), &model(), Param::Stddev(0), &grid)
                .unwrap();
        assert_eq!(curve.xs, vec![0.1, 0.2]);
        assert_eq!(curve.ys.len(), 2);
    }

    #[test]
    fn sweep_propagates_missing_component() {
        let res = sweep_ln_likelihood(&sample(), &model(), Param::Mean(5), &[0.0]);
        assert!(matches!(res, Err(EmError::NoSuchComponent { .. })));
    }

    #[test]
    fn bound_touches_ln_likelihood_at_current_value() {
        let sample = sample();
        let mm = model();
        let resp = e_step(&sample, &mm).unwrap();
        let grid = linspace(-2.0, 3.0, 51);

        let ll = sweep_ln_likelihood(&sample, &mm, Param::Mean(1), &grid)
            .unwrap();
        let lb =
            sweep_lower_bound(&sample, &mm, &resp, Param::Mean(1), &grid)
                .unwrap();

        assert_eq!(ll.xs, lb.xs);
        for ((&x, &l), &b) in ll.xs.iter().zip(ll.ys.iter()).zip(lb.ys.iter())
        {
            assert!(b <= l + 1E-9);
            if x.abs() < 1E-9 {
                assert::close(b, l, 1E-6);
            }
        }
    }

    #[test]
    fn lower_bound_sweep_keeps_narrow_components() {
        let sample = sample();
        let mm = model();
        let resp = e_step(&sample, &mm).unwrap();
        let grid = vec![0.001, 0.01, 0.2];
        let lb = sweep_lower_bound(&sample, &mm, &resp, Param::Stddev(0), &grid)
            .unwrap();
        assert_eq!(lb.xs, grid);
        assert!(lb.ys.iter().all(|y| y.is_finite()));
    }

    #[test]
    fn mixture_density_curve_matches_f() {
        let mm = model();
        let grid = linspace(-2.0, 1.0, 7);
        let curve =
            mixture_density_curve(&mm, &grid, Style::new("p(x)", Mark::Line));
        assert_eq!(curve.xs, grid);
        for (x, y) in curve.xs.iter().zip(curve.ys.iter()) {
            assert::close(*y, mm.f(x), TOL);
        }
    }

    #[test]
    fn component_curves_sum_to_mixture() {
        let mm = model();
        let grid = linspace(-2.0, 1.0, 7);
        let curves = component_density_curves(&mm, &grid);
        assert_eq!(curves.len(), 2);
        for (i, x) in grid.iter().enumerate() {
            let total = curves[0].ys[i] + curves[1].ys[i];
            assert::close(total, mm.f(x), TOL);
        }
    }

    #[test]
    fn density_curve_drops_non_finite_values() {
        let mm = MixtureModel::new_unchecked(
            vec![1.0],
            vec![Gaussian::new_unchecked(0.0, 0.0)],
        );
        let curve =
            mixture_density_curve(&mm, &[0.0, 1.0], Style::new("p", Mark::Line));
        // σ = 0 makes the log density NaN everywhere
        assert!(curve.xs.is_empty());
    }
}
