//! Parameter sweeps and curves for looking at EM
//!
//! Everything here produces plain numeric series ([`Curve`]s). Drawing them
//! is the job of a [`PlotSink`], which this crate only defines.
mod plot;
mod sweep;

pub use plot::{render_fit, PlotSink, TsvSink};
pub use sweep::{
    component_density_curves, linspace, mixture_density_curve, sweep_ln_likelihood,
    sweep_lower_bound, with_param, Param,
};

/// How a series is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Line,
    Dashed,
    Points,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub label: String,
    pub mark: Mark,
}

impl Style {
    pub fn new(label: impl Into<String>, mark: Mark) -> Self {
        Style {
            label: label.into(),
            mark,
        }
    }
}

/// A labelled series of (x, y) points
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub style: Style,
}

impl Curve {
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// The point with the largest y, if any
    pub fn argmax(&self) -> Option<(f64, f64)> {
        self.xs
            .iter()
            .copied()
            .zip(self.ys.iter().copied())
            .fold(None, |best, (x, y)| match best {
                Some((_, by)) if by >= y => best,
                _ => Some((x, y)),
            })
    }
}
