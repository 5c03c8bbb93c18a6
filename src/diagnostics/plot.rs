use std::io;

use super::{mixture_density_curve, Curve, Mark, Style};
use crate::data::Sample;
use crate::dist::MixtureModel;

/// Something that can draw curves and point clouds
pub trait PlotSink {
    type Error;

    fn line(&mut self, curve: &Curve) -> Result<(), Self::Error>;

    fn scatter(
        &mut self,
        xs: &[f64],
        ys: &[f64],
        style: &Style,
    ) -> Result<(), Self::Error>;
}

/// Draw the data along the x axis along with the mixture density before and
/// after fitting.
///
/// # Example
///
/// ```
/// use gmm_em::prelude::*;
/// use gmm_em::diagnostics::{linspace, render_fit, TsvSink};
///
/// let sample = Sample::new(vec![-0.3, 0.1, 1.9, 2.2]).unwrap();
/// let init = MixtureModel::from_parts(
///     vec![0.5, 0.5],
///     vec![-1.0, 3.0],
///     vec![1.0, 1.0],
/// ).unwrap();
/// let fitted = fit(&sample, init.clone(), &EmParams::default()).unwrap();
///
/// let mut sink = TsvSink::new(Vec::new());
/// let grid = linspace(-2.0, 4.0, 13);
/// render_fit(&mut sink, &sample, &init, &fitted.model, &grid).unwrap();
///
/// let out = String::from_utf8(sink.into_inner()).unwrap();
/// // 4 points + 2 × 13 grid values
/// assert_eq!(out.lines().count(), 30);
/// ```
pub fn render_fit<S: PlotSink>(
    sink: &mut S,
    sample: &Sample,
    before: &MixtureModel,
    after: &MixtureModel,
    grid: &[f64],
) -> Result<(), S::Error> {
    let zeros = vec![0.0; sample.len()];
    sink.scatter(
        sample.as_slice(),
        &zeros,
        &Style::new("data", Mark::Points),
    )?;

    let before = mixture_density_curve(
        before,
        grid,
        Style::new("initial", Mark::Dashed),
    );
    sink.line(&before)?;

    let after =
        mixture_density_curve(after, grid, Style::new("fitted", Mark::Line));
    sink.line(&after)
}

/// Writes every point as a tab-separated `label x y` row
#[derive(Debug)]
pub struct TsvSink<W: io::Write> {
    writer: W,
}

impl<W: io::Write> TsvSink<W> {
    pub fn new(writer: W) -> Self {
        TsvSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn rows(&mut self, label: &str, xs: &[f64], ys: &[f64]) -> io::Result<()> {
        xs.iter()
            .zip(ys.iter())
            .try_for_each(|(x, y)| writeln!(self.writer, "{label}\t{x}\t{y}"))
    }
}

impl<W: io::Write> PlotSink for TsvSink<W> {
    type Error = io::Error;

    fn line(&mut self, curve: &Curve) -> io::Result<()> {
        self.rows(&curve.style.label, &curve.xs, &curve.ys)
    }

    fn scatter(
        &mut self,
        xs: &[f64],
        ys: &[f64],
        style: &Style,
    ) -> io::Result<()> {
        self.rows(&style.label, xs, ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(String, Mark, usize)>,
    }

    impl PlotSink for Recorder {
        type Error = std::convert::Infallible;

        fn line(&mut self, curve: &Curve) -> Result<(), Self::Error> {
            self.calls
                .push((curve.style.label.clone(), curve.style.mark, curve.len()));
            Ok(())
        }

        fn scatter(
            &mut self,
            xs: &[f64],
            _ys: &[f64],
            style: &Style,
        ) -> Result<(), Self::Error> {
            self.calls.push((style.label.clone(), style.mark, xs.len()));
            Ok(())
        }
    }

    fn models() -> (MixtureModel, MixtureModel) {
        let before = MixtureModel::from_parts(
            vec![0.5, 0.5],
            vec![-1.0, 0.0],
            vec![0.2, 0.2],
        )
        .unwrap();
        let after = MixtureModel::from_parts(
            vec![0.5, 0.5],
            vec![0.0, 2.0],
            vec![0.4, 0.2],
        )
        .unwrap();
        (before, after)
    }

    #[test]
    fn render_fit_draws_data_then_both_densities() {
        let sample = Sample::new(vec![0.1, 0.2, 1.9]).unwrap();
        let (before, after) = models();
        let grid = [-1.0, 0.0, 1.0, 2.0];

        let mut sink = Recorder::default();
        render_fit(&mut sink, &sample, &before, &after, &grid).unwrap();

        assert_eq!(
            sink.calls,
            vec![
                ("data".to_string(), Mark::Points, 3),
                ("initial".to_string(), Mark::Dashed, 4),
                ("fitted".to_string(), Mark::Line, 4),
            ]
        );
    }

    #[test]
    fn tsv_sink_rows() {
        let mut sink = TsvSink::new(Vec::new());
        sink.scatter(&[1.5, 2.0], &[0.0, 0.0], &Style::new("d", Mark::Points))
            .unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "d\t1.5\t0\nd\t2\t0\n");
    }
}
