//! Expectation-Maximization for univariate Gaussian mixture models.
//!
//! The crate exposes the four pieces of an EM iteration as pure functions
//! over explicit parameters ([`em::ln_likelihood`], [`em::e_step`],
//! [`em::m_step`], and [`em::lower_bound`]) and an [`em::Em`] driver that
//! walks the E/M state machine.
//!
//! # Example
//!
//! Fit a two-component mixture to data drawn from two Gaussians
//!
//! ```
//! use gmm_em::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::SmallRng::seed_from_u64(0x1234);
//! let sample = Sample::concat_draws(
//!     &[
//!         (Gaussian::new(0.0, 0.4).unwrap(), 50),
//!         (Gaussian::new(2.0, 0.2).unwrap(), 50),
//!     ],
//!     &mut rng,
//! )
//! .unwrap();
//!
//! let init = MixtureModel::from_parts(
//!     vec![0.5, 0.5],
//!     vec![-1.0, 0.0],
//!     vec![0.2, 0.2],
//! )
//! .unwrap();
//!
//! let ll_0 = ln_likelihood(&sample, &init).unwrap();
//!
//! let resp = e_step(&sample, &init).unwrap();
//! let next = m_step(&sample, &resp).unwrap();
//!
//! assert!(ln_likelihood(&sample, &next).unwrap() > ll_0);
//! ```
#![warn(
    clippy::all,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::unseparated_literal_suffix,
    clippy::unreadable_literal,
    clippy::option_option,
    clippy::implicit_clone
)]
#![allow(clippy::many_single_char_names)]

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

pub mod consts;
pub mod data;
pub mod diagnostics;
pub mod dist;
pub mod em;
pub mod misc;
pub mod prelude;
pub mod traits;

pub use em::EmError;

#[macro_export]
macro_rules! impl_display {
    ($kind: ty) => {
        impl ::std::fmt::Display for $kind {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", String::from(self))
            }
        }
    };
}
