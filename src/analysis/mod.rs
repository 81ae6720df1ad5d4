//! Numeric helpers for live data reduction.
//!
//! Contains the dense [`Image`] value type used for detector frames and the
//! [`RadialBinnedStatistic`] accumulator that reduces a 2D image to a radial
//! intensity profile.

pub mod image;
pub mod radial;

pub use image::Image;
pub use radial::RadialBinnedStatistic;
