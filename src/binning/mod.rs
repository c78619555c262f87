// binning/mod.rs
mod dimension;
mod locator;

pub use dimension::Dimension;
pub use locator::{calc_size, calc_strides, BinLocator};
