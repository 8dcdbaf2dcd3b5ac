//! Individual preprocessing steps

pub mod blur;
pub mod close;
pub mod grayscale;
pub mod threshold;
