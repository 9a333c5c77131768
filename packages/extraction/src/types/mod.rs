//! Data types for products, contaminants, fragments and configuration.

pub mod config;
pub mod contaminant;
pub mod fragment;
mod lenient;
pub mod product;
