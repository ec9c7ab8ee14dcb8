//! Export to the two formats spec.md §4.9 names: a lossless JSON document of
//! the normalized model, and a rendered SVG snapshot of a single view.

pub mod json;
pub mod svg;
