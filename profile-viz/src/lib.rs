//! An in-memory model and a pure view-transform layer for interactive
//! profile visualization: ingest Chrome tracing, Firefox Gecko, Speedscope,
//! V8 CPU profile, pprof, PIX, Tracy, `perf script`, collapsed stacks, and
//! React DevTools captures, normalize them into a shared span arena, and
//! turn `(profile, viewport, lane)` into a renderer-agnostic command list.
//!
//! [`facade::Facade`] is the intended entry point for a host application;
//! everything else is usable standalone for a host that wants finer control.

pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod facade;
pub mod geometry;
pub mod interaction;
pub mod lanes;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod renderer;
pub mod search;
pub mod session;
pub mod theme;
pub mod transforms;
pub mod viewport;
