//! Empirical constants spec'd out as configuration rather than hard-coded,
//! per the "WASD smoothing constants are empirical" design note. A host
//! (e.g. `viz-cli`) builds one `ViewerConfig` and threads it through the
//! [`crate::facade::Facade`].

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfig {
    pub row_height_px: f32,
    pub min_span_width_px: f32,
    pub label_min_width_px: f32,
    pub lane_header_height_px: f32,
    pub min_lane_height_px: f32,
    pub max_lane_height_px: f32,
    pub wasd_pan_acceleration: f32,
    pub wasd_friction: f32,
    pub wasd_snap_threshold: f32,
    pub zoom_history_depth: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            row_height_px: 20.0,
            min_span_width_px: 0.5,
            label_min_width_px: 20.0,
            lane_header_height_px: 28.0,
            min_lane_height_px: 16.0,
            max_lane_height_px: 600.0,
            wasd_pan_acceleration: 2400.0,
            wasd_friction: 0.85,
            wasd_snap_threshold: 0.0001,
            zoom_history_depth: 64,
        }
    }
}
