/// Parameters controlling the junction solver.
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    /// Minimum distance a corner is pushed past its intersection limit when
    /// computing the default offset.
    pub min_corner_offset: f64,
    /// Outward shift of a curb used by the additional-limit fallback.
    pub additional_width: f64,
    /// Subdivision depth of curve-curve intersection.
    pub intersection_depth: u32,
    /// Upper bound of any segment end offset.
    pub max_offset: f64,
    /// Length of the probe line cast from the centerline, in half-widths.
    pub probe_length: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_corner_offset: 0.5,
            additional_width: 1.0,
            intersection_depth: 10,
            max_offset: 1000.0,
            probe_length: 8.0,
        }
    }
}
