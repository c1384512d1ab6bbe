use glam::Quat;

/// Zero-pose calibration filter.
///
/// Stores a single reference attitude captured while the user holds the
/// "zero" pose (phone strapped on, standing straight). Every later reading
/// is reported relative to that reference: `offset⁻¹ * raw`. Before the
/// first `calibrate` call the offset is identity, so readings pass through
/// unchanged.
///
/// The filter owns the offset exclusively; recalibrating overwrites it, no
/// history is kept.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationFilter {
    offset: Quat,
    calibrated: bool,
}

impl CalibrationFilter {
    pub fn new() -> Self {
        Self {
            offset: Quat::IDENTITY,
            calibrated: false,
        }
    }

    /// Capture `raw` as the new zero reference.
    ///
    /// Non-finite input is rejected and the previous offset kept.
    pub fn calibrate(&mut self, raw: Quat) {
        if !raw.is_finite() {
            tracing::warn!("Ignoring calibration request with non-finite attitude");
            return;
        }
        self.offset = raw.normalize();
        self.calibrated = true;
        tracing::info!("Zero pose captured");
    }

    /// Return `raw` expressed relative to the stored zero reference.
    ///
    /// For unit quaternions the inverse is the conjugate, so this is always
    /// defined.
    pub fn corrected(&self, raw: Quat) -> Quat {
        self.offset.conjugate() * raw
    }

    /// Whether a zero pose has been captured this session.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}

impl Default for CalibrationFilter {
    fn default() -> Self {
        Self::new()
    }
}
