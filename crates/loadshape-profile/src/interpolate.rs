/// Share of `duration_secs` proportional to `part` out of `whole` workers.
///
/// `whole` is never zero: callers only split non-empty cohorts.
pub(crate) fn interpolate(part: u32, whole: u32, duration_secs: f64) -> f64 {
    duration_secs * (f64::from(part) / f64::from(whole))
}
