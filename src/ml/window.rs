/// The single contiguous frame range selected for clip extraction.
///
/// `start` is inclusive, `end` exclusive against the scored sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnomalyWindow {
    pub start: usize,
    pub end: usize,
}

/// Derives the padded window covering every anomalous index.
///
/// The padded min/max is taken over the whole index set, so scattered
/// bursts in one video still collapse into a single (possibly large)
/// window. Multi-segment output is out of scope.
pub fn anomaly_window(
    indices: &[usize],
    total_frames: usize,
    padding: usize,
) -> Option<AnomalyWindow> {
    let first = *indices.first()?;
    let last = *indices.last()?;
    Some(AnomalyWindow {
        start: first.saturating_sub(padding),
        end: (last + padding).min(total_frames),
    })
}
