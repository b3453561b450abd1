use std::path::Path;

use crate::foundation::core::Argb;
use crate::foundation::error::{MipviewError, MipviewResult};

/// Immutable renderer configuration.
///
/// Every field has a default, so a JSON file may override any subset:
///
/// ```
/// let opts = mipview::RendererOpts::from_json_str(r#"{ "screen_scales": [1.0, 0.5] }"#).unwrap();
/// assert_eq!(opts.screen_scales, vec![1.0, 0.5]);
/// assert_eq!(opts.bands_per_thread, 10);
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererOpts {
    /// Descending screen scale factors in `(0, 1]`; index 0 is full resolution.
    pub screen_scales: Vec<f64>,
    /// Frame time budget for the coarsest pass, in nanoseconds.
    pub target_render_nanos: u64,
    /// Share of `target_render_nanos` a pass one scale finer than the starting scale must stay
    /// under before full repaints start there. Values below 1 keep the start scale from flipping
    /// when pass times hover around the budget.
    pub finer_start_fraction: f64,
    /// Worker threads for the projector pool (`None`: one per core).
    pub num_rendering_threads: Option<usize>,
    /// Row bands per worker thread.
    pub bands_per_thread: usize,
    /// Color used where no source is visible.
    pub background_argb: Argb,
    /// Render one mipmap level coarser and fall back to coarser levels pixel by pixel while
    /// data is still loading.
    pub allow_coarse_fallback: bool,
    /// Consecutive fully-loaded passes required before the coarser bias is dropped.
    pub fast_frames_to_refine: u32,
    /// Maximum consecutive full-resolution re-renders while data is incomplete.
    pub max_incomplete_retries: u32,
    /// Pause before re-rendering a pass with incomplete data, in milliseconds.
    ///
    /// The pause is slept on the painting thread at the end of [`paint`], so the painter is
    /// briefly busy outside its idle wait; keep it small or set it to 0.
    ///
    /// [`paint`]: crate::MultiResolutionRenderer::paint
    pub incomplete_retry_delay_ms: u64,
}

impl Default for RendererOpts {
    fn default() -> Self {
        Self {
            screen_scales: vec![1.0, 0.75, 0.5, 0.25, 0.125],
            target_render_nanos: 30_000_000,
            finer_start_fraction: 1.0 / 3.0,
            num_rendering_threads: None,
            bands_per_thread: 10,
            background_argb: Argb::BLACK,
            allow_coarse_fallback: true,
            fast_frames_to_refine: 3,
            max_incomplete_retries: 64,
            incomplete_retry_delay_ms: 2,
        }
    }
}

impl RendererOpts {
    /// Check configuration invariants.
    pub fn validate(&self) -> MipviewResult<()> {
        if self.screen_scales.is_empty() {
            return Err(MipviewError::validation(
                "screen_scales must contain at least one scale",
            ));
        }
        for (i, &s) in self.screen_scales.iter().enumerate() {
            if !(s > 0.0 && s <= 1.0) {
                return Err(MipviewError::validation(format!(
                    "screen_scales[{i}] = {s} is outside (0, 1]"
                )));
            }
        }
        if self.screen_scales.windows(2).any(|w| w[1] >= w[0]) {
            return Err(MipviewError::validation(
                "screen_scales must be strictly descending",
            ));
        }
        if self.num_rendering_threads == Some(0) {
            return Err(MipviewError::validation(
                "num_rendering_threads must be >= 1 when set",
            ));
        }
        if !(self.finer_start_fraction > 0.0 && self.finer_start_fraction <= 1.0) {
            return Err(MipviewError::validation(format!(
                "finer_start_fraction = {} is outside (0, 1]",
                self.finer_start_fraction
            )));
        }
        if self.bands_per_thread == 0 {
            return Err(MipviewError::validation("bands_per_thread must be >= 1"));
        }
        Ok(())
    }

    /// Parse and validate options from JSON.
    pub fn from_json_str(json: &str) -> MipviewResult<Self> {
        let opts: Self = serde_json::from_str(json)
            .map_err(|e| MipviewError::config(format!("invalid renderer options: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Read, parse, and validate options from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> MipviewResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MipviewError::config(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Index of the coarsest screen scale.
    pub fn coarsest_scale_index(&self) -> usize {
        self.screen_scales.len().saturating_sub(1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/opts.rs"]
mod tests;
