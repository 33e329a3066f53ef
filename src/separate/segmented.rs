//! Segmented strategy: independent fixed-period passes over overlapping
//! time segments, cross-faded back together.
//!
//! Long recordings rarely keep one period for their whole duration. Slicing
//! the signal into overlapping segments lets each segment find its own
//! period; triangular ramps over the overlap keep the joins seamless since
//! the rising and falling gains sum to one.

use super::fixed;
use crate::core::types::{FramePlan, Sample};
use crate::core::window::crossfade_ramps;
use crate::error::SeparationError;
use log::debug;

pub(crate) fn background(
    channels: &[Vec<Sample>],
    plan: &FramePlan,
) -> Result<Vec<Vec<Sample>>, SeparationError> {
    let num_samples = channels.first().map(|c| c.len()).unwrap_or(0);
    let segment_len = plan.segment_samples;
    let stride = plan.segment_stride;
    // Too short to split: one segment is just the fixed-period strategy
    if num_samples < segment_len + stride {
        return fixed::background(channels, plan);
    }

    let overlap = segment_len - stride;
    let num_segments = 1 + (num_samples - segment_len + stride - 1) / stride;
    debug!(
        "segmented separation: {} segments of {} samples, stride {}",
        num_segments, segment_len, stride
    );
    let (fade_in, fade_out) = crossfade_ramps(overlap);

    let mut backgrounds: Vec<Vec<Sample>> =
        channels.iter().map(|c| vec![0.0; c.len()]).collect();
    for segment_idx in 0..num_segments {
        let start = segment_idx * stride;
        let end = (start + segment_len).min(num_samples);
        let segment: Vec<Vec<Sample>> =
            channels.iter().map(|c| c[start..end].to_vec()).collect();
        let segment_bg = fixed::background(&segment, plan)?;

        let last = segment_idx + 1 == num_segments;
        for (channel_idx, mut seg_channel) in segment_bg.into_iter().enumerate() {
            if segment_idx > 0 {
                for (value, &gain) in seg_channel.iter_mut().zip(fade_in.iter()) {
                    *value *= gain;
                }
            }
            if !last {
                let len = seg_channel.len();
                for (value, &gain) in seg_channel[len - overlap..]
                    .iter_mut()
                    .zip(fade_out.iter())
                {
                    *value *= gain;
                }
            }
            let out = &mut backgrounds[channel_idx];
            for (i, &value) in seg_channel.iter().enumerate() {
                out[start + i] += value;
            }
        }
    }
    Ok(backgrounds)
}
