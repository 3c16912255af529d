//! Storyboard timestamp selection.
//!
//! Uniform sampling takes the middle of `count` equal slots inside a 2%
//! margin. Scene-based sampling turns scene changes into segments, thins or
//! splits them to `count`, and samples each at 35% of its length.

use crate::cue::timestamp::{from_millis, to_millis};
use std::collections::HashSet;

/// Target spacing between sampled tiles.
pub const SAMPLE_INTERVAL_SECONDS: f64 = 5.0;

/// Number of tiles to sample for a video of `duration` seconds.
#[must_use]
pub fn sample_count(duration: f64, max_tiles: usize) -> usize {
    if duration <= 0.0 || max_tiles == 0 {
        return 0;
    }
    let wanted = (duration / SAMPLE_INTERVAL_SECONDS).ceil() as usize;
    wanted.clamp(1, max_tiles)
}

#[must_use]
pub fn select_uniform_timestamps(duration: f64, count: usize) -> Vec<f64> {
    if count == 0 || duration <= 0.0 {
        return Vec::new();
    }

    let margin_ratio = 0.02;
    let effective_start = duration * margin_ratio;
    let effective_duration = duration * (1.0 - 2.0 * margin_ratio);

    (0..count)
        .map(|i| {
            let ratio = (i as f64 + 0.5) / count as f64;
            let timestamp = effective_start + effective_duration * ratio;
            timestamp.max(0.0).min((duration - 0.1).max(0.0))
        })
        .collect()
}

#[must_use]
pub fn select_scene_timestamps(duration: f64, scene_changes: &[f64], count: usize) -> Vec<f64> {
    if count == 0 || duration <= 0.0 {
        return Vec::new();
    }

    let mut segments = build_segments(duration, scene_changes);
    if segments.is_empty() {
        segments.push((0.0, duration));
    }

    if segments.len() > count {
        segments = select_evenly(&segments, count);
    } else if segments.len() < count {
        segments = split_longest_segments(segments, count);
    }

    segments
        .iter()
        .take(count)
        .map(|&(start, end)| representative_time(start, end, duration))
        .collect()
}

/// Sorts, drops timestamps before `offset`, collapses timestamps equal at
/// millisecond precision, and thins the result evenly down to `max_count`.
#[must_use]
pub fn finalize_timestamps(mut times: Vec<f64>, offset: f64, max_count: usize) -> Vec<f64> {
    let offset = offset.max(0.0);
    times.retain(|t| t.is_finite() && *t >= offset);
    times.sort_by(f64::total_cmp);

    let mut seen = HashSet::new();
    times.retain(|t| seen.insert(to_millis(*t)));

    cap_evenly(&times, max_count)
        .into_iter()
        .map(|t| from_millis(to_millis(t)))
        .collect()
}

/// Keeps at most `max_count` items spread evenly over the input, always
/// including the first and the last.
#[must_use]
pub fn cap_evenly(items: &[f64], max_count: usize) -> Vec<f64> {
    if items.len() <= max_count {
        return items.to_vec();
    }
    select_evenly(items, max_count)
}

fn build_segments(duration: f64, scene_changes: &[f64]) -> Vec<(f64, f64)> {
    let mut points: Vec<f64> = vec![0.0];
    points.extend(scene_changes.iter().copied().filter(|t| t.is_finite()));
    points.push(duration);

    points.sort_by(f64::total_cmp);
    points.dedup_by(|a, b| (*a - *b).abs() < 0.1);

    points
        .windows(2)
        .map(|w| (w[0], w[1]))
        .filter(|(start, end)| end - start >= 0.5)
        .collect()
}

fn select_evenly<T: Copy>(items: &[T], count: usize) -> Vec<T> {
    if items.is_empty() || count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![items[0]];
    }

    let step = (items.len() - 1) as f64 / (count - 1) as f64;
    let mut picked: Vec<usize> = (0..count)
        .map(|i| ((i as f64) * step).round() as usize)
        .map(|index| index.min(items.len() - 1))
        .collect();
    picked.dedup();
    picked.into_iter().map(|i| items[i]).collect()
}

fn split_longest_segments(mut segments: Vec<(f64, f64)>, target_count: usize) -> Vec<(f64, f64)> {
    while segments.len() < target_count {
        let Some(longest) = segments
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| (a.1 - a.0).total_cmp(&(b.1 - b.0)))
            .map(|(i, _)| i)
        else {
            break;
        };

        let (start, end) = segments[longest];
        let mid = f64::midpoint(start, end);
        segments[longest] = (start, mid);
        segments.insert(longest + 1, (mid, end));
    }

    segments
}

/// 35% into the segment, at least half a second from its edges when it is
/// long enough to allow that.
fn representative_time(start: f64, end: f64, duration: f64) -> f64 {
    let length = end - start;
    let offset = (length * 0.35).max(0.5).min(length - 0.5).max(0.0);
    (start + offset).max(0.0).min((duration - 0.1).max(0.0))
}
