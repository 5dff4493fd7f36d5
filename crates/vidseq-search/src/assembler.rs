//! Sequence assembly: merge scored frame matches into temporally
//! contiguous, ranked sequences.
//!
//! The merge tolerates a frame_number gap of 2 (exactly one missing
//! sampled frame), so two frames 4-6 seconds apart in source time still
//! count as one continuous moment. Sequences with fewer than two members
//! are dropped entirely: an isolated match is not a retrievable moment.

use vidseq_core::defaults::{SEQUENCE_GAP_TOLERANCE, SEQUENCE_MIN_FRAMES};
use vidseq_core::{format_timestamp, FrameMatch, Sequence};

/// Group matches into per-video contiguous sequences and rank them by
/// score, descending. Ties keep encounter order (stable sort).
pub fn assemble_sequences(matches: Vec<FrameMatch>) -> Vec<Sequence> {
    let mut sequences = Vec::new();

    for mut partition in partition_by_video(matches) {
        partition.sort_by_key(|m| m.record.frame_number);

        let mut current: Vec<FrameMatch> = Vec::new();
        for m in partition {
            match current.last() {
                Some(last)
                    if m.record.frame_number
                        <= last.record.frame_number + SEQUENCE_GAP_TOLERANCE =>
                {
                    current.push(m);
                }
                Some(_) => {
                    close_sequence(&mut sequences, std::mem::take(&mut current));
                    current.push(m);
                }
                None => current.push(m),
            }
        }
        close_sequence(&mut sequences, current);
    }

    sequences.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    sequences
}

/// Split matches into per-video groups, preserving first-encounter order
/// of videos so the final ranking is deterministic under score ties.
fn partition_by_video(matches: Vec<FrameMatch>) -> Vec<Vec<FrameMatch>> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: Vec<Vec<FrameMatch>> = Vec::new();

    for m in matches {
        match order.iter().position(|v| *v == m.record.video_path) {
            Some(i) => groups[i].push(m),
            None => {
                order.push(m.record.video_path.clone());
                groups.push(vec![m]);
            }
        }
    }
    groups
}

/// Finalize a run of members into a [`Sequence`], dropping it when it has
/// fewer than the minimum member count.
fn close_sequence(out: &mut Vec<Sequence>, members: Vec<FrameMatch>) {
    if members.len() < SEQUENCE_MIN_FRAMES {
        return;
    }

    let first = &members[0];
    let last = &members[members.len() - 1];

    let time_start = first.record.timestamp;
    let time_end = last.record.timestamp;
    let score = members.iter().map(|m| m.score).sum::<f32>() / members.len() as f32;

    out.push(Sequence {
        video_path: first.record.video_path.clone(),
        frame_start: first.record.frame_number,
        frame_end: last.record.frame_number,
        time_start,
        time_end,
        time_start_hms: format_timestamp(time_start),
        time_end_hms: format_timestamp(time_end),
        duration: time_end - time_start,
        score,
        description: first.record.description.clone(),
        frame_paths: members.iter().map(|m| m.record.frame_path.clone()).collect(),
        matches: members,
    });
}
