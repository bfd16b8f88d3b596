//! Candidate selection.
//!
//! Search results are noisy: live recordings, remixes and fan uploads sit next to
//! the studio version. Picking is a two-pass heuristic over the results in the
//! order the search returned them:
//!
//! 1. the first candidate from an artist channel (an auto-generated
//!    "Artist - Topic" channel, or one named exactly like the main artist)
//!    that passes the keyword filter;
//! 2. failing that, the first candidate that passes the keyword filter.
//!
//! The keyword filter rejects a candidate whose title mentions a blocked
//! keyword that the track itself does not. "Song (Live)" is therefore fine when
//! the recommendation is for "Song (Live)".

use super::traits::Candidate;
use crate::model::Track;

/// Channel suffix YouTube uses for auto-generated artist channels
pub const TOPIC_MARKER: &str = "- Topic";

/// Pick the best acceptable candidate, or `None` when nothing survives the filter.
pub fn select_candidate<'a>(
    track: &Track,
    candidates: &'a [Candidate],
    filter_list: &[String],
) -> Option<&'a Candidate> {
    let acceptable = |c: &&Candidate| passes_filter(track, &c.source_title, filter_list);

    candidates
        .iter()
        .filter(acceptable)
        .find(|c| is_artist_channel(track, &c.source_channel))
        .or_else(|| candidates.iter().find(acceptable))
}

/// Whether a candidate title is free of keywords the track doesn't carry.
pub fn passes_filter(track: &Track, candidate_title: &str, filter_list: &[String]) -> bool {
    filter_list.iter().all(|keyword| {
        contains(&track.title, keyword)
            || contains(&track.artist, keyword)
            || !contains(candidate_title, keyword)
    })
}

fn is_artist_channel(track: &Track, channel: &str) -> bool {
    channel.contains(TOPIC_MARKER) || channel == track.main_artist
}

/// Case-insensitive substring test
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
