//! Best format selection
//!
//! Ranking, applied the same way everywhere:
//! 1. keep formats with a non-empty media URL, and when a muxed stream is
//!    required, with both a video and an audio codec;
//! 2. order by height, highest first (unknown height ranks lowest);
//! 3. break ties by file size, largest first;
//! 4. remaining ties keep the order yt-dlp reported.

use crate::extractor::models::MediaFormat;
use crate::utils::error::{Result, SocialSaveError};
use std::cmp::{Ordering, Reverse};

/// What a candidate format has to carry to be eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatRequirement {
    /// Video and audio in one stream, playable without merging
    Muxed,
    /// Any format with a usable URL
    Any,
}

impl FormatRequirement {
    fn accepts(&self, format: &MediaFormat) -> bool {
        if format.url.trim().is_empty() {
            return false;
        }
        match self {
            FormatRequirement::Muxed => format.is_muxed(),
            FormatRequirement::Any => true,
        }
    }
}

/// Pick the best format, or fail with `NoDownloadableFormat`.
pub fn select_best_format(
    formats: &[MediaFormat],
    requirement: FormatRequirement,
) -> Result<&MediaFormat> {
    formats
        .iter()
        .enumerate()
        .filter(|(_, f)| requirement.accepts(f))
        .max_by(|(ia, a), (ib, b)| rank(a, b).then_with(|| Reverse(*ia).cmp(&Reverse(*ib))))
        .map(|(_, f)| f)
        .ok_or(SocialSaveError::NoDownloadableFormat)
}

fn rank(a: &MediaFormat, b: &MediaFormat) -> Ordering {
    a.height
        .unwrap_or(0)
        .cmp(&b.height.unwrap_or(0))
        .then_with(|| a.filesize.unwrap_or(0).cmp(&b.filesize.unwrap_or(0)))
}
