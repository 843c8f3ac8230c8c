use crate::buffer::Segment;

/// Truncate every segment to the length of the shortest one.
pub fn equalize(mut segments: Vec<Segment<'_>>) -> Vec<Segment<'_>> {
    if let Some(min_frames) = segments.iter().map(Segment::frames).min() {
        for segment in &mut segments {
            segment.truncate(min_frames);
        }
    }
    segments
}
