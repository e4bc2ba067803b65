use rand::Rng;
use serde::Serialize;

pub const LANE_COUNT: u8 = 4;

/// One note the player has to hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NoteEvent {
    /// Seconds from the start of the song, millisecond precision
    pub appear_time: f64,
    /// Lane index in `0..LANE_COUNT`
    #[serde(rename = "x")]
    pub lane: u8,
}

/// Pair each note time with a uniformly random lane, keeping order.
pub fn assign_lanes<R: Rng + ?Sized>(times: &[f64], rng: &mut R) -> Vec<NoteEvent> {
    times
        .iter()
        .map(|&appear_time| NoteEvent {
            appear_time,
            lane: rng.gen_range(0..LANE_COUNT),
        })
        .collect()
}
