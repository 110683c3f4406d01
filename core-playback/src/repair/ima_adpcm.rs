//! IMA/DVI ADPCM block decoding (`wFormatTag` 0x0011, 4 bits per sample).
//!
//! Each block starts with one 4-byte preamble per channel (initial predictor
//! as `i16`, step index, reserved byte). The predictor is the block's first
//! sample. Nibbles follow in 4-byte groups that rotate through the channels,
//! low nibble first.

const INDEX_TABLE: [i8; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
    449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
    9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

const MAX_STEP_INDEX: i32 = STEP_TABLE.len() as i32 - 1;
const PREAMBLE_BYTES: usize = 4;
const GROUP_BYTES: usize = 4;

/// Whether `block_align` describes whole blocks for `channels`.
pub(super) fn is_valid_block(block_align: usize, channels: usize) -> bool {
    let preamble = PREAMBLE_BYTES * channels;
    block_align >= preamble && (block_align - preamble) % (GROUP_BYTES * channels) == 0
}

#[derive(Debug, Clone, Copy)]
struct ChannelState {
    predictor: i32,
    step_index: i32,
}

impl ChannelState {
    fn from_preamble(preamble: &[u8]) -> Self {
        Self {
            predictor: i32::from(i16::from_le_bytes([preamble[0], preamble[1]])),
            step_index: i32::from(preamble[2]).min(MAX_STEP_INDEX),
        }
    }

    fn next(&mut self, nibble: u8) -> i16 {
        let step = STEP_TABLE[self.step_index as usize];
        let mut diff = step >> 3;
        if nibble & 4 != 0 {
            diff += step;
        }
        if nibble & 2 != 0 {
            diff += step >> 1;
        }
        if nibble & 1 != 0 {
            diff += step >> 2;
        }
        if nibble & 8 != 0 {
            self.predictor -= diff;
        } else {
            self.predictor += diff;
        }
        self.predictor = self.predictor.clamp(i32::from(i16::MIN), i32::from(i16::MAX));
        self.step_index =
            (self.step_index + i32::from(INDEX_TABLE[nibble as usize])).clamp(0, MAX_STEP_INDEX);
        self.predictor as i16
    }
}

/// Decode whole blocks into interleaved 16-bit samples.
///
/// `data.len()` must be a multiple of `block_align`, and `block_align` must
/// pass [`is_valid_block`].
pub(super) fn decode(data: &[u8], channels: usize, block_align: usize) -> Vec<i16> {
    let samples_per_block = 1 + (block_align - PREAMBLE_BYTES * channels) * 2 / channels;
    let mut out = Vec::with_capacity(data.len() / block_align * samples_per_block * channels);
    let mut planes: Vec<Vec<i16>> = vec![Vec::with_capacity(samples_per_block); channels];

    for block in data.chunks_exact(block_align) {
        let (preambles, body) = block.split_at(PREAMBLE_BYTES * channels);
        let mut states: Vec<ChannelState> = preambles
            .chunks_exact(PREAMBLE_BYTES)
            .map(ChannelState::from_preamble)
            .collect();

        for (plane, state) in planes.iter_mut().zip(&states) {
            plane.clear();
            plane.push(state.predictor as i16);
        }

        for (i, group) in body.chunks_exact(GROUP_BYTES).enumerate() {
            let channel = i % channels;
            let state = &mut states[channel];
            for &byte in group {
                planes[channel].push(state.next(byte & 0x0F));
                planes[channel].push(state.next(byte >> 4));
            }
        }

        for frame in 0..samples_per_block {
            out.extend(planes.iter().map(|plane| plane[frame]));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_validation() {
        assert!(is_valid_block(8, 1));
        assert!(is_valid_block(256, 1));
        assert!(is_valid_block(16, 2));
        assert!(!is_valid_block(0, 1));
        assert!(!is_valid_block(6, 1));
        assert!(!is_valid_block(12, 2));
    }

    #[test]
    fn test_mono_block_climbs_from_silence() {
        let block = [0, 0, 0, 0, 0x77, 0x77, 0x77, 0x77];
        assert_eq!(
            decode(&block, 1, 8),
            vec![0, 11, 41, 104, 240, 533, 1164, 2521, 5431]
        );
    }

    #[test]
    fn test_mono_block_follows_preamble() {
        // predictor 1000, step index 10
        let block = [0xE8, 0x03, 10, 0, 0x08, 0x80, 0xF0, 0x0F];
        assert_eq!(
            decode(&block, 1, 8),
            vec![1000, 998, 1000, 1002, 1001, 1002, 980, 934, 940]
        );
    }

    #[test]
    fn test_stereo_groups_are_interleaved() {
        let block = [
            0x10, 0, 0, 0, // left: 16
            0xF0, 0xFF, 0, 0, // right: -16
            0x44, 0x44, 0x44, 0x44, // left group
            0xCC, 0xCC, 0xCC, 0xCC, // right group
        ];
        assert_eq!(
            decode(&block, 2, 16),
            vec![
                16, -16, 23, -23, 33, -33, 45, -45, 59, -59, 77, -77, 98, -98, 123, -123, 154,
                -154
            ]
        );
    }

    #[test]
    fn test_predictor_saturates_and_index_is_clamped() {
        let block = [0xFF, 0x7F, 200, 0, 0x77, 0, 0, 0];
        assert_eq!(decode(&block, 1, 8), vec![i16::MAX; 9]);
    }

    #[test]
    fn test_each_block_restarts_from_its_preamble() {
        let mut data = vec![0, 0, 0, 0, 0x77, 0x77, 0x77, 0x77];
        data.extend_from_slice(&[0xE8, 0x03, 10, 0, 0x08, 0x80, 0xF0, 0x0F]);
        let samples = decode(&data, 1, 8);
        assert_eq!(samples.len(), 18);
        assert_eq!(samples[8], 5431);
        assert_eq!(samples[9], 1000);
    }
}
