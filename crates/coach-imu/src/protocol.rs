use crate::types::RawImuSample;
use glam::{Quat, Vec3};
use std::collections::VecDeque;
use thiserror::Error;

/// Frame start marker for the phone sensor stream.
const HEADER: [u8; 2] = [0x5A, 0xA5];

/// Frame carrying a fused attitude quaternion plus linear acceleration.
const FRAME_ATTITUDE: u8 = 0x01;
/// Frame carrying raw gyro + accel (phone-side fusion disabled).
const FRAME_RAW: u8 = 0x02;

/// Payload sizes: attitude = 7 x f32, raw = 6 x f32.
const ATTITUDE_PAYLOAD_LEN: usize = 28;
const RAW_PAYLOAD_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown frame type 0x{0:02x}")]
    UnknownFrameType(u8),
    #[error("Checksum mismatch (expected 0x{expected:02x}, got 0x{actual:02x})")]
    BadChecksum { expected: u8, actual: u8 },
}

/// One decoded frame from the sensor stream.
#[derive(Debug, Clone, Copy)]
pub enum StreamFrame {
    /// Phone did the sensor fusion; attitude arrives ready to use.
    Attitude { attitude: Quat, accel: Vec3 },
    /// Raw inertial data; host runs the fusion filter.
    Raw(RawImuSample),
}

/// Streaming parser for the phone sensor protocol.
///
/// Wire format per frame, little-endian:
/// `HEADER(2) | type(1) | payload(24 or 28) | xor-checksum(1)`
/// where the checksum covers the type byte and the payload.
///
/// Feed raw TCP bytes via `push_data`, then drain frames via `next_frame`.
/// The parser resynchronizes on the header after corrupt frames.
pub struct FrameParser {
    buffer: VecDeque<u8>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(4096),
        }
    }

    /// Append received bytes to the internal buffer.
    pub fn push_data(&mut self, data: &[u8]) {
        self.buffer.extend(data);
    }

    /// Try to extract the next complete frame from the buffer.
    /// Returns `None` if no complete frame is available yet.
    pub fn next_frame(&mut self) -> Option<Result<StreamFrame, ProtocolError>> {
        let (outcome, consumed) = {
            let buf = self.buffer.make_contiguous();
            let header_pos = find_pattern(buf, &HEADER)?;
            let frame = &buf[header_pos..];

            if frame.len() < HEADER.len() + 1 {
                // Drop leading garbage so the next call starts at the header.
                (None, header_pos)
            } else {
                let frame_type = frame[HEADER.len()];
                match payload_len(frame_type) {
                    // Skip this header and rescan; the real frame may start
                    // inside what looked like one.
                    None => (
                        Some(Err(ProtocolError::UnknownFrameType(frame_type))),
                        header_pos + HEADER.len(),
                    ),
                    Some(payload_len) => {
                        let total = HEADER.len() + 1 + payload_len + 1;
                        if frame.len() < total {
                            (None, header_pos)
                        } else {
                            let payload =
                                &frame[HEADER.len() + 1..HEADER.len() + 1 + payload_len];
                            let expected = xor_checksum(frame_type, payload);
                            let actual = frame[total - 1];

                            if expected != actual {
                                (
                                    Some(Err(ProtocolError::BadChecksum { expected, actual })),
                                    header_pos + HEADER.len(),
                                )
                            } else {
                                (
                                    Some(Ok(decode_payload(frame_type, payload))),
                                    header_pos + total,
                                )
                            }
                        }
                    }
                }
            }
        };

        self.buffer.drain(..consumed);
        outcome
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

fn payload_len(frame_type: u8) -> Option<usize> {
    match frame_type {
        FRAME_ATTITUDE => Some(ATTITUDE_PAYLOAD_LEN),
        FRAME_RAW => Some(RAW_PAYLOAD_LEN),
        _ => None,
    }
}

fn decode_payload(frame_type: u8, payload: &[u8]) -> StreamFrame {
    let f = |offset: usize| -> f32 {
        let bytes: [u8; 4] = payload[offset..offset + 4].try_into().unwrap();
        f32::from_le_bytes(bytes)
    };

    match frame_type {
        FRAME_ATTITUDE => StreamFrame::Attitude {
            attitude: Quat::from_xyzw(f(0), f(4), f(8), f(12)),
            accel: Vec3::new(f(16), f(20), f(24)),
        },
        FRAME_RAW => StreamFrame::Raw(RawImuSample {
            gyro: Vec3::new(f(0), f(4), f(8)),
            accel: Vec3::new(f(12), f(16), f(20)),
        }),
        // Callers only pass validated frame types.
        _ => unreachable!("decode_payload called with unknown frame type"),
    }
}

fn xor_checksum(frame_type: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(frame_type, |acc, b| acc ^ b)
}

fn find_pattern(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a synthetic attitude frame for testing.
    fn make_attitude_frame(q: [f32; 4], a: [f32; 3]) -> Vec<u8> {
        let mut payload = Vec::new();
        for v in q.iter().chain(a.iter()) {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        frame_bytes(FRAME_ATTITUDE, &payload)
    }

    fn make_raw_frame(g: [f32; 3], a: [f32; 3]) -> Vec<u8> {
        let mut payload = Vec::new();
        for v in g.iter().chain(a.iter()) {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        frame_bytes(FRAME_RAW, &payload)
    }

    fn frame_bytes(frame_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&HEADER);
        frame.push(frame_type);
        frame.extend_from_slice(payload);
        frame.push(xor_checksum(frame_type, payload));
        frame
    }

    #[test]
    fn parse_single_attitude_frame() {
        let frame = make_attitude_frame([0.0, 0.0, 0.0, 1.0], [0.1, -0.2, 9.8]);
        let mut parser = FrameParser::new();
        parser.push_data(&frame);

        match parser.next_frame().unwrap().unwrap() {
            StreamFrame::Attitude { attitude, accel } => {
                assert!((attitude.w - 1.0).abs() < 1e-6);
                assert!((accel.z - 9.8).abs() < 1e-6);
            }
            other => panic!("expected attitude frame, got {other:?}"),
        }

        // No more frames.
        assert!(parser.next_frame().is_none());
    }

    #[test]
    fn parse_raw_frame() {
        let frame = make_raw_frame([0.5, -0.5, 0.1], [0.0, 0.0, 9.81]);
        let mut parser = FrameParser::new();
        parser.push_data(&frame);

        match parser.next_frame().unwrap().unwrap() {
            StreamFrame::Raw(sample) => {
                assert!((sample.gyro.x - 0.5).abs() < 1e-6);
                assert!((sample.accel.z - 9.81).abs() < 1e-6);
            }
            other => panic!("expected raw frame, got {other:?}"),
        }
    }

    #[test]
    fn parse_fragmented_data() {
        let frame = make_attitude_frame([0.0, 0.7071, 0.0, 0.7071], [0.0; 3]);
        let mid = frame.len() / 2;

        let mut parser = FrameParser::new();

        // Feed first half — no complete frame yet.
        parser.push_data(&frame[..mid]);
        assert!(parser.next_frame().is_none());

        // Feed second half — now we can parse.
        parser.push_data(&frame[mid..]);
        assert!(parser.next_frame().unwrap().is_ok());
    }

    #[test]
    fn skips_leading_garbage() {
        let mut data = vec![0x00, 0xFF, 0x5A, 0x00]; // junk, incl. a lone header byte
        data.extend_from_slice(&make_raw_frame([1.0, 2.0, 3.0], [0.0; 3]));

        let mut parser = FrameParser::new();
        parser.push_data(&data);
        assert!(parser.next_frame().unwrap().is_ok());
    }

    #[test]
    fn bad_checksum_then_resync() {
        let mut bad = make_raw_frame([1.0, 0.0, 0.0], [0.0; 3]);
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let good = make_attitude_frame([0.0, 0.0, 0.0, 1.0], [0.0; 3]);

        let mut parser = FrameParser::new();
        parser.push_data(&bad);
        parser.push_data(&good);

        assert!(matches!(
            parser.next_frame().unwrap(),
            Err(ProtocolError::BadChecksum { .. })
        ));
        // Parser recovers on the next valid frame.
        assert!(parser.next_frame().unwrap().is_ok());
    }

    #[test]
    fn unknown_frame_type_is_reported() {
        let mut parser = FrameParser::new();
        parser.push_data(&[0x5A, 0xA5, 0x7F]);
        assert!(matches!(
            parser.next_frame().unwrap(),
            Err(ProtocolError::UnknownFrameType(0x7F))
        ));
    }

    #[test]
    fn parses_back_to_back_frames() {
        let mut data = make_raw_frame([1.0, 0.0, 0.0], [0.0; 3]);
        data.extend_from_slice(&make_raw_frame([2.0, 0.0, 0.0], [0.0; 3]));

        let mut parser = FrameParser::new();
        parser.push_data(&data);

        for expected in [1.0_f32, 2.0] {
            match parser.next_frame().unwrap().unwrap() {
                StreamFrame::Raw(s) => assert!((s.gyro.x - expected).abs() < 1e-6),
                other => panic!("expected raw frame, got {other:?}"),
            }
        }
        assert!(parser.next_frame().is_none());
    }
}
