//! Writer of small SPK kernels with bodies in uniform straight-line motion.
use camino::Utf8Path;

const RECORD_BYTES: usize = 1024;
const WORDS_PER_RECORD: usize = RECORD_BYTES / 8;

/// Coverage of every written segment, TDB seconds past J2000 (1968 to 2063).
pub const START_ET: f64 = -1.0e9;
pub const END_ET: f64 = 2.0e9;
/// Two Chebyshev records per segment.
pub const INTERVAL: f64 = 1.5e9;

/// `target` relative to `center` at `position + velocity·et`, km and km/s.
#[derive(Debug, Clone, Copy)]
pub struct LinearSegment {
    pub target: i32,
    pub center: i32,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl LinearSegment {
    pub fn fixed(target: i32, center: i32, position: [f64; 3]) -> Self {
        LinearSegment {
            target,
            center,
            position,
            velocity: [0.0; 3],
        }
    }
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let len = bytes.len().div_ceil(RECORD_BYTES).max(1) * RECORD_BYTES;
    bytes.resize(len, fill);
}

/// Type 2 kernel bytes: file record, one summary record, one name record, then the data.
pub fn kernel_bytes(segments: &[LinearSegment]) -> Vec<u8> {
    assert!(segments.len() <= 25, "one summary record holds 25 SPK summaries");
    let n_records = ((END_ET - START_ET) / INTERVAL).ceil() as usize;
    let ncoeff = 3;
    let rsize = 2 + 3 * ncoeff;

    let mut data = Vec::<f64>::new();
    let mut summaries = Vec::<u8>::new();
    let mut address = 3 * WORDS_PER_RECORD + 1;
    for segment in segments {
        let initial = address;
        for i in 0..n_records {
            let radius = INTERVAL / 2.0;
            let mid = START_ET + (i as f64 + 0.5) * INTERVAL;
            data.extend([mid, radius]);
            for axis in 0..3 {
                let (p, v) = (segment.position[axis], segment.velocity[axis]);
                data.extend([p + v * mid, v * radius, 0.0]);
            }
        }
        data.extend([START_ET, INTERVAL, rsize as f64, n_records as f64]);
        let last = initial + n_records * rsize + 4 - 1;
        address = last + 1;

        summaries.extend(START_ET.to_le_bytes());
        summaries.extend(END_ET.to_le_bytes());
        for word in [segment.target, segment.center, 1, 2, initial as i32, last as i32] {
            summaries.extend(word.to_le_bytes());
        }
    }

    let mut file = Vec::with_capacity(3 * RECORD_BYTES + data.len() * 8);
    file.extend(b"DAF/SPK ");
    file.extend(2i32.to_le_bytes());
    file.extend(6i32.to_le_bytes());
    let mut name = b"SKYALMANAC TEST KERNEL".to_vec();
    name.resize(60, b' ');
    file.extend(name);
    file.extend(2i32.to_le_bytes());
    file.extend(2i32.to_le_bytes());
    file.extend((address as i32).to_le_bytes());
    file.extend(b"LTL-IEEE");
    pad(&mut file, 0);

    let mut summary_record = Vec::with_capacity(RECORD_BYTES);
    for word in [0.0, 0.0, segments.len() as f64] {
        summary_record.extend(f64::to_le_bytes(word));
    }
    summary_record.extend(summaries);
    pad(&mut summary_record, 0);
    file.extend(summary_record);

    file.extend([b' '; RECORD_BYTES]);
    file.extend(data.iter().flat_map(|w| w.to_le_bytes()));
    file
}

pub fn write_kernel(path: &Utf8Path, segments: &[LinearSegment]) {
    std::fs::write(path, kernel_bytes(segments)).unwrap();
}
