//! Duration probing for uploaded videos.
//!
//! MP4 and QuickTime files are ISO base media files: a sequence of boxes,
//! each `[u32 size][4-byte type][payload]`. The movie header (`moov/mvhd`)
//! carries a timescale and a duration in that timescale.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MediaError {
    #[error("not an ISO base media file")]
    NotIsoMedia,

    #[error("truncated box at offset {0}")]
    Truncated(usize),

    #[error("movie header not found")]
    MissingHeader,

    #[error("movie header has zero timescale")]
    ZeroTimescale,
}

const BOX_HEADER_LEN: usize = 8;

struct BoxHeader<'a> {
    kind: &'a [u8],
    payload: &'a [u8],
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

fn read_u64(data: &[u8], at: usize) -> Option<u64> {
    let b = data.get(at..at + 8)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    Some(u64::from_be_bytes(buf))
}

/// Split `data` into its sequence of boxes.
fn boxes(data: &[u8]) -> Result<Vec<BoxHeader<'_>>, MediaError> {
    let mut out = Vec::new();
    let mut offset = 0;

    while offset + BOX_HEADER_LEN <= data.len() {
        let size = read_u32(data, offset).ok_or(MediaError::Truncated(offset))? as u64;
        let kind = &data[offset + 4..offset + 8];

        let (header_len, total) = match size {
            // Box extends to the end of the enclosing data
            0 => (BOX_HEADER_LEN, (data.len() - offset) as u64),
            1 => {
                let large = read_u64(data, offset + 8).ok_or(MediaError::Truncated(offset))?;
                (BOX_HEADER_LEN + 8, large)
            }
            n => (BOX_HEADER_LEN, n),
        };

        // Compare against what is left so a huge largesize cannot overflow
        if total < header_len as u64 || total > (data.len() - offset) as u64 {
            return Err(MediaError::Truncated(offset));
        }
        let end = offset + total as usize;
        out.push(BoxHeader {
            kind,
            payload: &data[offset + header_len..end],
        });
        offset = end;
    }

    Ok(out)
}

/// Duration in seconds of an MP4/QuickTime file.
pub fn probe_duration(data: &[u8]) -> Result<f64, MediaError> {
    let top = boxes(data).map_err(|e| match e {
        MediaError::Truncated(0) => MediaError::NotIsoMedia,
        other => other,
    })?;

    if !top.iter().any(|b| b.kind == b"ftyp" || b.kind == b"moov") {
        return Err(MediaError::NotIsoMedia);
    }

    let moov = top
        .iter()
        .find(|b| b.kind == b"moov")
        .ok_or(MediaError::MissingHeader)?;
    let mvhd = boxes(moov.payload)?
        .into_iter()
        .find(|b| b.kind == b"mvhd")
        .ok_or(MediaError::MissingHeader)?;

    let p = mvhd.payload;
    let version = *p.first().ok_or(MediaError::MissingHeader)?;
    let (timescale, duration) = if version == 1 {
        // version/flags, creation u64, modification u64, timescale u32, duration u64
        (read_u32(p, 20), read_u64(p, 24))
    } else {
        // version/flags, creation u32, modification u32, timescale u32, duration u32
        (read_u32(p, 12), read_u32(p, 16).map(u64::from))
    };
    let timescale = timescale.ok_or(MediaError::MissingHeader)?;
    let duration = duration.ok_or(MediaError::MissingHeader)?;

    if timescale == 0 {
        return Err(MediaError::ZeroTimescale);
    }
    Ok(duration as f64 / timescale as f64)
}

/// Build a minimal MP4 (`ftyp` + `moov/mvhd`) with the given duration.
/// Padding bytes are appended as an `mdat` box so size checks can use it.
#[doc(hidden)]
pub fn synthetic_mp4(seconds: u32, padding: usize) -> Vec<u8> {
    fn push_box(out: &mut Vec<u8>, kind: &[u8; 4], payload: &[u8]) {
        out.extend_from_slice(&((payload.len() + BOX_HEADER_LEN) as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
    }

    let timescale: u32 = 1000;
    let mut mvhd = vec![0u8; 4]; // version 0, flags
    mvhd.extend_from_slice(&0u32.to_be_bytes()); // creation
    mvhd.extend_from_slice(&0u32.to_be_bytes()); // modification
    mvhd.extend_from_slice(&timescale.to_be_bytes());
    mvhd.extend_from_slice(&(seconds * timescale).to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 80]);

    let mut moov = Vec::new();
    push_box(&mut moov, b"mvhd", &mvhd);

    let mut out = Vec::new();
    push_box(&mut out, b"ftyp", b"isom\0\0\x02\0isomiso2mp41");
    push_box(&mut out, b"moov", &moov);
    if padding > 0 {
        push_box(&mut out, b"mdat", &vec![0u8; padding]);
    }
    out
}
