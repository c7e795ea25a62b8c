//! MJPEG stream splitting.
//!
//! The preview tool writes concatenated JPEG images to stdout. Each frame
//! runs from an SOI marker (`FF D8`) to the next EOI marker (`FF D9`).

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Accumulates stream bytes and yields complete JPEG frames.
#[derive(Debug, Default)]
pub struct MjpegSplitter {
    buf: Vec<u8>,
}

impl MjpegSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the stream
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Take the next complete frame, dropping any garbage before it
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let Some(start) = find(&self.buf, &SOI, 0) else {
            // The last byte may be the first half of a split marker.
            let garbage = self.buf.len().saturating_sub(1);
            self.buf.drain(..garbage);
            return None;
        };
        if start > 0 {
            self.buf.drain(..start);
        }
        let end = find(&self.buf, &EOI, SOI.len())? + EOI.len();
        Some(self.buf.drain(..end).collect())
    }

    /// Bytes waiting for the rest of their frame
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn find(haystack: &[u8], needle: &[u8; 2], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(2)
        .position(|w| w == needle)
        .map(|p| p + from)
}
