use std::io::{self, ErrorKind, Read};

/// Reads interleaved little-endian s16 PCM in fixed-size blocks and converts
/// it to f32.
pub struct PcmReader<R> {
    inner: R,
    channels: usize,
    bytes: Vec<u8>,
    eof: bool,
}

impl<R: Read> PcmReader<R> {
    /// `block_samples` is frames × channels; the byte buffer is allocated once here.
    pub fn new(inner: R, channels: usize, block_samples: usize) -> Self {
        Self {
            inner,
            channels: channels.max(1),
            bytes: vec![0; block_samples * 2],
            eof: false,
        }
    }

    /// Fill up to `out.len()` samples (capped at the block size). Short reads are
    /// retried until the block is full or the stream ends. Returns the number of
    /// samples written, always whole frames; 0 means end-of-stream.
    pub fn read_block(&mut self, out: &mut [f32]) -> io::Result<usize> {
        if self.eof {
            return Ok(0);
        }
        let want = out.len().min(self.bytes.len() / 2) * 2;
        let mut filled = 0;
        while filled < want {
            match self.inner.read(&mut self.bytes[filled..want]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        // Drop a trailing odd byte or partial frame.
        let samples = filled / 2;
        let samples = samples - samples % self.channels;
        for (o, pair) in out.iter_mut().zip(self.bytes[..samples * 2].chunks_exact(2)) {
            *o = s16_to_f32(i16::from_le_bytes([pair[0], pair[1]]));
        }
        Ok(samples)
    }
}

#[inline]
pub fn s16_to_f32(v: i16) -> f32 {
    v as f32 / 32768.0
}
