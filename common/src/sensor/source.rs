use std::io::{BufRead, ErrorKind, Read};

use super::SensorSource;
use crate::IngestError;

/// Splits any buffered byte stream into sensor lines.
///
/// Bytes received before a read timeout are kept and completed by the next call, so a line
/// that straddles a timeout is not lost or split in two. Lines longer than
/// [`LineSource::MAX_LINE`] are dropped up to and including their newline.
pub struct LineSource<R> {
    reader: R,
    pending: Vec<u8>,
    /// Set after an overlong line until its terminating newline has gone by.
    discarding: bool,
}

impl<R: BufRead> LineSource<R> {
    /// Longest line kept, newline included. Real readings are a few dozen bytes.
    pub const MAX_LINE: usize = 4096;

    pub fn new(reader: R) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            discarding: false,
        }
    }

    fn take_line(&mut self) -> Result<Option<String>, IngestError> {
        let bytes = std::mem::take(&mut self.pending);
        let line = String::from_utf8(bytes)?;
        let line = line.trim();

        Ok((!line.is_empty()).then(|| line.to_string()))
    }
}

impl<R: BufRead> SensorSource for LineSource<R> {
    fn read_line(&mut self) -> Result<Option<String>, IngestError> {
        let budget = (Self::MAX_LINE - self.pending.len()) as u64;
        let read = (&mut self.reader)
            .take(budget)
            .read_until(b'\n', &mut self.pending);

        match read {
            Ok(0) if self.pending.is_empty() => Err(IngestError::Disconnected),
            Ok(_) if self.pending.len() >= Self::MAX_LINE && !self.pending.ends_with(b"\n") => {
                self.pending.clear();
                self.discarding = true;
                Err(IngestError::LineTooLong(Self::MAX_LINE))
            }
            // The rest of an overlong line.
            Ok(_) if self.discarding => {
                self.pending.clear();
                self.discarding = false;
                Ok(None)
            }
            // Either a full line, or end of stream with a partial one buffered.
            Ok(_) => self.take_line(),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, BufReader, Cursor};

    #[test]
    fn yields_trimmed_lines_then_disconnects() {
        let mut source = LineSource::new(Cursor::new("25.0,60.0,40.0\r\n\n  \n26,61,41"));

        assert_eq!(source.read_line().unwrap().as_deref(), Some("25.0,60.0,40.0"));
        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.read_line().unwrap().as_deref(), Some("26,61,41"));
        assert!(matches!(source.read_line(), Err(IngestError::Disconnected)));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let mut source = LineSource::new(Cursor::new(vec![0xff, 0xfe, b'\n', b'1', b'\n']));

        assert!(matches!(source.read_line(), Err(IngestError::Decode(_))));
        assert_eq!(source.read_line().unwrap().as_deref(), Some("1"));
    }

    /// Replays chunks, timing out between them the way a serial port does.
    struct Chunked(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(Ok(chunk)) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    #[test]
    fn partial_line_survives_timeout() {
        let chunks = VecDeque::from(vec![
            Ok(b"25.0,6".to_vec()),
            Err(io::Error::new(ErrorKind::TimedOut, "timed out")),
            Ok(b"0.0,40.0\n".to_vec()),
        ]);
        let mut source = LineSource::new(BufReader::new(Chunked(chunks)));

        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.read_line().unwrap().as_deref(), Some("25.0,60.0,40.0"));
    }

    /// A device that never stops sending and never sends a newline.
    struct Babbling;

    impl Read for Babbling {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            buf.fill(b'x');
            Ok(buf.len())
        }
    }

    #[test]
    fn endless_line_returns_with_bounded_buffer() {
        let mut source = LineSource::new(BufReader::new(Babbling));

        for _ in 0..3 {
            assert!(matches!(
                source.read_line(),
                Err(IngestError::LineTooLong(LineSource::<BufReader<Babbling>>::MAX_LINE))
            ));
            assert!(source.pending.is_empty());
        }
    }

    #[test]
    fn overlong_line_is_dropped_through_its_newline() {
        let mut chunks: VecDeque<io::Result<Vec<u8>>> =
            (0..5).map(|_| Ok(vec![b'7'; 1024])).collect();
        chunks.push_back(Ok(b"1,2,3\n".to_vec()));
        chunks.push_back(Ok(b"25.0,60.0,40.0\n".to_vec()));
        let mut source = LineSource::new(BufReader::new(Chunked(chunks)));

        assert!(matches!(source.read_line(), Err(IngestError::LineTooLong(_))));
        assert_eq!(source.read_line().unwrap(), None);
        assert_eq!(source.read_line().unwrap().as_deref(), Some("25.0,60.0,40.0"));
    }

    #[test]
    fn other_io_errors_surface() {
        let chunks = VecDeque::from(vec![Err(io::Error::new(
            ErrorKind::BrokenPipe,
            "device unplugged",
        ))]);
        let mut source = LineSource::new(BufReader::new(Chunked(chunks)));

        assert!(matches!(source.read_line(), Err(IngestError::Io(_))));
    }
}
