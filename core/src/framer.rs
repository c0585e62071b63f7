//! Line framing for session input buffers
//!
//! A line ends at the next LF byte; one CR directly before the LF is dropped.
//! Bytes after the last LF stay buffered until more input arrives. The buffer
//! is bounded so a peer that never sends a terminator cannot grow it forever.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::error::{Error, FrameError};

/// Splits a byte buffer into protocol lines
#[derive(Debug, Clone, Copy)]
pub struct LineCodec {
    /// Largest number of unterminated bytes tolerated in the buffer
    max_buffered: usize,
}

impl LineCodec {
    pub fn new(max_buffered: usize) -> Self {
        Self { max_buffered }
    }

    /// Extract every complete line currently in `buf`.
    ///
    /// Lines found before an overflow is detected are returned alongside it so
    /// they can still be processed before the session is dropped.
    pub fn drain_lines(&mut self, buf: &mut BytesMut) -> (Vec<String>, Option<Error>) {
        let mut lines = Vec::new();
        loop {
            match self.decode(buf) {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => return (lines, None),
                Err(e) => return (lines, Some(e)),
            }
        }
    }

    fn next_line(&self, src: &mut BytesMut) -> Result<Option<String>, FrameError> {
        let too_long = FrameError::LineTooLong {
            limit: self.max_buffered,
        };
        match src.iter().position(|b| *b == b'\n') {
            Some(pos) if pos > self.max_buffered => Err(too_long),
            Some(pos) => {
                let mut line = src.split_to(pos + 1);
                line.truncate(pos);
                if line.last() == Some(&b'\r') {
                    line.truncate(pos - 1);
                }
                Ok(Some(String::from_utf8_lossy(&line).into_owned()))
            }
            None if src.len() > self.max_buffered => Err(too_long),
            None => Ok(None),
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.next_line(src)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crlf_and_bare_lf() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from("NICK alice\r\nUSER a 0 0 :Alice\n");
        let (lines, err) = codec.drain_lines(&mut buf);
        assert_eq!(lines, vec!["NICK alice", "USER a 0 0 :Alice"]);
        assert!(err.is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_partial_line_stays_buffered() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from("JOIN #te");
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"JOIN #te");

        buf.extend_from_slice(b"st\r\nPRIV");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("JOIN #test"));
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(&buf[..], b"PRIV");
    }

    #[test]
    fn test_only_one_cr_is_stripped() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from("PING x\r\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING x\r"));
    }

    #[test]
    fn test_empty_lines_are_produced() {
        let mut codec = LineCodec::new(512);
        let mut buf = BytesMut::from("\r\n\n");
        let (lines, _) = codec.drain_lines(&mut buf);
        assert_eq!(lines, vec!["", ""]);
    }

    #[test]
    fn test_overflow_without_terminator() {
        let mut codec = LineCodec::new(16);
        let mut buf = BytesMut::from("PING a\nxxxxxxxxxxxxxxxxxxxxxxxx");
        let (lines, err) = codec.drain_lines(&mut buf);
        assert_eq!(lines, vec!["PING a"]);
        assert!(matches!(
            err,
            Some(Error::Framing(FrameError::LineTooLong { limit: 16 }))
        ));
    }

    #[test]
    fn test_overlong_terminated_line_is_refused() {
        let mut codec = LineCodec::new(16);
        let mut buf = BytesMut::from("PING a\nPRIVMSG #test :xxxxxxxxxxxxxxxx\r\n");
        let (lines, err) = codec.drain_lines(&mut buf);
        assert_eq!(lines, vec!["PING a"]);
        assert!(matches!(err, Some(Error::Framing(_))));

        let mut buf = BytesMut::from("PRIVMSG #t :sixteen\n");
        assert_eq!(buf.len(), 20);
        let mut exact = LineCodec::new(19);
        assert!(exact.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut codec = LineCodec::new(64);
        let mut buf = BytesMut::from(&b"PRIVMSG bob :\xff\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("PRIVMSG bob :"));
    }
}
