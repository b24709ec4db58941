//! Module `framing`
//!
//! Reads newline-terminated messages without buffering more than the
//! configured maximum per line.

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Outcome of reading one line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineRead {
    /// Peer closed the connection.
    Eof,
    /// A line is in the buffer, terminator stripped.
    Line,
    /// The line exceeded the limit and was discarded; carries its length.
    TooLong(usize),
}

/// Reads one line of at most `max_length` bytes into `buf`.
///
/// Longer lines are skipped up to their newline in chunks, so the buffer
/// never grows past `max_length + 1` bytes.
pub async fn read_bounded_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_length: usize,
) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();

    let limit = max_length as u64 + 1;
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(LineRead::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        return Ok(LineRead::Line);
    }

    if n <= max_length {
        // Final line without a terminator
        return Ok(LineRead::Line);
    }

    let skipped = skip_past_newline(reader).await?;
    buf.clear();
    Ok(LineRead::TooLong(n + skipped))
}

async fn skip_past_newline<R>(reader: &mut R) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let (consumed, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(skipped);
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (available.len(), false),
            }
        };

        reader.consume(consumed);
        skipped += consumed;
        if done {
            return Ok(skipped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let mut reader = BufReader::new(&b"first\r\nsecond\nlast"[..]);
        let mut buf = Vec::new();

        assert_eq!(read_bounded_line(&mut reader, &mut buf, 64).await.unwrap(), LineRead::Line);
        assert_eq!(buf, b"first");
        assert_eq!(read_bounded_line(&mut reader, &mut buf, 64).await.unwrap(), LineRead::Line);
        assert_eq!(buf, b"second");
        assert_eq!(read_bounded_line(&mut reader, &mut buf, 64).await.unwrap(), LineRead::Line);
        assert_eq!(buf, b"last");
        assert_eq!(read_bounded_line(&mut reader, &mut buf, 64).await.unwrap(), LineRead::Eof);
    }

    #[tokio::test]
    async fn test_line_of_exactly_max_length_is_accepted() {
        let mut reader = BufReader::new(&b"12345678\nnext\n"[..]);
        let mut buf = Vec::new();

        assert_eq!(read_bounded_line(&mut reader, &mut buf, 8).await.unwrap(), LineRead::Line);
        assert_eq!(buf, b"12345678");
    }

    #[tokio::test]
    async fn test_overlong_line_is_skipped_in_bounded_chunks() {
        let mut input = vec![b'x'; 100_000];
        input.extend_from_slice(b"\nnext\n");
        // Small internal buffer so skipping spans many fills
        let mut reader = BufReader::with_capacity(16, &input[..]);
        let mut buf = Vec::new();

        assert_eq!(
            read_bounded_line(&mut reader, &mut buf, 32).await.unwrap(),
            LineRead::TooLong(100_001)
        );
        assert!(buf.capacity() < 1024);
        assert_eq!(read_bounded_line(&mut reader, &mut buf, 32).await.unwrap(), LineRead::Line);
        assert_eq!(buf, b"next");
    }

    #[tokio::test]
    async fn test_overlong_line_without_newline_reaches_eof() {
        let input = vec![b'x'; 500];
        let mut reader = BufReader::new(&input[..]);
        let mut buf = Vec::new();

        assert_eq!(
            read_bounded_line(&mut reader, &mut buf, 10).await.unwrap(),
            LineRead::TooLong(500)
        );
        assert_eq!(read_bounded_line(&mut reader, &mut buf, 10).await.unwrap(), LineRead::Eof);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_returned_as_bytes() {
        let mut reader = BufReader::new(&b"\xff\xfe garbage\n"[..]);
        let mut buf = Vec::new();

        assert_eq!(read_bounded_line(&mut reader, &mut buf, 64).await.unwrap(), LineRead::Line);
        assert!(std::str::from_utf8(&buf).is_err());
    }
}
