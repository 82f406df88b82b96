//! Command encoding and reply decoding.

use crate::error::ProtocolError;

/// Codec for encoding store commands.
#[derive(Debug, Default)]
pub struct Codec {
    /// Reusable buffer for encoding.
    buffer: Vec<u8>,
}

impl Codec {
    /// Creates a new codec.
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Creates a codec with pre-allocated buffer capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encodes one command as a flat array of length-prefixed arguments.
    ///
    /// Returns the complete request frame; the buffer is reused across
    /// calls.
    pub fn encode(&mut self, args: &[&str]) -> &[u8] {
        self.buffer.clear();
        self.buffer
            .extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
        for arg in args {
            self.buffer
                .extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
            self.buffer.extend_from_slice(arg.as_bytes());
            self.buffer.extend_from_slice(b"\r\n");
        }
        &self.buffer
    }
}

/// Encodes one command into a fresh buffer.
#[must_use]
pub fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut codec = Codec::new();
    codec.encode(args);
    codec.buffer
}

/// Outcome of a decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decode<T> {
    /// A complete reply was decoded and consumed from the buffer.
    Ready(T),
    /// More bytes are needed before the reply can be decoded.
    Incomplete,
}

/// Decoder phases for one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for the `*<N>` element-count line of an array reply.
    ExpectCount,
    /// Waiting for a `$<L>` length line.
    ExpectLength,
    /// Waiting for the value line following a length line.
    ExpectValue { declared: usize },
}

/// Push decoder for store replies.
///
/// Raw socket bytes go in through [`feed`](Self::feed); [`try_bulk`] and
/// [`try_array`](Self::try_array) attempt to decode one reply off the
/// front of the buffer. An incomplete frame is not an error: the caller
/// feeds more bytes and retries. A malformed frame is a [`ProtocolError`],
/// never a silent empty result.
///
/// [`try_bulk`]: Self::try_bulk
#[derive(Debug, Default)]
pub struct ReplyDecoder {
    buf: Vec<u8>,
}

impl ReplyDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends raw bytes read from the connection.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Returns the number of buffered, not-yet-decoded bytes.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Attempts to decode one single-value reply.
    ///
    /// `Ready(None)` is a nil reply (`$-1`), returned by the store for
    /// missing keys.
    pub fn try_bulk(&mut self) -> Result<Decode<Option<String>>, ProtocolError> {
        let mut pos = 0;
        match parse_reply(&self.buf, &mut pos, false)? {
            Decode::Ready(mut items) => {
                self.buf.drain(..pos);
                Ok(Decode::Ready(items.pop().flatten()))
            }
            Decode::Incomplete => Ok(Decode::Incomplete),
        }
    }

    /// Attempts to decode one array reply. Nil elements are dropped.
    pub fn try_array(&mut self) -> Result<Decode<Vec<String>>, ProtocolError> {
        let mut pos = 0;
        match parse_reply(&self.buf, &mut pos, true)? {
            Decode::Ready(items) => {
                self.buf.drain(..pos);
                Ok(Decode::Ready(items.into_iter().flatten().collect()))
            }
            Decode::Incomplete => Ok(Decode::Incomplete),
        }
    }
}

/// Runs the decode state machine over `buf` starting at `*pos`.
///
/// With `with_count` the reply must open with a `*<N>` count line; without
/// it exactly one `$<L>`/value pair is decoded. On success `*pos` is left
/// one past the consumed frame.
fn parse_reply(
    buf: &[u8],
    pos: &mut usize,
    with_count: bool,
) -> Result<Decode<Vec<Option<String>>>, ProtocolError> {
    let mut state = if with_count {
        DecodeState::ExpectCount
    } else {
        DecodeState::ExpectLength
    };
    let mut remaining: usize = 1;
    let mut items: Vec<Option<String>> = Vec::new();

    loop {
        if remaining == 0 {
            return Ok(Decode::Ready(items));
        }
        let Some(line) = next_line(buf, pos) else {
            return Ok(Decode::Incomplete);
        };
        state = match state {
            DecodeState::ExpectCount => {
                let count = parse_prefixed_int(line, '*')?;
                remaining = usize::try_from(count).unwrap_or(0);
                DecodeState::ExpectLength
            }
            DecodeState::ExpectLength => {
                let declared = parse_prefixed_int(line, '$')?;
                match usize::try_from(declared) {
                    // negative length: nil value
                    Err(_) => {
                        items.push(None);
                        remaining -= 1;
                        DecodeState::ExpectLength
                    }
                    Ok(declared) => DecodeState::ExpectValue { declared },
                }
            }
            DecodeState::ExpectValue { declared } => {
                items.push(Some(take_value(line, declared)?));
                remaining -= 1;
                DecodeState::ExpectLength
            }
        };
    }
}

/// Returns the next CRLF-terminated line, advancing `*pos` past it.
fn next_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let rest = &buf[*pos..];
    let end = rest.windows(2).position(|sep| sep == b"\r\n")?;
    *pos += end + 2;
    Some(&rest[..end])
}

/// Parses a `<type byte><integer>` line such as `*3` or `$-1`.
fn parse_prefixed_int(line: &[u8], expected: char) -> Result<i64, ProtocolError> {
    let Some((&type_byte, digits)) = line.split_first() else {
        return Err(ProtocolError::InvalidLength("empty reply line".to_owned()));
    };
    if type_byte == b'-' {
        return Err(ProtocolError::ErrorReply(
            String::from_utf8_lossy(digits).into_owned(),
        ));
    }
    if type_byte != expected as u8 {
        return Err(ProtocolError::UnexpectedType {
            expected,
            found: type_byte as char,
        });
    }
    let digits = std::str::from_utf8(digits)?;
    digits
        .parse()
        .map_err(|_| ProtocolError::InvalidLength(digits.to_owned()))
}

/// Extracts the first `declared` bytes of a value line.
fn take_value(line: &[u8], declared: usize) -> Result<String, ProtocolError> {
    if line.len() < declared {
        return Err(ProtocolError::LengthMismatch {
            declared,
            actual: line.len(),
        });
    }
    Ok(std::str::from_utf8(&line[..declared])?.to_owned())
}
