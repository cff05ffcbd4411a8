// https://redis.io/docs/reference/protocol-spec

use std::fmt;
use std::io::Cursor;
use std::string::FromUtf8Error;

use bytes::{Buf, Bytes};
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("unsupported frame data type: {0:?}")]
    UnsupportedDataType(char),
    #[error("invalid frame length: {0}")]
    InvalidLength(String),
    #[error("invalid frame number: {0}")]
    InvalidNumber(String),
    #[error("frame is missing its CRLF terminator")]
    MissingTerminator,
    #[error("frame of {size} bytes exceeds the {limit} bytes limit")]
    TooLarge { size: usize, limit: usize },
    /// Invalid message encoding.
    #[error("{0}")]
    Other(crate::Error),
}

/// The negotiated RESP version of a client. Replies are built protocol neutral and adapted with
/// [`Frame::for_protocol`] right before they are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Resp2,
    Resp3,
}

impl TryFrom<i64> for Protocol {
    type Error = i64;

    fn try_from(version: i64) -> Result<Self, Self::Error> {
        match version {
            2 => Ok(Protocol::Resp2),
            3 => Ok(Protocol::Resp3),
            version => Err(version),
        }
    }
}

impl From<Protocol> for i64 {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::Resp2 => 2,
            Protocol::Resp3 => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Double(f64),
    Bulk(Bytes),
    NullBulkString,
    Array(Vec<Frame>),
    NullArray,
    /// RESP3 null.
    Null,
    /// RESP3 map, kept as ordered pairs.
    Map(Vec<(Frame, Frame)>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    /// Decodes a single frame from the head of `src`.
    ///
    /// Returns `Ok(None)` when `src` holds an incomplete frame, in which case nothing should be
    /// consumed. On success the number of bytes the frame occupied is returned alongside it, so
    /// pipelined frames can be decoded one after the other.
    pub fn decode(src: &[u8]) -> Result<Option<(Frame, usize)>, Error> {
        let mut cursor = Cursor::new(src);

        match Frame::parse(&mut cursor) {
            Ok(frame) => Ok(Some((frame, cursor.position() as usize))),
            Err(Error::Incomplete) => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let line = get_line(src)?.to_vec();
                Ok(Frame::Simple(String::from_utf8(line)?))
            }
            DataType::SimpleError => {
                let line = get_line(src)?.to_vec();
                Ok(Frame::Error(String::from_utf8(line)?))
            }
            DataType::Integer => {
                let line = get_line(src)?;
                Ok(Frame::Integer(parse_number(line)?))
            }
            DataType::Double => {
                let line = get_line(src)?;
                Ok(Frame::Double(parse_number(line)?))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                None => Ok(Frame::NullBulkString),
                Some(length) => Ok(Frame::Bulk(get_bulk(src, length)?)),
            },
            // !<length>\r\n<error>\r\n
            DataType::BulkError => match get_length(src)? {
                // The protocol does not define a null bulk error.
                None => Ok(Frame::NullBulkString),
                Some(length) => {
                    let msg = get_bulk(src, length)?.to_vec();
                    Ok(Frame::Error(String::from_utf8(msg)?))
                }
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => match get_length(src)? {
                None => Ok(Frame::NullArray),
                Some(length) => {
                    let mut frames = Vec::with_capacity(length.min(src.remaining()));
                    for _ in 0..length {
                        frames.push(Self::parse(src)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            // %<number-of-entries>\r\n<key-1><value-1>...<key-n><value-n>
            DataType::Map => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => {
                    let mut pairs = Vec::with_capacity(length.min(src.remaining()));
                    for _ in 0..length {
                        let key = Self::parse(src)?;
                        let value = Self::parse(src)?;
                        pairs.push((key, value));
                    }
                    Ok(Frame::Map(pairs))
                }
            },
            DataType::Null => {
                if !get_line(src)?.is_empty() {
                    return Err(Error::MissingTerminator);
                }
                Ok(Frame::Null)
            }
            data_type => Err(Error::UnsupportedDataType(u8::from(data_type) as char)),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut dst = Vec::new();
        self.write_to(&mut dst);
        dst
    }

    fn write_to(&self, dst: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => write_line(dst, DataType::SimpleString, s.as_bytes()),
            Frame::Error(s) => write_line(dst, DataType::SimpleError, s.as_bytes()),
            Frame::Integer(i) => write_line(dst, DataType::Integer, i.to_string().as_bytes()),
            Frame::Double(d) => write_line(dst, DataType::Double, format_double(*d).as_bytes()),
            Frame::Bulk(bytes) => {
                write_line(dst, DataType::BulkString, bytes.len().to_string().as_bytes());
                dst.extend_from_slice(bytes);
                dst.extend_from_slice(CRLF);
            }
            Frame::NullBulkString => write_line(dst, DataType::BulkString, b"-1"),
            Frame::Array(frames) => {
                write_line(dst, DataType::Array, frames.len().to_string().as_bytes());
                for frame in frames {
                    frame.write_to(dst);
                }
            }
            Frame::NullArray => write_line(dst, DataType::Array, b"-1"),
            Frame::Null => write_line(dst, DataType::Null, b""),
            Frame::Map(pairs) => {
                write_line(dst, DataType::Map, pairs.len().to_string().as_bytes());
                for (key, value) in pairs {
                    key.write_to(dst);
                    value.write_to(dst);
                }
            }
        }
    }

    /// Rewrites the frame into the shapes the given protocol version understands.
    ///
    /// RESP2 has no doubles, maps or a dedicated null, so those become bulk strings, flat arrays
    /// and the null bulk string. RESP3 collapses both RESP2 nil variants into its null.
    pub fn for_protocol(self, protocol: Protocol) -> Frame {
        match (self, protocol) {
            (Frame::Array(frames), protocol) => Frame::Array(
                frames
                    .into_iter()
                    .map(|frame| frame.for_protocol(protocol))
                    .collect(),
            ),
            (Frame::Double(d), Protocol::Resp2) => Frame::Bulk(Bytes::from(format_double(d))),
            (Frame::Null, Protocol::Resp2) => Frame::NullBulkString,
            (Frame::Map(pairs), Protocol::Resp2) => Frame::Array(
                pairs
                    .into_iter()
                    .flat_map(|(key, value)| [key, value])
                    .map(|frame| frame.for_protocol(Protocol::Resp2))
                    .collect(),
            ),
            (Frame::Map(pairs), Protocol::Resp3) => Frame::Map(
                pairs
                    .into_iter()
                    .map(|(key, value)| {
                        (
                            key.for_protocol(Protocol::Resp3),
                            value.for_protocol(Protocol::Resp3),
                        )
                    })
                    .collect(),
            ),
            (Frame::NullBulkString | Frame::NullArray, Protocol::Resp3) => Frame::Null,
            (frame, _) => frame,
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Double(d) => write!(f, ",{}", format_double(*d)),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::NullBulkString => write!(f, "$-1"),
            Frame::NullArray => write!(f, "*-1"),
            Frame::Null => write!(f, "_"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
            Frame::Map(pairs) => {
                write!(f, "%{}", pairs.len())?;
                for (key, value) in pairs {
                    write!(f, " {} {}", key, value)?;
                }
                Ok(())
            }
        }
    }
}

/// Canonical text of a double, shared by the RESP3 double and its RESP2 bulk string fallback.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        "nan".to_string()
    } else if d == f64::INFINITY {
        "inf".to_string()
    } else if d == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        d.to_string()
    }
}

fn write_line(dst: &mut Vec<u8>, data_type: DataType, line: &[u8]) {
    dst.push(u8::from(data_type));
    dst.extend_from_slice(line);
    dst.extend_from_slice(CRLF);
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

/// Reads a length prefix. `None` is the `-1` nil marker.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    let line = get_line(src)?;
    let length: i64 = std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::InvalidLength(String::from_utf8_lossy(line).into_owned()))?;

    match length {
        -1 => Ok(None),
        length if length < 0 => Err(Error::InvalidLength(length.to_string())),
        length => Ok(Some(length as usize)),
    }
}

// Bulk payloads are binary safe, so they are read by length instead of by searching for CRLF.
fn get_bulk(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    if src.remaining() < length + CRLF.len() {
        return Err(Error::Incomplete);
    }

    let start = src.position() as usize;
    let buf = src.get_ref();
    if &buf[start + length..start + length + CRLF.len()] != CRLF {
        return Err(Error::MissingTerminator);
    }

    let data = Bytes::copy_from_slice(&buf[start..start + length]);
    src.advance(length + CRLF.len());

    Ok(data)
}

fn parse_number<T: std::str::FromStr>(line: &[u8]) -> Result<T, Error> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::InvalidNumber(String::from_utf8_lossy(line).into_owned()))
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString,   // '+'
    BulkString,     // '$'
    VerbatimString, // '='
    SimpleError,    // '-'
    BulkError,      // '!'
    Boolean,        // '#'
    Integer,        // ':'
    Double,         // ','
    BigNumber,      // '('
    Array,          // '*'
    Map,            // '%'
    Set,            // '~'
    Push,           // '>'
    // RESP2 has two nil encodings, one for bulk strings and one for arrays. RESP3 replaces both
    // with a single null type.
    Null, // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            b'#' => Ok(Self::Boolean),
            b',' => Ok(Self::Double),
            b'(' => Ok(Self::BigNumber),
            b'=' => Ok(Self::VerbatimString),
            b'%' => Ok(Self::Map),
            b'~' => Ok(Self::Set),
            b'>' => Ok(Self::Push),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
            DataType::Boolean => b'#',
            DataType::Double => b',',
            DataType::BigNumber => b'(',
            DataType::VerbatimString => b'=',
            DataType::Map => b'%',
            DataType::Set => b'~',
            DataType::Push => b'>',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(src: FromUtf8Error) -> Error {
        Error::Other(src.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(data: &[u8]) -> Result<Option<(Frame, usize)>, Error> {
        Frame::decode(data)
    }

    #[test]
    fn parse_simple_string_frame() {
        let frame = decode_all(b"+OK\r\n");

        assert!(matches!(frame, Ok(Some((Frame::Simple(ref s), 5))) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        let frame = decode_all(b"-ERR unknown\r\n");

        assert!(matches!(
            frame,
            Ok(Some((Frame::Error(ref s), _))) if s == "ERR unknown"
        ));
    }

    #[test]
    fn parse_integer_frames() {
        for (data, expected) in [
            (&b":1000\r\n"[..], 1000),
            (b":-1000\r\n", -1000),
            (b":0\r\n", 0),
            (b":+1000\r\n", 1000),
        ] {
            let frame = decode_all(data);
            assert!(matches!(frame, Ok(Some((Frame::Integer(i), _))) if i == expected));
        }
    }

    #[test]
    fn parse_double_frames() {
        let frame = decode_all(b",1.5\r\n");
        assert!(matches!(frame, Ok(Some((Frame::Double(d), _))) if d == 1.5));

        let frame = decode_all(b",-inf\r\n");
        assert!(matches!(frame, Ok(Some((Frame::Double(d), _))) if d == f64::NEG_INFINITY));

        let frame = decode_all(b",nan\r\n");
        assert!(matches!(frame, Ok(Some((Frame::Double(d), _))) if d.is_nan()));
    }

    #[test]
    fn parse_bulk_string_frames() {
        let frame = decode_all(b"$6\r\nfoobar\r\n");
        assert!(matches!(
            frame,
            Ok(Some((Frame::Bulk(ref b), 12))) if b == &Bytes::from("foobar")
        ));

        let frame = decode_all(b"$0\r\n\r\n");
        assert!(matches!(frame, Ok(Some((Frame::Bulk(ref b), _))) if b.is_empty()));

        let frame = decode_all(b"$-1\r\n");
        assert!(matches!(frame, Ok(Some((Frame::NullBulkString, 5)))));
    }

    #[test]
    fn parse_bulk_string_is_binary_safe() {
        let frame = decode_all(b"$4\r\na\r\nb\r\n");

        assert!(matches!(
            frame,
            Ok(Some((Frame::Bulk(ref b), 10))) if b == &Bytes::from("a\r\nb")
        ));
    }

    #[test]
    fn parse_bulk_error_frame() {
        let frame = decode_all(b"!6\r\nfoobar\r\n");

        assert!(matches!(
            frame,
            Ok(Some((Frame::Error(ref s), _))) if s == "foobar"
        ));
    }

    #[test]
    fn parse_array_of_two_bulk_strings() {
        let data = b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n";

        let (frame, consumed) = decode_all(data).unwrap().unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Bulk(Bytes::from("world")),
            ])
        );
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn parse_array_frame_nested() {
        let data = b"*2\r\n*3\r\n:1\r\n:2\r\n:3\r\n*2\r\n+Hello\r\n-World\r\n";

        let (frame, _) = decode_all(data).unwrap().unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Array(vec![
                    Frame::Integer(1),
                    Frame::Integer(2),
                    Frame::Integer(3)
                ]),
                Frame::Array(vec![
                    Frame::Simple("Hello".to_string()),
                    Frame::Error("World".to_string())
                ]),
            ])
        );
    }

    #[test]
    fn parse_null_frames() {
        assert!(matches!(decode_all(b"*-1\r\n"), Ok(Some((Frame::NullArray, 5)))));
        assert!(matches!(decode_all(b"_\r\n"), Ok(Some((Frame::Null, 3)))));
        assert!(matches!(decode_all(b"*0\r\n"), Ok(Some((Frame::Array(ref a), _))) if a.is_empty()));
    }

    #[test]
    fn parse_map_frame() {
        let data = b"%2\r\n+first\r\n:1\r\n+second\r\n:2\r\n";

        let (frame, consumed) = decode_all(data).unwrap().unwrap();

        assert_eq!(
            frame,
            Frame::Map(vec![
                (Frame::Simple("first".to_string()), Frame::Integer(1)),
                (Frame::Simple("second".to_string()), Frame::Integer(2)),
            ])
        );
        assert_eq!(consumed, data.len());
    }

    #[test]
    fn incomplete_frames_need_more_data() {
        let data = b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n";

        for end in 0..data.len() {
            assert!(
                matches!(decode_all(&data[..end]), Ok(None)),
                "prefix of {} bytes",
                end
            );
        }
    }

    #[test]
    fn pipelined_frames_are_decoded_one_at_a_time() {
        let data = b"+PONG\r\n:42\r\n";

        let (first, consumed) = decode_all(data).unwrap().unwrap();
        assert_eq!(first, Frame::Simple("PONG".to_string()));

        let (second, rest) = decode_all(&data[consumed..]).unwrap().unwrap();
        assert_eq!(second, Frame::Integer(42));
        assert_eq!(consumed + rest, data.len());
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(matches!(decode_all(b"$abc\r\n"), Err(Error::InvalidLength(_))));
        assert!(matches!(decode_all(b"*-2\r\n"), Err(Error::InvalidLength(_))));
        assert!(matches!(decode_all(b":12a\r\n"), Err(Error::InvalidNumber(_))));
        assert!(matches!(decode_all(b"$3\r\nfoobar\r\n"), Err(Error::MissingTerminator)));
        assert!(matches!(decode_all(b"?\r\n"), Err(Error::InvalidDataType(b'?'))));
        assert!(matches!(decode_all(b"#t\r\n"), Err(Error::UnsupportedDataType('#'))));
    }

    #[test]
    fn serialize_is_the_inverse_of_parse() {
        let canonical: [&[u8]; 11] = [
            b"+OK\r\n",
            b"-ERR syntax error\r\n",
            b":-42\r\n",
            b",3.25\r\n",
            b",inf\r\n",
            b"$5\r\nhello\r\n",
            b"$-1\r\n",
            b"*2\r\n$1\r\na\r\n:1\r\n",
            b"*-1\r\n",
            b"_\r\n",
            b"%1\r\n+proto\r\n:3\r\n",
        ];

        for data in canonical {
            let (frame, _) = decode_all(data).unwrap().unwrap();
            assert_eq!(frame.serialize(), data.to_vec(), "{}", frame);
        }
    }

    #[test]
    fn resp2_adaptation() {
        let frame = Frame::Array(vec![
            Frame::Double(1.5),
            Frame::Null,
            Frame::Map(vec![(Frame::Bulk(Bytes::from("k")), Frame::Integer(1))]),
        ]);

        assert_eq!(
            frame.for_protocol(Protocol::Resp2),
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("1.5")),
                Frame::NullBulkString,
                Frame::Array(vec![Frame::Bulk(Bytes::from("k")), Frame::Integer(1)]),
            ])
        );
    }

    #[test]
    fn resp3_adaptation() {
        assert_eq!(Frame::NullArray.for_protocol(Protocol::Resp3), Frame::Null);
        assert_eq!(Frame::NullBulkString.for_protocol(Protocol::Resp3), Frame::Null);
        assert_eq!(
            Frame::Double(2.0).for_protocol(Protocol::Resp3),
            Frame::Double(2.0)
        );
    }

    #[test]
    fn double_text() {
        assert_eq!(format_double(1.0), "1");
        assert_eq!(format_double(-0.5), "-0.5");
        assert_eq!(format_double(f64::INFINITY), "inf");
        assert_eq!(format_double(f64::NEG_INFINITY), "-inf");
    }
}
