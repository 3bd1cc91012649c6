//! Reply Encoding
//!
//! Emitters for the server-to-client RESP frames. Each function appends one
//! complete frame, CRLF-terminated, to a connection's pending-output buffer;
//! nothing is written to the socket here. Responses for pipelined commands
//! accumulate in the same buffer and go out as one aggregated write.
//!
//! ## Frame formats
//!
//! ```text
//! simple string: +<bytes>\r\n
//! error:         -<bytes>\r\n
//! integer:       :<decimal>\r\n
//! bulk string:   $<n>\r\n<n bytes>\r\n
//! null bulk:     $-1\r\n
//! array header:  *<count>\r\n
//! ```

use bytes::{BufMut, BytesMut};

/// The CRLF terminator ending every RESP frame.
pub const CRLF: &[u8] = b"\r\n";

/// RESP type prefix bytes.
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// Appends a simple string frame: `+<msg>\r\n`.
///
/// `msg` must not contain CRLF; simple strings are not binary safe.
pub fn simple_string(out: &mut BytesMut, msg: &str) {
    out.put_u8(prefix::SIMPLE_STRING);
    out.extend_from_slice(msg.as_bytes());
    out.extend_from_slice(CRLF);
}

/// Appends an error frame: `-<msg>\r\n`.
pub fn error(out: &mut BytesMut, msg: &str) {
    out.put_u8(prefix::ERROR);
    out.extend_from_slice(msg.as_bytes());
    out.extend_from_slice(CRLF);
}

/// Appends an integer frame: `:<n>\r\n`.
pub fn integer(out: &mut BytesMut, n: i64) {
    out.put_u8(prefix::INTEGER);
    out.extend_from_slice(n.to_string().as_bytes());
    out.extend_from_slice(CRLF);
}

/// Appends a bulk string frame: `$<len>\r\n<data>\r\n`. Binary safe.
pub fn bulk_string(out: &mut BytesMut, data: &[u8]) {
    out.put_u8(prefix::BULK_STRING);
    out.extend_from_slice(data.len().to_string().as_bytes());
    out.extend_from_slice(CRLF);
    out.extend_from_slice(data);
    out.extend_from_slice(CRLF);
}

/// Appends the null bulk frame `$-1\r\n`, the reply for a missing key.
pub fn null_bulk_string(out: &mut BytesMut) {
    out.extend_from_slice(b"$-1");
    out.extend_from_slice(CRLF);
}

/// Appends an array header: `*<count>\r\n`. The caller emits the `count`
/// element frames after it.
pub fn array_header(out: &mut BytesMut, count: usize) {
    out.put_u8(prefix::ARRAY);
    out.extend_from_slice(count.to_string().as_bytes());
    out.extend_from_slice(CRLF);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl FnOnce(&mut BytesMut)) -> BytesMut {
        let mut out = BytesMut::new();
        f(&mut out);
        out
    }

    #[test]
    fn test_simple_string() {
        assert_eq!(&encode(|out| simple_string(out, "OK"))[..], b"+OK\r\n");
        assert_eq!(&encode(|out| simple_string(out, "PONG"))[..], b"+PONG\r\n");
    }

    #[test]
    fn test_error() {
        assert_eq!(
            &encode(|out| error(out, "ERR unknown command"))[..],
            b"-ERR unknown command\r\n"
        );
    }

    #[test]
    fn test_integer() {
        assert_eq!(&encode(|out| integer(out, 1000))[..], b":1000\r\n");
        assert_eq!(&encode(|out| integer(out, -42))[..], b":-42\r\n");
    }

    #[test]
    fn test_bulk_string() {
        assert_eq!(
            &encode(|out| bulk_string(out, b"hello"))[..],
            b"$5\r\nhello\r\n"
        );
        assert_eq!(&encode(|out| bulk_string(out, b""))[..], b"$0\r\n\r\n");
    }

    #[test]
    fn test_bulk_string_is_binary_safe() {
        assert_eq!(
            &encode(|out| bulk_string(out, b"a\x00b"))[..],
            b"$3\r\na\x00b\r\n"
        );
    }

    #[test]
    fn test_null_bulk_string() {
        assert_eq!(&encode(null_bulk_string)[..], b"$-1\r\n");
    }

    #[test]
    fn test_array_header() {
        assert_eq!(&encode(|out| array_header(out, 0))[..], b"*0\r\n");
        assert_eq!(&encode(|out| array_header(out, 3))[..], b"*3\r\n");
    }

    #[test]
    fn test_frames_accumulate() {
        let mut out = BytesMut::new();
        simple_string(&mut out, "OK");
        bulk_string(&mut out, b"val");
        assert_eq!(&out[..], b"+OK\r\n$3\r\nval\r\n");
    }
}
