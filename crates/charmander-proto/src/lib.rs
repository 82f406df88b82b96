//! Wire protocol codec for the charmander state store.
//!
//! The scheduler talks to its external key-value store over a minimal
//! textual request/reply protocol. Requests are flat arrays of
//! length-prefixed arguments; replies come in two shapes, a single value
//! or an array of values.
//!
//! # Wire Format
//!
//! Request (one command, N arguments):
//!
//! ```text
//! *<N>\r\n
//! $<len(arg 1)>\r\n<arg 1>\r\n
//! ...
//! $<len(arg N)>\r\n<arg N>\r\n
//! ```
//!
//! Single-value reply: `$<L>\r\n<value>\r\n`, where a negative `L` means
//! nil. Array reply: `*<N>\r\n` followed by N single-value frames.
//!
//! Decoding is a push model: raw socket bytes are [`ReplyDecoder::feed`]-ed
//! into the decoder, and `try_bulk`/`try_array` report either a complete
//! reply, [`Decode::Incomplete`], or a typed [`ProtocolError`] for a
//! malformed frame. The transport owns the socket; this crate never does
//! I/O.

mod codec;
mod error;

pub use codec::{encode_command, Codec, Decode, ReplyDecoder};
pub use error::ProtocolError;
