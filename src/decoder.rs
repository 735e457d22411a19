//! Incremental UTF-8 decoding of network chunks.
//!
//! A chunk boundary can fall anywhere, including inside a multi-byte
//! character. [`Utf8ChunkDecoder`] carries the incomplete tail of one chunk
//! over to the next so that no character is ever split or replaced.

use tracing::trace;

const REPLACEMENT: char = char::REPLACEMENT_CHARACTER;

/// Stateful decoder turning byte chunks into text.
///
/// # Example
/// ```
/// use assist_stream::decoder::Utf8ChunkDecoder;
///
/// let mut decoder = Utf8ChunkDecoder::new();
/// let bytes = "é".as_bytes();
///
/// assert_eq!(decoder.decode(&bytes[..1], false), "");
/// assert_eq!(decoder.decode(&bytes[1..], false), "é");
/// ```
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    carry: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether bytes of an unfinished character are waiting for the next chunk.
    pub fn has_pending(&self) -> bool {
        !self.carry.is_empty()
    }

    /// Decode `chunk`, prepending whatever was carried from the previous call.
    ///
    /// Invalid sequences become U+FFFD. An incomplete sequence at the end of
    /// the input is held back unless `is_final` is set, in which case it is
    /// replaced as well and the decoder is left empty.
    pub fn decode(&mut self, chunk: &[u8], is_final: bool) -> String {
        let input = if self.carry.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.carry);
            joined.extend_from_slice(chunk);
            joined
        };

        let mut out = String::with_capacity(input.len());
        let mut rest = input.as_slice();

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());

                    match e.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None if is_final => {
                            out.push(REPLACEMENT);
                            break;
                        }
                        None => {
                            trace!(pending = after.len(), "holding partial character");
                            self.carry.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }

        out
    }
}
