//! Text encodings accepted by the file tools.

use std::fmt;
use std::str::FromStr;

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

/// An encoding name nobody recognizes, or text that does not fit one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("Unsupported encoding: {0}")]
    Unsupported(String),

    #[error("Encoding error: '{encoding}' cannot decode byte 0x{byte:02x} at position {position}")]
    Decode {
        encoding: TextEncoding,
        byte: u8,
        position: usize,
    },

    #[error("Encoding error: '{encoding}' cannot encode character {ch:?} at position {position}")]
    Encode {
        encoding: TextEncoding,
        ch: char,
        position: usize,
    },
}

impl FromStr for TextEncoding {
    type Err = EncodingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized: String = name
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match normalized.as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "ascii" | "usascii" => Ok(TextEncoding::Ascii),
            "latin1" | "iso88591" | "l1" => Ok(TextEncoding::Latin1),
            _ => Err(EncodingError::Unsupported(name.to_string())),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "ascii",
            TextEncoding::Latin1 => "latin-1",
        })
    }
}

impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| {
                let position = e.utf8_error().valid_up_to();
                EncodingError::Decode {
                    encoding: self,
                    byte: bytes[position],
                    position,
                }
            }),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(position) => Err(EncodingError::Decode {
                    encoding: self,
                    byte: bytes[position],
                    position,
                }),
                None => Ok(bytes.iter().map(|&b| b as char).collect()),
            },
            // Every byte is a code point in latin-1
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>, EncodingError> {
        let limit = match self {
            TextEncoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            TextEncoding::Ascii => 0x7f,
            TextEncoding::Latin1 => 0xff,
        };
        text.chars()
            .enumerate()
            .map(|(position, ch)| {
                if (ch as u32) <= limit {
                    Ok(ch as u8)
                } else {
                    Err(EncodingError::Encode {
                        encoding: self,
                        ch,
                        position,
                    })
                }
            })
            .collect()
    }
}
