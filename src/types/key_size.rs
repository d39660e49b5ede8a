// ABOUTME: RSA key sizes accepted by the certificate generator.
// ABOUTME: Strict parsing via FromStr, plus a lenient parse that falls back to 2048 bits.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unsupported key size '{0}': expected 512, 1024, 2048 or 4096")]
pub struct KeySizeError(pub String);

/// RSA modulus length for generated client certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeySize {
    Bits512,
    Bits1024,
    #[default]
    Bits2048,
    Bits4096,
}

impl KeySize {
    pub const ALL: [KeySize; 4] = [
        KeySize::Bits512,
        KeySize::Bits1024,
        KeySize::Bits2048,
        KeySize::Bits4096,
    ];

    pub fn bits(self) -> usize {
        match self {
            KeySize::Bits512 => 512,
            KeySize::Bits1024 => 1024,
            KeySize::Bits2048 => 2048,
            KeySize::Bits4096 => 4096,
        }
    }

    /// Parse a key size, mapping anything unrecognized to the 2048-bit default.
    ///
    /// This is deliberate CLI forgiveness: `--certsize 2O48` still produces a
    /// usable certificate. It also hides typos, so callers that want to tell
    /// the user should compare against [`KeySize::from_str`].
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for KeySize {
    type Err = KeySizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "512" => Ok(KeySize::Bits512),
            "1024" => Ok(KeySize::Bits1024),
            "2048" => Ok(KeySize::Bits2048),
            "4096" => Ok(KeySize::Bits4096),
            other => Err(KeySizeError(other.to_string())),
        }
    }
}

impl fmt::Display for KeySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_sizes_round_trip_through_display() {
        for size in KeySize::ALL {
            assert_eq!(size.to_string().parse::<KeySize>().unwrap(), size);
        }
    }

    #[test]
    fn lenient_parse_defaults_to_2048() {
        assert_eq!(KeySize::parse_lenient(""), KeySize::Bits2048);
        assert_eq!(KeySize::parse_lenient("2O48"), KeySize::Bits2048);
        assert_eq!(KeySize::parse_lenient(" 4096"), KeySize::Bits2048);
        assert_eq!(KeySize::parse_lenient("4096"), KeySize::Bits4096);
    }

    #[test]
    fn strict_parse_reports_input() {
        let err = "768".parse::<KeySize>().unwrap_err();
        assert!(err.to_string().contains("'768'"));
    }
}
