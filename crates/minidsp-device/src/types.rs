use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::DeviceError;

/// Active input source of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Analog,
    Toslink,
    Usb,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Analog, Source::Toslink, Source::Usb];

    /// The byte the device uses for this source.
    pub fn index(self) -> u8 {
        match self {
            Source::Analog => 0,
            Source::Toslink => 1,
            Source::Usb => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.index() == index)
    }

    pub fn name(self) -> &'static str {
        match self {
            Source::Analog => "analog",
            Source::Toslink => "toslink",
            Source::Usb => "usb",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A byte read back from the device.
impl TryFrom<u8> for Source {
    type Error = DeviceError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index)
            .ok_or_else(|| DeviceError::Protocol(format!("unknown input source {index:#04x}")))
    }
}

/// Accepts a source name (any case) or its numeric index.
impl FromStr for Source {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Self::from_index(index)
                .ok_or_else(|| DeviceError::InvalidArgument(format!("no such input: {index}")));
        }
        Self::ALL
            .into_iter()
            .find(|source| source.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DeviceError::InvalidArgument(format!("no such input: {s:?}")))
    }
}

/// Master volume and mute state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MasterStatus {
    /// Attenuation in dB, 0 down to -127.5 in 0.5 dB steps.
    pub volume_db: f32,
    pub muted: bool,
}

/// Instantaneous input levels in dBFS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputLevels {
    pub input1: f32,
    pub input2: f32,
}

impl InputLevels {
    pub fn as_array(&self) -> [f32; 2] {
        [self.input1, self.input2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_parse_case_insensitively() {
        assert_eq!("analog".parse::<Source>().unwrap(), Source::Analog);
        assert_eq!("TOSLINK".parse::<Source>().unwrap(), Source::Toslink);
        assert_eq!(" Usb ".parse::<Source>().unwrap(), Source::Usb);
    }

    #[test]
    fn source_indices_parse() {
        assert_eq!("1".parse::<Source>().unwrap(), Source::Toslink);
        assert!(matches!(
            "3".parse::<Source>(),
            Err(DeviceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_source_is_invalid_argument() {
        assert!(matches!(
            "bogus".parse::<Source>(),
            Err(DeviceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn source_index_roundtrip() {
        for source in Source::ALL {
            assert_eq!(Source::from_index(source.index()), Some(source));
        }
        assert_eq!(Source::from_index(7), None);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Source::Toslink).unwrap(),
            "\"toslink\""
        );
    }
}
