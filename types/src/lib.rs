#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString};

/// Every camera control this utility knows how to address.
///
/// The snake_case rendering (via `Display` / `FromStr`) is the stable public
/// name of each control; matching is case-sensitive.
#[derive(Copy, Clone, Debug, Display, EnumString, EnumIter, EnumCount, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Control {
    // Input Terminal
    AutoExposureMode,
    AutoExposurePriority,
    AbsoluteExposureTime,
    AbsoluteFocus,
    AutoFocus,
    AbsoluteZoom,
    AbsolutePanTilt,
    // Processing Unit
    BacklightCompensation,
    Brightness,
    Contrast,
    Gain,
    Saturation,
    Sharpness,
    WhiteBalanceTemperature,
    AutoWhiteBalance,
}

/// The UVC entity a control belongs to.
#[derive(Copy, Clone, Debug, Display, EnumIter, EnumCount, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UvcUnit {
    InputTerminal,
    ProcessingUnit,
}

/// Per-camera overrides for the standard UVC entity IDs.
///
/// Most cameras use Input Terminal 1 and Processing Unit 3, but some vendors
/// number their units differently.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CameraOptions {
    pub input_terminal_id: Option<u8>,
    pub processing_unit_id: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn control_names_round_trip() {
        for control in Control::iter() {
            let name = control.to_string();
            assert_eq!(Control::from_str(&name), Ok(control));
        }
    }

    #[test]
    fn control_names_are_case_sensitive() {
        assert_eq!(Control::from_str("brightness"), Ok(Control::Brightness));
        assert!(Control::from_str("Brightness").is_err());
        assert!(Control::from_str("BRIGHTNESS").is_err());
    }

    #[test]
    fn pan_tilt_name() {
        assert_eq!(Control::AbsolutePanTilt.to_string(), "absolute_pan_tilt");
    }
}
