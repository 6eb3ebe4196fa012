use crate::error::ControlError;
use std::str::FromStr;
use strum::IntoEnumIterator;
use uvcam_types::{Control, UvcUnit};

/// Wire metadata for a single control, straight out of the UVC 1.1 class
/// specification (4.2 VideoControl Requests, A.9 Control Selector Codes).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ControlDescriptor {
    pub unit: UvcUnit,
    pub selector: u8,
    /// Total payload width in bytes (wLength).
    pub total_size: u16,
    /// Width of each sub-field; equals `total_size` for scalar controls.
    pub field_size: u16,
}

impl ControlDescriptor {
    const fn scalar(unit: UvcUnit, selector: u8, size: u16) -> Self {
        Self {
            unit,
            selector,
            total_size: size,
            field_size: size,
        }
    }

    pub fn field_count(&self) -> usize {
        (self.total_size / self.field_size) as usize
    }
}

/// Look up the wire metadata for a control.
pub fn descriptor(control: Control) -> ControlDescriptor {
    use Control::*;
    use UvcUnit::{InputTerminal, ProcessingUnit};

    match control {
        AutoExposureMode => ControlDescriptor::scalar(InputTerminal, 0x02, 1),
        AutoExposurePriority => ControlDescriptor::scalar(InputTerminal, 0x03, 1),
        AbsoluteExposureTime => ControlDescriptor::scalar(InputTerminal, 0x04, 4),
        AbsoluteFocus => ControlDescriptor::scalar(InputTerminal, 0x06, 2),
        AutoFocus => ControlDescriptor::scalar(InputTerminal, 0x08, 1),
        AbsoluteZoom => ControlDescriptor::scalar(InputTerminal, 0x0B, 2),
        // dwPanAbsolute (4 bytes) + dwTiltAbsolute (4 bytes)
        AbsolutePanTilt => ControlDescriptor {
            unit: InputTerminal,
            selector: 0x0D,
            total_size: 8,
            field_size: 4,
        },
        BacklightCompensation => ControlDescriptor::scalar(ProcessingUnit, 0x01, 2),
        Brightness => ControlDescriptor::scalar(ProcessingUnit, 0x02, 2),
        Contrast => ControlDescriptor::scalar(ProcessingUnit, 0x03, 2),
        Gain => ControlDescriptor::scalar(ProcessingUnit, 0x04, 2),
        Saturation => ControlDescriptor::scalar(ProcessingUnit, 0x07, 2),
        Sharpness => ControlDescriptor::scalar(ProcessingUnit, 0x08, 2),
        WhiteBalanceTemperature => ControlDescriptor::scalar(ProcessingUnit, 0x0A, 2),
        AutoWhiteBalance => ControlDescriptor::scalar(ProcessingUnit, 0x0B, 1),
    }
}

/// Resolve a control by its public name, case-sensitively.
pub fn lookup(name: &str) -> Result<Control, ControlError> {
    Control::from_str(name).map_err(|_| ControlError::UnknownControl(name.to_string()))
}

/// All recognized control names, in declaration order.
pub fn control_names() -> impl Iterator<Item = String> {
    Control::iter().map(|control| control.to_string())
}
