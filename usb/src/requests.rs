use crate::controls::descriptor;
use uvcam_types::{CameraOptions, Control, UvcUnit};

// UVC 1.1, 4.2 VideoControl Requests.
pub const UVC_SET_CUR: u8 = 0x01;
pub const UVC_GET_CUR: u8 = 0x81;
pub const UVC_GET_MIN: u8 = 0x82;
pub const UVC_GET_MAX: u8 = 0x83;

pub const UVC_INPUT_TERMINAL_ID: u8 = 0x01;
pub const UVC_PROCESSING_UNIT_ID: u8 = 0x03;

/// The wValue / wIndex / wLength triple of a control transfer, plus the field
/// width the payload decodes with. Computed per call, never stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RequestParams {
    pub value: u16,
    pub index: u16,
    pub length: u16,
    pub field_size: u16,
}

impl RequestParams {
    /// Derive the transfer parameters for `control` on the given VideoControl
    /// interface, applying any unit-ID override from `options`.
    pub fn resolve(control: Control, interface_number: u8, options: &CameraOptions) -> Self {
        let descriptor = descriptor(control);
        let unit = resolve_unit(descriptor.unit, options);
        Self {
            value: u16::from(descriptor.selector) << 8,
            index: u16::from(unit) << 8 | u16::from(interface_number),
            length: descriptor.total_size,
            field_size: descriptor.field_size,
        }
    }
}

fn resolve_unit(unit: UvcUnit, options: &CameraOptions) -> u8 {
    match unit {
        UvcUnit::InputTerminal => options.input_terminal_id.unwrap_or(UVC_INPUT_TERMINAL_ID),
        UvcUnit::ProcessingUnit => options
            .processing_unit_id
            .unwrap_or(UVC_PROCESSING_UNIT_ID),
    }
}
