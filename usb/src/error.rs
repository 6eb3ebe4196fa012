use uvcam_types::Control;

#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    #[error("No USB device was found with vid {vid:#06x}, pid {pid:#06x}")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("Device has no VideoControl interface")]
    NoVideoControlInterface,

    #[error("Control name not recognized: {0}")]
    UnknownControl(String),

    #[error("Payload of {length} bytes does not split into {field_size}-byte fields")]
    MisalignedFields { length: usize, field_size: usize },

    #[error("{0} carries multiple fields, write it through the raw path")]
    MultiFieldWrite(Control),

    #[error("Value {value} does not fit in {length} bytes")]
    ValueOutOfRange { value: i64, length: usize },

    #[error("Payload must be {expected} bytes, got {actual}")]
    PayloadSize { expected: usize, actual: usize },

    #[error("USB error: {0}")]
    Transfer(#[from] rusb::Error),

    #[error("Camera worker has shut down")]
    CameraClosed,
}
