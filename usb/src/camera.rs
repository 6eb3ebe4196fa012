use crate::codec::{read_ints, write_int, DecodedValue};
use crate::error::ControlError;
use crate::requests::{RequestParams, UVC_GET_CUR, UVC_GET_MAX, UVC_GET_MIN, UVC_SET_CUR};
use log::{debug, info, warn};
use rusb::{
    Device, DeviceDescriptor, DeviceHandle, Direction, GlobalContext, Recipient, RequestType,
};
use std::time::Duration;
use uvcam_types::{CameraOptions, Control};

pub const CC_VIDEO: u8 = 0x0e;
pub const SC_VIDEOCONTROL: u8 = 0x01;

/// Descriptor data of an opened camera.
pub struct UsbData {
    pub(crate) vendor_id: u16,
    pub(crate) product_id: u16,
    pub(crate) device_version: (u8, u8, u8),
    pub(crate) device_manufacturer: String,
    pub(crate) product_name: String,
}

impl UsbData {
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }
    pub fn product_id(&self) -> u16 {
        self.product_id
    }
    pub fn device_version(&self) -> (u8, u8, u8) {
        self.device_version
    }
    pub fn device_manufacturer(&self) -> String {
        self.device_manufacturer.clone()
    }
    pub fn product_name(&self) -> String {
        self.product_name.clone()
    }
}

/// The transport primitives a camera backend must provide. Everything above
/// this seam is pure dispatch and codec work, testable without hardware.
pub trait ControlTransport {
    /// Device-to-host class transfer targeting the VideoControl interface.
    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, ControlError>;

    /// Host-to-device class transfer targeting the VideoControl interface.
    fn write_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), ControlError>;

    /// The interface number found by the VideoControl scan, if any.
    fn video_control_interface(&self) -> Option<u8>;

    fn options(&self) -> &CameraOptions;

    fn get_descriptor(&self) -> Result<UsbData, ControlError>;
}

/// The named control operations, implemented once over any transport.
pub trait CameraControls: ControlTransport {
    fn resolve(&self, control: Control) -> Result<RequestParams, ControlError> {
        let interface = self
            .video_control_interface()
            .ok_or(ControlError::NoVideoControlInterface)?;
        Ok(RequestParams::resolve(control, interface, self.options()))
    }

    /// Read the current value of a control (GET_CUR).
    fn get_control(&mut self, control: Control) -> Result<DecodedValue, ControlError> {
        let params = self.resolve(control)?;
        let buffer =
            self.read_control(UVC_GET_CUR, params.value, params.index, params.length as usize)?;
        read_ints(&buffer, params.field_size as usize)
    }

    /// Write a single-value control (SET_CUR).
    ///
    /// Multi-field controls are refused up front; the raw path is the only
    /// way to write them.
    fn set_control(&mut self, control: Control, value: i64) -> Result<(), ControlError> {
        let params = self.resolve(control)?;
        if params.field_size != params.length {
            return Err(ControlError::MultiFieldWrite(control));
        }
        let mut data = vec![0; params.length as usize];
        write_int(&mut data, value, params.length as usize)?;
        self.write_control(UVC_SET_CUR, params.value, params.index, &data)
    }

    /// Write caller-supplied bytes to a control verbatim (SET_CUR).
    fn set_control_raw(&mut self, control: Control, data: &[u8]) -> Result<(), ControlError> {
        let params = self.resolve(control)?;
        if data.len() != params.length as usize {
            return Err(ControlError::PayloadSize {
                expected: params.length as usize,
                actual: data.len(),
            });
        }
        self.write_control(UVC_SET_CUR, params.value, params.index, data)
    }

    /// Read the min/max range of a control (GET_MIN, then GET_MAX).
    ///
    /// GET_MAX is only issued once GET_MIN has succeeded; if either transfer
    /// fails the whole operation fails and any partial result is discarded.
    fn get_range(
        &mut self,
        control: Control,
    ) -> Result<(DecodedValue, DecodedValue), ControlError> {
        let params = self.resolve(control)?;
        let min =
            self.read_control(UVC_GET_MIN, params.value, params.index, params.length as usize)?;
        let max =
            self.read_control(UVC_GET_MAX, params.value, params.index, params.length as usize)?;
        Ok((
            read_ints(&min, params.field_size as usize)?,
            read_ints(&max, params.field_size as usize)?,
        ))
    }
}

/// A UVC camera opened through libusb.
pub struct UvcCamera {
    handle: DeviceHandle<GlobalContext>,
    descriptor: DeviceDescriptor,
    interface_number: Option<u8>,
    interface_claimed: bool,
    options: CameraOptions,
    timeout: Duration,
}

impl UvcCamera {
    /// Open the first device matching `vid`/`pid` and locate its VideoControl
    /// interface.
    ///
    /// A device without a VideoControl interface still opens; every control
    /// operation on it fails with [`ControlError::NoVideoControlInterface`].
    pub fn open(vid: u16, pid: u16, options: CameraOptions) -> Result<Self, ControlError> {
        let (device, descriptor) = find_device(vid, pid)?;
        info!("Connected to possible UVC device at {device:?}");

        let interface_number = detect_video_control_interface(&device)?;
        let mut handle = device.open()?;

        let mut interface_claimed = false;
        match interface_number {
            Some(interface) => {
                // The uvcvideo kernel driver usually holds the interface.
                if let Err(error) = handle.set_auto_detach_kernel_driver(true) {
                    debug!("Kernel driver auto-detach unavailable: {error}");
                }
                interface_claimed = handle.claim_interface(interface).is_ok();
                if !interface_claimed {
                    warn!("Unable to claim interface {interface}, continuing unclaimed");
                }
            }
            None => warn!("Device {vid:04x}:{pid:04x} has no VideoControl interface"),
        }

        Ok(Self {
            handle,
            descriptor,
            interface_number,
            interface_claimed,
            options,
            timeout: Duration::from_secs(1),
        })
    }

    /// Release the interface and the underlying handle.
    pub fn close(self) {}
}

impl Drop for UvcCamera {
    fn drop(&mut self) {
        if self.interface_claimed {
            if let Some(interface) = self.interface_number {
                let _ = self.handle.release_interface(interface);
            }
        }
    }
}

impl ControlTransport for UvcCamera {
    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: usize,
    ) -> Result<Vec<u8>, ControlError> {
        let mut buf = vec![0; length];
        let response_length = self.handle.read_control(
            rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface),
            request,
            value,
            index,
            &mut buf,
            self.timeout,
        )?;
        buf.truncate(response_length);
        Ok(buf)
    }

    fn write_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<(), ControlError> {
        self.handle.write_control(
            rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface),
            request,
            value,
            index,
            data,
            self.timeout,
        )?;

        Ok(())
    }

    fn video_control_interface(&self) -> Option<u8> {
        self.interface_number
    }

    fn options(&self) -> &CameraOptions {
        &self.options
    }

    fn get_descriptor(&self) -> Result<UsbData, ControlError> {
        let timeout = Duration::from_millis(100);
        let languages = self.handle.read_languages(timeout)?;
        let language = languages.first().copied().ok_or(rusb::Error::NotFound)?;

        let device_manufacturer =
            self.handle
                .read_manufacturer_string(language, &self.descriptor, timeout)?;
        let product_name = self
            .handle
            .read_product_string(language, &self.descriptor, timeout)?;

        let version = self.descriptor.usb_version();
        Ok(UsbData {
            vendor_id: self.descriptor.vendor_id(),
            product_id: self.descriptor.product_id(),
            device_version: (version.0, version.1, version.2),
            device_manufacturer,
            product_name,
        })
    }
}

impl CameraControls for UvcCamera {}

fn find_device(
    vid: u16,
    pid: u16,
) -> Result<(Device<GlobalContext>, DeviceDescriptor), ControlError> {
    for device in rusb::devices()?.iter() {
        if let Ok(descriptor) = device.device_descriptor() {
            if descriptor.vendor_id() == vid && descriptor.product_id() == pid {
                return Ok((device, descriptor));
            }
        }
    }
    Err(ControlError::DeviceNotFound { vid, pid })
}

/// Scan the active configuration for the interface with
/// bInterfaceClass = CC_VIDEO and bInterfaceSubClass = SC_VIDEOCONTROL.
fn detect_video_control_interface(
    device: &Device<GlobalContext>,
) -> Result<Option<u8>, ControlError> {
    let config = device.active_config_descriptor()?;
    for interface in config.interfaces() {
        for interface_descriptor in interface.descriptors() {
            if interface_descriptor.class_code() == CC_VIDEO
                && interface_descriptor.sub_class_code() == SC_VIDEOCONTROL
            {
                return Ok(Some(interface_descriptor.interface_number()));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, PartialEq, Eq)]
    pub(crate) struct Transfer {
        pub direction: Direction,
        pub request: u8,
        pub value: u16,
        pub index: u16,
        pub length: usize,
        pub data: Vec<u8>,
    }

    /// A scripted transport standing in for the rusb handle.
    pub(crate) struct MockCamera {
        pub interface_number: Option<u8>,
        pub options: CameraOptions,
        pub replies: VecDeque<Result<Vec<u8>, ControlError>>,
        pub transfers: Vec<Transfer>,
    }

    impl MockCamera {
        pub fn new(interface_number: Option<u8>) -> Self {
            Self {
                interface_number,
                options: CameraOptions::default(),
                replies: VecDeque::new(),
                transfers: Vec::new(),
            }
        }

        pub fn reply(mut self, reply: Result<Vec<u8>, ControlError>) -> Self {
            self.replies.push_back(reply);
            self
        }
    }

    impl ControlTransport for MockCamera {
        fn read_control(
            &mut self,
            request: u8,
            value: u16,
            index: u16,
            length: usize,
        ) -> Result<Vec<u8>, ControlError> {
            self.transfers.push(Transfer {
                direction: Direction::In,
                request,
                value,
                index,
                length,
                data: Vec::new(),
            });
            self.replies
                .pop_front()
                .unwrap_or(Err(ControlError::Transfer(rusb::Error::Pipe)))
        }

        fn write_control(
            &mut self,
            request: u8,
            value: u16,
            index: u16,
            data: &[u8],
        ) -> Result<(), ControlError> {
            self.transfers.push(Transfer {
                direction: Direction::Out,
                request,
                value,
                index,
                length: data.len(),
                data: data.to_vec(),
            });
            match self.replies.pop_front() {
                Some(reply) => reply.map(|_| ()),
                None => Ok(()),
            }
        }

        fn video_control_interface(&self) -> Option<u8> {
            self.interface_number
        }

        fn options(&self) -> &CameraOptions {
            &self.options
        }

        fn get_descriptor(&self) -> Result<UsbData, ControlError> {
            Ok(UsbData {
                vendor_id: 0x046D,
                product_id: 0x082D,
                device_version: (2, 0, 0),
                device_manufacturer: "Mock".to_string(),
                product_name: "Mock Camera".to_string(),
            })
        }
    }

    impl CameraControls for MockCamera {}

    #[test]
    fn get_and_set_request_types_target_a_class_interface() {
        assert_eq!(
            rusb::request_type(Direction::In, RequestType::Class, Recipient::Interface),
            0b1010_0001
        );
        assert_eq!(
            rusb::request_type(Direction::Out, RequestType::Class, Recipient::Interface),
            0b0010_0001
        );
    }

    #[test]
    fn get_brightness_end_to_end() {
        // Interface scan found interface 2; device replies with 100.
        let mut camera = MockCamera::new(Some(2)).reply(Ok(vec![0x64, 0x00]));

        let value = camera.get_control(Control::Brightness).unwrap();
        assert_eq!(value, DecodedValue::Scalar(100));

        assert_eq!(
            camera.transfers,
            vec![Transfer {
                direction: Direction::In,
                request: UVC_GET_CUR,
                value: 0x0200,
                index: 0x0302,
                length: 2,
                data: Vec::new(),
            }]
        );
    }

    #[test]
    fn get_pan_tilt_decodes_both_axes() {
        let mut camera = MockCamera::new(Some(0))
            .reply(Ok(vec![0xE8, 0x03, 0x00, 0x00, 0x18, 0xFC, 0xFF, 0xFF]));

        let value = camera.get_control(Control::AbsolutePanTilt).unwrap();
        assert_eq!(value, DecodedValue::Fields(vec![1000, -1000]));
    }

    #[test]
    fn missing_video_control_interface_issues_no_transfer() {
        let mut camera = MockCamera::new(None);

        let error = camera.get_control(Control::Brightness).unwrap_err();
        assert!(matches!(error, ControlError::NoVideoControlInterface));
        assert!(camera.transfers.is_empty());
    }

    #[test]
    fn set_encodes_a_little_endian_payload() {
        let mut camera = MockCamera::new(Some(2));

        camera.set_control(Control::Brightness, 100).unwrap();

        assert_eq!(
            camera.transfers,
            vec![Transfer {
                direction: Direction::Out,
                request: UVC_SET_CUR,
                value: 0x0200,
                index: 0x0302,
                length: 2,
                data: vec![0x64, 0x00],
            }]
        );
    }

    #[test]
    fn multi_field_set_is_refused_before_any_transfer() {
        let mut camera = MockCamera::new(Some(0));

        let error = camera.set_control(Control::AbsolutePanTilt, 0).unwrap_err();
        assert!(matches!(
            error,
            ControlError::MultiFieldWrite(Control::AbsolutePanTilt)
        ));
        assert!(camera.transfers.is_empty());
    }

    #[test]
    fn raw_write_sends_the_bytes_verbatim() {
        let mut camera = MockCamera::new(Some(0));
        let payload = [0xE8, 0x03, 0x00, 0x00, 0x18, 0xFC, 0xFF, 0xFF];

        camera
            .set_control_raw(Control::AbsolutePanTilt, &payload)
            .unwrap();

        assert_eq!(camera.transfers[0].request, UVC_SET_CUR);
        assert_eq!(camera.transfers[0].data, payload.to_vec());
    }

    #[test]
    fn raw_write_checks_the_payload_length() {
        let mut camera = MockCamera::new(Some(0));

        let error = camera
            .set_control_raw(Control::AbsolutePanTilt, &[0x00; 4])
            .unwrap_err();
        assert!(matches!(
            error,
            ControlError::PayloadSize {
                expected: 8,
                actual: 4
            }
        ));
        assert!(camera.transfers.is_empty());
    }

    #[test]
    fn range_issues_min_then_max_with_identical_params() {
        let mut camera = MockCamera::new(Some(2))
            .reply(Ok(vec![0x00, 0x00]))
            .reply(Ok(vec![0xFF, 0x00]));

        let (min, max) = camera.get_range(Control::Gain).unwrap();
        assert_eq!(min, DecodedValue::Scalar(0));
        assert_eq!(max, DecodedValue::Scalar(255));

        assert_eq!(camera.transfers.len(), 2);
        assert_eq!(camera.transfers[0].request, UVC_GET_MIN);
        assert_eq!(camera.transfers[1].request, UVC_GET_MAX);
        for transfer in &camera.transfers {
            assert_eq!(transfer.value, 0x0400);
            assert_eq!(transfer.index, 0x0302);
            assert_eq!(transfer.length, 2);
        }
    }

    #[test]
    fn range_fails_whole_when_max_fails() {
        let mut camera = MockCamera::new(Some(2))
            .reply(Ok(vec![0xF6, 0xFF])) // -10
            .reply(Err(ControlError::Transfer(rusb::Error::Pipe)));

        let error = camera.get_range(Control::Gain).unwrap_err();
        assert!(matches!(
            error,
            ControlError::Transfer(rusb::Error::Pipe)
        ));
        assert_eq!(camera.transfers.len(), 2);
    }

    #[test]
    fn range_skips_max_when_min_fails() {
        let mut camera =
            MockCamera::new(Some(2)).reply(Err(ControlError::Transfer(rusb::Error::Io)));

        assert!(camera.get_range(Control::Gain).is_err());
        assert_eq!(camera.transfers.len(), 1);
        assert_eq!(camera.transfers[0].request, UVC_GET_MIN);
    }
}
