use crate::camera::{CameraControls, UsbData, UvcCamera};
use crate::codec::DecodedValue;
use crate::error::ControlError;
use log::debug;
use tokio::sync::{mpsc, oneshot};
use tokio::task;
use uvcam_types::{CameraOptions, Control};

type Responder<T> = oneshot::Sender<Result<T, ControlError>>;

enum CameraCommand {
    Get(Control, Responder<DecodedValue>),
    Set(Control, i64, Responder<()>),
    SetRaw(Control, Vec<u8>, Responder<()>),
    Range(Control, Responder<(DecodedValue, DecodedValue)>),
    Describe(Responder<UsbData>),
}

/// Async front of an opened camera.
///
/// The camera itself lives on a blocking worker task that owns the USB handle
/// exclusively; commands queue through an mpsc channel and are serviced
/// strictly in arrival order, each answering through its own oneshot. Cloning
/// the handle shares the same worker; the camera closes once every clone is
/// gone.
#[derive(Clone)]
pub struct CameraHandle {
    sender: mpsc::Sender<CameraCommand>,
}

impl CameraHandle {
    /// Open a camera by vendor/product ID and spin up its worker.
    pub async fn open(
        vid: u16,
        pid: u16,
        options: CameraOptions,
    ) -> Result<Self, ControlError> {
        Self::spawn(move || UvcCamera::open(vid, pid, options)).await
    }

    pub(crate) async fn spawn<C, F>(open: F) -> Result<Self, ControlError>
    where
        C: CameraControls + Send + 'static,
        F: FnOnce() -> Result<C, ControlError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(32);
        let (ready_sender, ready_receiver) = oneshot::channel();
        task::spawn_blocking(move || run_camera(open, receiver, ready_sender));

        match ready_receiver.await {
            Ok(Ok(())) => Ok(Self { sender }),
            Ok(Err(error)) => Err(error),
            Err(_) => Err(ControlError::CameraClosed),
        }
    }

    pub async fn get(&self, control: Control) -> Result<DecodedValue, ControlError> {
        self.request(|reply| CameraCommand::Get(control, reply))
            .await
    }

    pub async fn set(&self, control: Control, value: i64) -> Result<(), ControlError> {
        self.request(|reply| CameraCommand::Set(control, value, reply))
            .await
    }

    pub async fn set_raw(&self, control: Control, data: Vec<u8>) -> Result<(), ControlError> {
        self.request(|reply| CameraCommand::SetRaw(control, data, reply))
            .await
    }

    pub async fn range(
        &self,
        control: Control,
    ) -> Result<(DecodedValue, DecodedValue), ControlError> {
        self.request(|reply| CameraCommand::Range(control, reply))
            .await
    }

    pub async fn describe(&self) -> Result<UsbData, ControlError> {
        self.request(CameraCommand::Describe).await
    }

    /// Drop this handle; the camera closes once the last clone is gone.
    pub fn close(self) {}

    async fn request<T>(
        &self,
        command: impl FnOnce(Responder<T>) -> CameraCommand,
    ) -> Result<T, ControlError> {
        let (reply_sender, reply_receiver) = oneshot::channel();
        self.sender
            .send(command(reply_sender))
            .await
            .map_err(|_| ControlError::CameraClosed)?;
        reply_receiver
            .await
            .map_err(|_| ControlError::CameraClosed)?
    }
}

fn run_camera<C, F>(
    open: F,
    mut receiver: mpsc::Receiver<CameraCommand>,
    ready: oneshot::Sender<Result<(), ControlError>>,
) where
    C: CameraControls,
    F: FnOnce() -> Result<C, ControlError>,
{
    let mut camera = match open() {
        Ok(camera) => {
            let _ = ready.send(Ok(()));
            camera
        }
        Err(error) => {
            let _ = ready.send(Err(error));
            return;
        }
    };

    while let Some(command) = receiver.blocking_recv() {
        match command {
            CameraCommand::Get(control, reply) => {
                let _ = reply.send(camera.get_control(control));
            }
            CameraCommand::Set(control, value, reply) => {
                let _ = reply.send(camera.set_control(control, value));
            }
            CameraCommand::SetRaw(control, data, reply) => {
                let _ = reply.send(camera.set_control_raw(control, &data));
            }
            CameraCommand::Range(control, reply) => {
                let _ = reply.send(camera.get_range(control));
            }
            CameraCommand::Describe(reply) => {
                let _ = reply.send(camera.get_descriptor());
            }
        }
    }
    debug!("Camera command channel closed, worker shutting down");
}
