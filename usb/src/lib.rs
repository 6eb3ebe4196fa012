pub use rusb;
pub mod camera;
pub mod codec;
pub mod controls;
pub mod error;
pub mod handle;
pub mod requests;
