// Sensor acquisition, countdown, and the serial hardware link for sonogate.

pub mod acquisition;
pub mod buffer;
pub mod countdown;
pub mod error;
pub mod serial;

pub use buffer::SampleBuffer;
pub use error::CaptureError;
