//! Audio capture adapters.

mod capture;

pub use capture::{CaptureError, CaptureHandle, MicSource, start_capture};
