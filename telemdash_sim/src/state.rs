//! Shared simulator state handed to every route.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::device::DeviceModel;

pub type SharedDevice = Arc<Mutex<DeviceModel>>;

#[derive(Clone)]
pub struct AppState {
    pub device: SharedDevice,
    // add a few ms of random latency to /status replies
    pub jitter: bool,
}

impl AppState {
    pub fn new(device: DeviceModel, jitter: bool) -> Self {
        Self {
            device: Arc::new(Mutex::new(device)),
            jitter,
        }
    }
}
