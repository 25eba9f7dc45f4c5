// ── Domain model ──

pub mod device;

pub use device::{
    DeviceRecord, DeviceStatus, DeviceUpdate, NewDevice, StatusChange, normalize_key,
};
