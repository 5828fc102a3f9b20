pub mod adapter;
pub mod device;
