pub mod events;
pub mod gateway;
pub mod navigator;
pub mod protocol;
pub mod session;
pub mod state;
pub mod storage;
