pub mod client;
pub mod sdk_dispatch;
