//! Command harness for exercising the tools of a WhatsApp bridge: contact and
//! chat lookup, message listing and context, sending and media download.

pub mod api;
pub mod config;
pub mod error;
pub mod harness;
pub mod storage;
pub mod utils;
