//! HTTP handler 实现

pub mod orders;
