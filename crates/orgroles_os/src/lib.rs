#![forbid(unsafe_code)]

pub mod orgroles;
pub mod service;
