pub mod antifraud;
pub mod method;
