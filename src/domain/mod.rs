pub mod merchant;
pub mod payment;
pub mod ports;
pub mod webhook;
