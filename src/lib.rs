#![no_std]

pub mod hardware;
pub mod settings;
pub mod sim;
