// src/core/mod.rs

pub mod capsule;
pub mod launch_mode;
pub mod launcher;
pub mod payload;
pub mod runtime;
pub mod script_launcher;
pub mod server_launcher;
pub mod settings;
pub mod webserver_config;
pub mod work_area;
