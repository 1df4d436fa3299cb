pub mod app;
pub mod components;
pub mod config;
pub mod editor;
pub mod encoder;
pub mod modal;
pub mod store;
pub mod surface;
