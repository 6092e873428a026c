pub mod config;
pub mod constants;
pub mod critic;
pub mod encoder;
pub mod feed_forward;
pub mod generator;
pub mod init;
pub mod mask;
pub mod noise;
pub mod shape;
