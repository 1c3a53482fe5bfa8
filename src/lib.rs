//! Telegram bot that turns a chapter, a verse range and a reciter into a short
//! vertical video: verse text scrolling over a solid background, synchronized
//! to the concatenated recitation.

// Configuration and errors.
pub mod args;
pub mod config;
pub mod error;

// Video pipeline, leaves first.
pub mod verses;
pub mod wrap;
pub mod audio;
pub mod video;
pub mod ffmpeg;
pub mod render;

// Conversation and transport.
pub mod session;
pub mod gateway;
pub mod telegram;
pub mod conversation;
pub mod audit;
pub mod bot;

#[cfg(test)]
pub(crate) mod testing;
