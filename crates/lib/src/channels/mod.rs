//! Channels: per-surface payload normalization (web, WhatsApp, Telegram).

mod adapter;
mod message;
mod telegram;
mod web;
mod whatsapp;

pub use adapter::{adapter_for, ChannelAdapter, ChannelError};
pub use message::{ChannelType, InternalMessage, InternalResponse};
pub use telegram::TelegramAdapter;
pub use web::WebAdapter;
pub use whatsapp::WhatsAppAdapter;
