/// Search and download interaction controller
pub mod controller;
/// Command, text and callback endpoints
pub mod handlers;
/// Chat transport trait and its Telegram implementation
pub mod transport;
/// Texts, labels and keyboards
pub mod views;

pub use controller::{MusicController, Outcome};
pub use transport::{AudioUpload, ChatTransport, StatusMessage, TelegramTransport};
