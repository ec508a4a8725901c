mod client;
mod poller;

pub use client::{TelegramClient, Update};
pub use poller::{run_dispatcher, run_polling};
