//! # Events Module
//!
//! Progress reporting over channels, so the CLI (or any other front-end)
//! can draw progress without the core knowing about it.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Compare(CompareEvent::Progress(p)) = event {
//!             println!("{} seeds done, {} images left", p.seeds_processed, p.pool_remaining);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
