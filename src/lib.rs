//! # Expo Push
//!
//! Client SDK for the [Expo push notification service](https://docs.expo.dev/push-notifications/overview/).
//!
//! ## Features
//!
//! - **Message builder**: chainable construction of Expo push messages
//! - **Batched dispatch**: one request per batch, gzip above 1 KiB
//! - **Ticket correlation**: positional mapping from tickets back to tokens,
//!   with a hook for `DeviceNotRegistered` cleanup
//! - **Subscriptions**: channel → token registry over pluggable storage
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use expo_push::{Expo, ExpoMessage};
//!
//! #[tokio::main]
//! async fn main() -> expo_push::Result<()> {
//!     let mut expo = Expo::new()?;
//!
//!     let message = ExpoMessage::new()
//!         .title("New message")
//!         .body("You have a new message!")
//!         .badge(1)
//!         .to("ExpoPushToken[xxxxxxxxxxxxxxxx]")?;
//!
//!     let response = expo.send(message)?.push().await?;
//!
//!     for ticket in response.tickets() {
//!         println!("{:?}", ticket.id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## With channel subscriptions
//!
//! ```rust,ignore
//! use expo_push::{Expo, ExpoMessage};
//!
//! let mut expo = Expo::file("subscriptions.json").await?;
//! expo.subscribe("news", "ExpoPushToken[xxxxxxxxxxxxxxxx]").await?;
//!
//! expo.to_channel("news").await?;
//! expo.send(ExpoMessage::new().title("Breaking"))?.push().await?;
//! ```

mod client;
mod driver;
mod error;
mod error_manager;
mod expo;
mod message;
mod response;
mod subscriptions;
mod token;

pub use client::{EXPO_BASE_URL, ExpoClient};
pub use driver::{Driver, FileDriver, SubscriptionDriver};
pub use error::{ExpoError, Result};
pub use expo::{Expo, SendInput};
pub use message::{ExpoMessage, Priority};
pub use response::{ExpoResponse, Ticket};
pub use subscriptions::SubscriptionManager;
pub use token::{Tokens, is_expo_push_token, validate_tokens};

pub mod prelude {
    //! Prelude for common imports.
    //!
    //! ```
    //! use expo_push::prelude::*;
    //! ```

    pub use crate::client::ExpoClient;
    pub use crate::driver::{Driver, FileDriver};
    pub use crate::error::{ExpoError, Result};
    pub use crate::expo::Expo;
    pub use crate::message::{ExpoMessage, Priority};
    pub use crate::response::{ExpoResponse, Ticket};
    pub use crate::token::is_expo_push_token;
}
