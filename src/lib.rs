#![warn(missing_docs, missing_debug_implementations)]

//! Check whether Roblox usernames are available, taken, or invalid.
//!
//! Each username gets at most two requests: a lookup by name, and, only when
//! no account was found, a validation request that reports whether the name
//! could be registered. Bulk runs are strictly sequential with a pause
//! between names so the remote rate limit is respected.
//!
//! # Example
//!
//! ```no_run
//! use roblox_avail::check::{Client, Outcome, check_username};
//!
//! let client = Client::new();
//! match check_username(&client, "freshname42") {
//!     Outcome::Available => println!("Name is available!"),
//!     Outcome::Taken(user) => println!("Already taken by {}.", user.id),
//!     Outcome::Invalid(reason) => println!("Invalid: {reason}"),
//! }
//! ```

pub mod bulk;
pub mod check;
pub mod config;
pub mod input;
pub mod interrupt;
pub mod report;
