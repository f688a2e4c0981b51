// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ByteWatch Monitor
//!
//! The running side of ByteWatch: turns observations into counter updates
//! and keeps subscriber views current.
//!
//! - [`UsageAccumulator`] - estimate, roll over, increment, broadcast
//! - [`monitor::spawn`] - single-writer task fed by a command queue
//! - [`MessageBus`] - push updates and ping/pong
//! - [`ViewDriver`] - push + poll subscriber producing a [`UsageView`]
//! - [`feed`] - JSON-lines observation input

pub mod accumulator;
pub mod bus;
pub mod error;
pub mod feed;
pub mod monitor;
pub mod view;

pub use accumulator::UsageAccumulator;
pub use bus::{DEFAULT_BUS_CAPACITY, Message, MessageBus, Request, Response, respond};
pub use error::MonitorError;
pub use feed::{FeedEvent, FeedStats, parse_line, pump};
pub use monitor::{Command, MonitorHandle};
pub use view::{ConnectionStatus, PeriodRow, UsageView, ViewDriver};
