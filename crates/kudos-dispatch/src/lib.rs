// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message dispatch: template rendering plus delivery through a circuit
//! breaker and the retrying executor.

pub mod dispatcher;
pub mod template;

pub use dispatcher::{Dispatcher, SMS_BREAKER};
pub use template::{render_message, tracking_link};
