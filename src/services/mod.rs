// SPDX-License-Identifier: MIT

//! Service layer.

pub mod gateway;
pub mod notifier;
pub mod push;

pub use gateway::PaymentGateway;
pub use notifier::NotifierService;
pub use push::PushService;
