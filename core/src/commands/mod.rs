//! Command handlers
//!
//! Each handler is a method on [`Server`](crate::Server) taking the issuing
//! session and the parsed message. Handlers validate everything before they
//! mutate anything; a refusal is returned as the numeric to send back.

mod channel;
mod messaging;
mod mode;
mod registration;

use crate::{Message, NumericReply};

/// Refuse with 461 unless the parameter count lies in `min..=max`
pub(crate) fn expect_params(
    nick: &str,
    message: &Message,
    min: usize,
    max: usize,
) -> Result<(), Message> {
    let count = message.params.len();
    if count < min || count > max {
        return Err(NumericReply::need_more_params(
            nick,
            &message.command.to_string(),
        ));
    }
    Ok(())
}
