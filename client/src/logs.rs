//! Anchor events arrive as `Program data: <base64>` log lines.

use anchor_lang::{AnchorDeserialize, Discriminator, Event};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const PROGRAM_DATA: &str = "Program data: ";

/// Every `E` found in `logs`, in log order. Lines that are not `E` are skipped.
pub fn decode_events<E>(logs: &[String]) -> Vec<E>
where
    E: Event + AnchorDeserialize,
{
    logs.iter()
        .filter_map(|line| line.strip_prefix(PROGRAM_DATA))
        .filter_map(|payload| STANDARD.decode(payload.trim()).ok())
        .filter_map(|data| {
            let discriminator: &[u8] = E::DISCRIMINATOR;
            let body = data.strip_prefix(discriminator)?;
            E::try_from_slice(body).ok()
        })
        .collect()
}

pub fn first_event<E>(logs: &[String]) -> Option<E>
where
    E: Event + AnchorDeserialize,
{
    decode_events(logs).into_iter().next()
}

/// Log line the runtime writes for an emitted event.
pub fn encode_event<E: Event>(event: &E) -> String {
    format!("{PROGRAM_DATA}{}", STANDARD.encode(event.data()))
}
