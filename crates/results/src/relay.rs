use {
    chronos_channels::ChannelOutbound,
    serde::Serialize,
    tracing::{info, warn},
};

use crate::{Dispatcher, ResultMarkers, Result, extract, parse};

/// Non-error result of relaying one process output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelayOutcome {
    /// Records were parsed and every fragment was delivered.
    Delivered { records: usize },
    /// The output held no result block; the producer failed or printed none.
    NoBlockFound,
    /// A block was present but held no complete record.
    EmptyRecordSet,
}

impl RelayOutcome {
    /// Whether the user was sent the "no results" notice.
    pub fn is_empty(&self) -> bool {
        !matches!(self, Self::Delivered { .. })
    }
}

/// Extract, parse and deliver the results found in `raw`.
///
/// Both empty outcomes send the "no results" notice exactly once; the
/// returned [`RelayOutcome`] tells them apart for diagnostics. Delivery
/// failures abort immediately with [`crate::Error::Delivery`].
pub async fn relay(
    raw: &str,
    markers: &ResultMarkers,
    dispatcher: &Dispatcher,
    outbound: &dyn ChannelOutbound,
) -> Result<RelayOutcome> {
    let Some(block) = extract(raw, markers) else {
        warn!(
            source = %dispatcher.source(),
            start = %markers.start(),
            "no result block found in process output"
        );
        dispatcher.send_no_results(outbound).await?;
        return Ok(RelayOutcome::NoBlockFound);
    };

    let records = parse(&block);
    if records.is_empty() {
        info!(
            source = %dispatcher.source(),
            block_len = block.as_str().len(),
            "result block holds no complete records"
        );
        dispatcher.send_no_results(outbound).await?;
        return Ok(RelayOutcome::EmptyRecordSet);
    }

    let records = dispatcher.dispatch(&records, outbound).await?;
    info!(source = %dispatcher.source(), records, "relay delivered");
    Ok(RelayOutcome::Delivered { records })
}
