use {
    chronos_channels::{ChannelOutbound, ChannelType, OutboundMessage},
    tracing::{debug, info, warn},
};

use crate::{Error, Fragment, PlatformProfile, Record, Result, chunk};

/// Message sent in place of results when there are none to deliver.
pub const DEFAULT_NO_RESULTS_NOTICE: &str =
    "No results were found. The analysis finished without producing any questions.";

/// Message sent between two records.
pub const RECORD_SEPARATOR: &str = "---";

/// Delivers parsed records to one platform, strictly in order.
///
/// Every send is awaited before the next is issued, so the chat transcript
/// keeps record order and fragment order even when delivery is asynchronous.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    profile: PlatformProfile,
    source: ChannelType,
    no_results_notice: String,
}

impl Dispatcher {
    pub fn new(profile: PlatformProfile, source: impl Into<ChannelType>) -> Self {
        Self {
            profile,
            source: source.into(),
            no_results_notice: DEFAULT_NO_RESULTS_NOTICE.to_string(),
        }
    }

    #[must_use]
    pub fn with_no_results_notice(mut self, notice: impl Into<String>) -> Self {
        self.no_results_notice = notice.into();
        self
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn source(&self) -> &ChannelType {
        &self.source
    }

    /// Send the fixed "no results" notice once.
    pub async fn send_no_results(&self, outbound: &dyn ChannelOutbound) -> Result<()> {
        self.send_text(outbound, &self.no_results_notice, 0).await
    }

    /// Deliver every record and return how many were sent.
    ///
    /// An empty slice sends the "no results" notice and returns 0. The first
    /// failed send aborts the whole dispatch.
    pub async fn dispatch(
        &self,
        records: &[Record],
        outbound: &dyn ChannelOutbound,
    ) -> Result<usize> {
        if records.is_empty() {
            self.send_no_results(outbound).await?;
            return Ok(0);
        }

        for (position, record) in records.iter().enumerate() {
            if position > 0 {
                self.send_text(outbound, RECORD_SEPARATOR, position).await?;
            }
            let header = format!("{}. {}", position + 1, record.question);
            let fragments = chunk(&record.answer, &self.profile, &header);
            debug!(
                source = %self.source,
                index = record.index,
                fragments = fragments.len(),
                "dispatching record"
            );
            for fragment in &fragments {
                self.send_fragment(outbound, fragment, position).await?;
            }
        }

        info!(source = %self.source, records = records.len(), "records dispatched");
        Ok(records.len())
    }

    async fn send_fragment(
        &self,
        outbound: &dyn ChannelOutbound,
        fragment: &Fragment,
        records_sent: usize,
    ) -> Result<()> {
        self.send_text(outbound, &fragment.rendered(), records_sent)
            .await
    }

    async fn send_text(
        &self,
        outbound: &dyn ChannelOutbound,
        text: &str,
        records_sent: usize,
    ) -> Result<()> {
        let message = OutboundMessage::new(text, self.source.clone());
        outbound.send(&message).await.map_err(|source| {
            warn!(source = %self.source, records_sent, error = %source, "delivery failed");
            Error::Delivery {
                records_sent,
                source,
            }
        })
    }
}
