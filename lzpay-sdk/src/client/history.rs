//! Payment status lookup in the payment history.

use tracing::{Instrument, error, info, warn};

use super::{ClientError, PAYMENT_LIST_PATH, PaymentClient};
use crate::objects::PaymentInfo;
use crate::scrape::{self, Page};

impl PaymentClient {
    /// Look up a payment in the history table.
    ///
    /// `None` means the payment is not listed or the lookup failed; failures
    /// are logged. Only the first page of the history is searched.
    pub async fn check_payment(&self, payment_id: &str) -> Option<PaymentInfo> {
        let result = self.try_check_payment(payment_id).await;
        self.span.in_scope(|| match result {
            Ok(Some(info)) => {
                info!(
                    payment_id,
                    paid = info.is_paid(),
                    status = ?info.status,
                    "Fetched payment info"
                );
                Some(info)
            }
            Ok(None) => {
                warn!(payment_id, "Payment not found");
                None
            }
            Err(e) => {
                error!(payment_id, error = %e, "Failed to fetch payment info");
                None
            }
        })
    }

    /// Like [`check_payment`](Self::check_payment), keeping "not listed"
    /// (`Ok(None)`) apart from failures.
    pub async fn try_check_payment(
        &self,
        payment_id: &str,
    ) -> Result<Option<PaymentInfo>, ClientError> {
        async {
            let html = self.fetch_html(PAYMENT_LIST_PATH).await?;
            match scrape::parse_payment_list(&html, payment_id)? {
                Page::Content(info) => Ok(info),
                Page::LoginRequired => Err(ClientError::Unauthenticated),
            }
        }
        .instrument(self.span.clone())
        .await
    }
}
