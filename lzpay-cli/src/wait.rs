//! Polling a payment until it is paid.

use lzpay_sdk::PaymentInfo;
use lzpay_sdk::client::PaymentClient;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

/// Longest wait accepted; larger timeouts are clamped to it.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Pause between two lookups.
    pub interval: Duration,
    /// No lookup is started after this much time has passed.
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Paid(PaymentInfo),
    /// Gave up; carries the last row seen, if any lookup succeeded.
    TimedOut { last: Option<PaymentInfo> },
}

/// Look the payment up every `interval` until it is paid or `timeout` runs
/// out. Failed lookups count as "not paid yet".
///
/// The timeout is clamped to [`MAX_TIMEOUT`], and the last pause is cut
/// short at the deadline.
pub async fn wait_for_payment(
    client: &PaymentClient,
    payment_id: &str,
    config: WaitConfig,
) -> WaitOutcome {
    let timeout = config.timeout.min(MAX_TIMEOUT);
    let deadline = Instant::now() + timeout;
    let mut last = None;

    loop {
        match client.check_payment(payment_id).await {
            Some(payment) if payment.is_paid() => {
                info!(payment_id, "Payment is paid");
                return WaitOutcome::Paid(payment);
            }
            Some(payment) => {
                info!(payment_id, payment_date = %payment.payment_date, "Payment not paid yet");
                last = Some(payment);
            }
            None => warn!(payment_id, "Payment info unavailable, will retry"),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        sleep(config.interval.min(remaining)).await;
        if Instant::now() >= deadline {
            break;
        }
    }

    warn!(payment_id, ?timeout, "Gave up waiting for payment");
    WaitOutcome::TimedOut { last }
}
