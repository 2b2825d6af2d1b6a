//! Payment request, creation result and status types.

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::method::PaymentMethod;

/// Text of the payment-date cell once the marketplace has received the money.
pub const PAID_LITERAL: &str = "Оплачен";

/// Text of the payment-date cell while the payment is still open.
pub const UNPAID_LITERAL: &str = "Не оплачен";

/// Page holding the deposit form and its hidden tokens. The form echoes it
/// back as `_xfRequestUri`.
pub const DEPOSIT_PATH: &str = "/payment/balance/deposit";

/// Reasons a payment request is rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("minimum amount for method '{method}' is {minimum} RUB, got {amount}")]
    BelowMinimum {
        method: PaymentMethod,
        minimum: Decimal,
        amount: Decimal,
    },

    #[error("method '{0}' requires a phone number")]
    MissingPhone(PaymentMethod),
}

/// Check `amount` against the minimum of `method`.
pub fn check_amount(amount: Decimal, method: PaymentMethod) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    let minimum = method.minimum_amount();
    if amount < minimum {
        return Err(ValidationError::BelowMinimum {
            method,
            minimum,
            amount,
        });
    }
    Ok(())
}

/// Values scraped from the deposit page that the payment form must echo
/// back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositTokens {
    pub xf_token: String,
    pub service_id: String,
}

/// A validated deposit request.
///
/// Only built through [`PaymentRequest::new`]; it serializes for logging
/// and output but is not deserializable, so every value has been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl PaymentRequest {
    /// Validate and build a request.
    ///
    /// Blank phone strings count as absent. The phone is kept only for
    /// methods that use it.
    pub fn new(
        amount: Decimal,
        method: PaymentMethod,
        phone: Option<String>,
    ) -> Result<Self, ValidationError> {
        check_amount(amount, method)?;

        let phone = phone.filter(|p| !p.trim().is_empty());
        if !method.requires_phone() {
            return Ok(Self {
                amount,
                method,
                phone: None,
            });
        }
        match phone {
            Some(phone) => Ok(Self {
                amount,
                method,
                phone: Some(phone),
            }),
            None => Err(ValidationError::MissingPhone(method)),
        }
    }

    /// Amount as sent in the form, without trailing zeros.
    pub fn amount_field(&self) -> String {
        self.amount.normalize().to_string()
    }

    /// Value of the `extra[phone]` form field. Empty unless the method uses it.
    pub fn phone_field(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }

    /// Fields of the deposit form, in the order a browser posts them.
    ///
    /// `redirect` is the absolute URL of the site root. The `_xf*` fields
    /// make XenForo answer with a JSON redirect instead of a page.
    pub fn to_form(&self, tokens: &DepositTokens, redirect: &str) -> Vec<(&'static str, String)> {
        vec![
            ("currency", "rub".to_owned()),
            ("amount", self.amount_field()),
            ("method", self.method.vendor_code().to_owned()),
            ("extra[phone]", self.phone_field().to_owned()),
            ("service_type", "refill-balance".to_owned()),
            ("service_id", tokens.service_id.clone()),
            ("redirect", redirect.to_owned()),
            ("_xfConfirm", "1".to_owned()),
            ("_xfToken", tokens.xf_token.clone()),
            ("_xfRequestUri", DEPOSIT_PATH.to_owned()),
            ("_xfNoRedirect", "1".to_owned()),
            ("_xfResponseType", "json".to_owned()),
        ]
    }
}

/// Russian mobile number in `+7XXXXXXXXXX` form, not tied to anyone.
///
/// Non-cryptographic; only used to fill a form field the payment
/// processor insists on.
pub fn placeholder_phone() -> String {
    let number: u64 = rand::rng().random_range(9_000_000_000..=9_999_999_999);
    format!("+7{number}")
}

/// A payment the marketplace accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPayment {
    /// Page the payer has to open to complete the payment.
    pub final_url: String,
    pub payment_id: String,
}

/// Outcome of a creation attempt.
///
/// Serializes to either `{"final_url", "payment_id"}` or `{"error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaymentResponse {
    Success {
        final_url: String,
        payment_id: String,
    },
    Failure {
        #[serde(rename = "error")]
        message: String,
    },
}

impl PaymentResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { message } => Some(message),
            Self::Success { .. } => None,
        }
    }

    pub fn payment_id(&self) -> Option<&str> {
        match self {
            Self::Success { payment_id, .. } => Some(payment_id),
            Self::Failure { .. } => None,
        }
    }

    pub fn final_url(&self) -> Option<&str> {
        match self {
            Self::Success { final_url, .. } => Some(final_url),
            Self::Failure { .. } => None,
        }
    }
}

impl From<CreatedPayment> for PaymentResponse {
    fn from(created: CreatedPayment) -> Self {
        Self::Success {
            final_url: created.final_url,
            payment_id: created.payment_id,
        }
    }
}

impl<E: fmt::Display> From<Result<CreatedPayment, E>> for PaymentResponse {
    fn from(result: Result<CreatedPayment, E>) -> Self {
        match result {
            Ok(created) => created.into(),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
}

impl PaymentStatus {
    /// Derive the status from the payment-date cell text.
    pub fn from_payment_date(text: &str) -> Self {
        if text == PAID_LITERAL {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Pending
        }
    }
}

/// One row of the payment history, as shown on the listing page.
///
/// All fields are the trimmed cell texts; nothing is parsed further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub payment_id: String,
    pub creation_date: String,
    /// Either the date the payment went through or a status text such as
    /// [`UNPAID_LITERAL`].
    pub payment_date: String,
    pub amount: String,
    pub payment_type: String,
    pub status: PaymentStatus,
}

impl PaymentInfo {
    pub fn is_paid(&self) -> bool {
        !self.payment_date.is_empty() && self.payment_date != UNPAID_LITERAL
    }
}
