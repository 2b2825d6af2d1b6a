//! Balance deposit creation.

use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use tracing::{Instrument, debug, error, info, warn};

use super::{ClientError, DEPOSIT_PATH, JSON_ACCEPT, PAYMENT_METHOD_PATH, PaymentClient};
use crate::config::PhonePolicy;
use crate::objects::{
    CreatedPayment, DepositTokens, PaymentMethod, PaymentRequest, PaymentResponse, check_amount,
    placeholder_phone,
};
use crate::scrape::{self, Page};

impl PaymentClient {
    /// Create a deposit and return the payment page URL and id.
    ///
    /// Never fails: every error, including local validation, is logged and
    /// returned as [`PaymentResponse::Failure`].
    pub async fn create_payment(
        &self,
        amount: Decimal,
        method: PaymentMethod,
        phone: Option<String>,
    ) -> PaymentResponse {
        let result = self.try_create_payment(amount, method, phone).await;
        self.span.in_scope(|| match &result {
            Ok(created) => info!(payment_id = %created.payment_id, %method, "Payment created"),
            Err(e) => error!(error = %e, %method, %amount, "Failed to create payment"),
        });
        result.into()
    }

    /// Like [`create_payment`](Self::create_payment), returning the error
    /// instead of a response value.
    pub async fn try_create_payment(
        &self,
        amount: Decimal,
        method: PaymentMethod,
        phone: Option<String>,
    ) -> Result<CreatedPayment, ClientError> {
        self.create_inner(amount, method, phone)
            .instrument(self.span.clone())
            .await
    }

    /// Scrape fresh form tokens from the deposit page.
    pub async fn fetch_tokens(&self) -> Result<DepositTokens, ClientError> {
        self.fetch_tokens_inner().instrument(self.span.clone()).await
    }

    async fn create_inner(
        &self,
        amount: Decimal,
        method: PaymentMethod,
        phone: Option<String>,
    ) -> Result<CreatedPayment, ClientError> {
        check_amount(amount, method)?;

        let phone = phone.filter(|p| !p.trim().is_empty());
        let phone = match (phone, self.config.phone_policy) {
            (None, PhonePolicy::Synthesize) if method.requires_phone() => {
                let phone = placeholder_phone();
                warn!(%phone, %method, "No phone number given, using a placeholder");
                Some(phone)
            }
            (phone, _) => phone,
        };
        let request = PaymentRequest::new(amount, method, phone)?;

        let tokens = self.fetch_tokens_inner().await?;
        self.submit(&request, &tokens).await
    }

    async fn fetch_tokens_inner(&self) -> Result<DepositTokens, ClientError> {
        let html = self.fetch_html(DEPOSIT_PATH).await?;
        match scrape::parse_deposit_page(&html)? {
            Page::Content(tokens) => Ok(tokens),
            Page::LoginRequired => {
                debug!(cookies = ?self.cookies, "Deposit page served the login form");
                Err(ClientError::Unauthenticated)
            }
        }
    }

    /// `POST /payment/method` with the deposit form, asking XenForo for a
    /// JSON redirect instead of a page.
    async fn submit(
        &self,
        request: &PaymentRequest,
        tokens: &DepositTokens,
    ) -> Result<CreatedPayment, ClientError> {
        let url = self.endpoint(PAYMENT_METHOD_PATH)?;
        let referer = self.endpoint(DEPOSIT_PATH)?;
        let redirect = self.endpoint("/")?;
        let form = request.to_form(tokens, redirect.as_str());
        debug!(
            method = request.method.vendor_code(),
            amount = %request.amount_field(),
            "Submitting deposit form"
        );

        let resp = self
            .browser_request(Method::POST, url, JSON_ACCEPT, &referer)
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status { status });
        }
        let body = resp.bytes().await?;
        Ok(scrape::parse_redirect(&body)?)
    }
}
