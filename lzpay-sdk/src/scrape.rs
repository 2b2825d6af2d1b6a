//! Extraction of form tokens, payment rows and redirect results from
//! marketplace responses.
//!
//! The pages are XenForo templates. Nothing here is a documented interface:
//! field names and column positions are whatever the site renders today.

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::sync::LazyLock;

use crate::objects::{CreatedPayment, DepositTokens, PaymentInfo, PaymentStatus};

/// Hidden anti-CSRF token field.
pub const XF_TOKEN_FIELD: &str = "_xfToken";

/// Hidden field scoping the deposit to the logged-in account.
pub const SERVICE_ID_FIELD: &str = "service_id";

/// Cells a payment history row needs for positional extraction.
pub const PAYMENT_ROW_CELLS: usize = 6;

#[allow(clippy::expect_used)]
fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

static LOGIN_FORM: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"form[action="/login/login"]"#));
static XF_TOKEN_INPUT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="_xfToken"]"#));
static SERVICE_ID_INPUT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"input[name="service_id"]"#));
static TABLE_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

/// Errors produced when a response does not have the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(
        "form field '{0}' not found, the session may be invalid or the page layout has changed"
    )]
    MissingField(&'static str),

    #[error("payment row has {found} cells, expected at least {expected}")]
    RowTooShort { found: usize, expected: usize },

    #[error("invalid json in payment response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payment response has no '{0}'")]
    MissingRedirectField(&'static str),
}

/// A scraped page, unless the marketplace served its login form instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page<T> {
    LoginRequired,
    Content(T),
}

fn has_login_form(document: &Html) -> bool {
    document.select(&LOGIN_FORM).next().is_some()
}

fn input_value(
    document: &Html,
    selector: &Selector,
    field: &'static str,
) -> Result<String, ScrapeError> {
    document
        .select(selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(str::to_owned)
        .ok_or(ScrapeError::MissingField(field))
}

/// Read the anti-CSRF token and service id from the deposit page.
pub fn parse_deposit_page(html: &str) -> Result<Page<DepositTokens>, ScrapeError> {
    let document = Html::parse_document(html);
    if has_login_form(&document) {
        return Ok(Page::LoginRequired);
    }

    let xf_token = input_value(&document, &XF_TOKEN_INPUT, XF_TOKEN_FIELD)?;
    let service_id = input_value(&document, &SERVICE_ID_INPUT, SERVICE_ID_FIELD)?;
    Ok(Page::Content(DepositTokens {
        xf_token,
        service_id,
    }))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_owned()
}

/// Find the history row for `payment_id` and read it by column position.
///
/// Columns: 0 id, 1 creation date, 2 payment date or status, 3 unused,
/// 4 amount, 5 payment type. The row is the one directly holding the first
/// cell whose text is exactly `payment_id`; only its own cells are read, so
/// layout tables around the history do not shift the columns. Returns
/// `None` when no cell matches or `payment_id` is blank.
pub fn parse_payment_list(
    html: &str,
    payment_id: &str,
) -> Result<Page<Option<PaymentInfo>>, ScrapeError> {
    let document = Html::parse_document(html);
    if has_login_form(&document) {
        return Ok(Page::LoginRequired);
    }

    let wanted = payment_id.trim();
    if wanted.is_empty() {
        return Ok(Page::Content(None));
    }

    let row = document
        .select(&TABLE_CELL)
        .find(|cell| cell_text(*cell) == wanted)
        .and_then(|cell| {
            cell.ancestors()
                .filter_map(ElementRef::wrap)
                .find(|parent| parent.value().name() == "tr")
        });
    let Some(row) = row else {
        return Ok(Page::Content(None));
    };

    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "td")
        .map(cell_text)
        .collect();
    if cells.len() < PAYMENT_ROW_CELLS {
        return Err(ScrapeError::RowTooShort {
            found: cells.len(),
            expected: PAYMENT_ROW_CELLS,
        });
    }

    let mut cells = cells.into_iter();
    let mut next = || cells.next().unwrap_or_default();
    let payment_id = next();
    let creation_date = next();
    let payment_date = next();
    let _ = next();
    let amount = next();
    let payment_type = next();

    Ok(Page::Content(Some(PaymentInfo {
        status: PaymentStatus::from_payment_date(&payment_date),
        payment_id,
        creation_date,
        payment_date,
        amount,
        payment_type,
    })))
}

#[derive(Deserialize)]
struct RedirectResponse {
    #[serde(rename = "_redirectTarget")]
    target: Option<String>,
    #[serde(rename = "_redirectMessage")]
    message: Option<String>,
}

/// Read the JSON answer to the deposit form.
///
/// The payment id is the last `=`-separated segment of `_redirectMessage`.
pub fn parse_redirect(body: &[u8]) -> Result<CreatedPayment, ScrapeError> {
    let response: RedirectResponse = serde_json::from_slice(body)?;
    let final_url = response
        .target
        .filter(|t| !t.is_empty())
        .ok_or(ScrapeError::MissingRedirectField("_redirectTarget"))?;
    let message = response
        .message
        .filter(|m| !m.is_empty())
        .ok_or(ScrapeError::MissingRedirectField("_redirectMessage"))?;
    let payment_id = message.rsplit('=').next().unwrap_or_default().to_owned();

    Ok(CreatedPayment {
        final_url,
        payment_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPOSIT_PAGE: &str = r#"
<html><body>
  <form action="/payment/method" method="post" class="xenForm">
    <input type="hidden" name="service_type" value="refill-balance" />
    <input type="hidden" name="service_id" value="4417" />
    <input type="text" name="amount" value="" />
    <input type="hidden" name="_xfToken" value="1767225600,0123456789abcdef" />
  </form>
</body></html>"#;

    const LOGIN_PAGE: &str = r#"
<html><body>
  <form action="/login/login" method="post">
    <input type="text" name="login" />
    <input type="hidden" name="_xfToken" value="" />
  </form>
</body></html>"#;

    const PAYMENT_LIST: &str = r##"
<html><body><table class="dataTable">
  <tr><th>ID</th><th>Создан</th><th>Оплачен</th><th></th><th>Сумма</th><th>Тип</th></tr>
  <tr>
    <td>98765</td><td>01.05.2025 10:00</td><td>Не оплачен</td><td><a href="#">-</a></td>
    <td> 150 ₽ </td><td>Пополнение баланса</td>
  </tr>
  <tr>
    <td>98766</td><td>01.05.2025 11:00</td><td>Оплачен</td><td></td>
    <td>500 ₽</td><td>Пополнение баланса</td>
  </tr>
  <tr><td>12345</td><td>broken row</td></tr>
</table></body></html>"##;

    #[test]
    fn test_deposit_tokens() {
        let page = parse_deposit_page(DEPOSIT_PAGE).unwrap();
        assert_eq!(
            page,
            Page::Content(DepositTokens {
                xf_token: "1767225600,0123456789abcdef".to_string(),
                service_id: "4417".to_string(),
            })
        );
    }

    #[test]
    fn test_login_form_detected() {
        assert_eq!(parse_deposit_page(LOGIN_PAGE).unwrap(), Page::LoginRequired);
        assert_eq!(
            parse_payment_list(LOGIN_PAGE, "1").unwrap(),
            Page::LoginRequired
        );
    }

    #[test]
    fn test_missing_token_field() {
        let html = DEPOSIT_PAGE.replace("_xfToken", "_renamed");
        let err = parse_deposit_page(&html).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingField(XF_TOKEN_FIELD)));

        let html = r#"<input type="hidden" name="_xfToken" value="t" /><input name="service_id" />"#;
        let err = parse_deposit_page(html).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingField(SERVICE_ID_FIELD)));
    }

    #[test]
    fn test_payment_row_by_position() {
        let Page::Content(Some(info)) = parse_payment_list(PAYMENT_LIST, "98765").unwrap() else {
            panic!("payment row not found");
        };
        assert_eq!(info.payment_id, "98765");
        assert_eq!(info.creation_date, "01.05.2025 10:00");
        assert_eq!(info.payment_date, "Не оплачен");
        assert_eq!(info.amount, "150 ₽");
        assert_eq!(info.payment_type, "Пополнение баланса");
        assert_eq!(info.status, PaymentStatus::Pending);
        assert!(!info.is_paid());

        let Page::Content(Some(info)) = parse_payment_list(PAYMENT_LIST, "98766").unwrap() else {
            panic!("payment row not found");
        };
        assert_eq!(info.status, PaymentStatus::Completed);
        assert!(info.is_paid());
    }

    #[test]
    fn test_unknown_payment_is_absent() {
        assert_eq!(
            parse_payment_list(PAYMENT_LIST, "11111").unwrap(),
            Page::Content(None)
        );
        // partial matches do not count
        assert_eq!(
            parse_payment_list(PAYMENT_LIST, "9876").unwrap(),
            Page::Content(None)
        );
    }

    #[test]
    fn test_blank_id_matches_nothing() {
        // rows above hold empty cells
        for blank in ["", "  "] {
            assert_eq!(
                parse_payment_list(PAYMENT_LIST, blank).unwrap(),
                Page::Content(None)
            );
        }
    }

    #[test]
    fn test_history_inside_layout_table() {
        let html = r#"
<table class="layout"><tr>
  <td class="sidebar">menu</td>
  <td class="main">
    <table class="dataTable">
      <tr><td>98765</td><td>01.05.2025 10:00</td><td>Не оплачен</td><td></td><td>150 ₽</td><td>Пополнение баланса</td></tr>
    </table>
  </td>
</tr></table>"#;
        let Page::Content(Some(info)) = parse_payment_list(html, "98765").unwrap() else {
            panic!("payment row not found");
        };
        assert_eq!(info.payment_id, "98765");
        assert_eq!(info.creation_date, "01.05.2025 10:00");
        assert_eq!(info.payment_date, "Не оплачен");
        assert_eq!(info.amount, "150 ₽");
        assert!(!info.is_paid());
    }

    #[test]
    fn test_short_row_is_a_parse_error() {
        let err = parse_payment_list(PAYMENT_LIST, "12345").unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::RowTooShort {
                found: 2,
                expected: PAYMENT_ROW_CELLS
            }
        ));
    }

    #[test]
    fn test_redirect_payment_id() {
        let body = br#"{"_redirectStatus":"ok","_redirectTarget":"https://pay.example/p/abc","_redirectMessage":"https://lzt.market/payment/status?payment_id=5551234"}"#;
        let created = parse_redirect(body).unwrap();
        assert_eq!(created.final_url, "https://pay.example/p/abc");
        assert_eq!(created.payment_id, "5551234");

        let body = br#"{"_redirectTarget":"https://pay.example","_redirectMessage":"777"}"#;
        assert_eq!(parse_redirect(body).unwrap().payment_id, "777");
    }

    #[test]
    fn test_redirect_missing_fields() {
        let err = parse_redirect(br#"{"_redirectTarget":"https://pay.example"}"#).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingRedirectField("_redirectMessage")
        ));

        let err = parse_redirect(br#"{"_redirectTarget":"","_redirectMessage":"id=1"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::MissingRedirectField("_redirectTarget")
        ));

        let err = parse_redirect(b"<html>oops</html>").unwrap_err();
        assert!(matches!(err, ScrapeError::Json(_)));
    }
}
