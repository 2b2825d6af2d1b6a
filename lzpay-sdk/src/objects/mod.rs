pub mod method;
pub mod payment;

pub use method::{PaymentMethod, UnknownPaymentMethod};
pub use payment::{
    CreatedPayment, DEPOSIT_PATH, DepositTokens, PAID_LITERAL, PaymentInfo, PaymentRequest,
    PaymentResponse, PaymentStatus, UNPAID_LITERAL, ValidationError, check_amount,
    placeholder_phone,
};
