//! M-Pesa package purchases: STK push, confirmation polling, and the
//! payment/agency-client bookkeeping that follows a completed charge.

pub mod domain;
pub mod flow;
pub mod gateway;
pub mod phone;

pub use domain::{
    find_package, standard_packages, AgencyClientRecord, Checkout, PaymentMethod, PaymentPackage,
    PaymentRecord, PaymentStatus, PlacementStatus,
};
pub use flow::{ConfirmationPolicy, PaymentFlowController, PaymentStep, TransactionStatus};
pub use gateway::{
    HttpPaymentGateway, PaymentError, PaymentGateway, StatusReport, StkPushAccepted,
    StkPushRequest,
};
pub use phone::normalize_phone;
