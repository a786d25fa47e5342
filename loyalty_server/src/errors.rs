use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use loyalty_engine::{BalanceApiError, OrderFlowError, UserApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The login '{0}' is already taken")]
    LoginTaken(String),
    #[error("Invalid order number: '{0}'")]
    InvalidOrderNumber(String),
    #[error("Invalid amount. {0}")]
    InvalidAmount(String),
    #[error("Order {0} belongs to another user")]
    OrderConflict(String),
    #[error("Insufficient balance. {0}")]
    InsufficientBalance(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AuthError::HashingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::LoginTaken(_) => StatusCode::CONFLICT,
            Self::OrderConflict(_) => StatusCode::CONFLICT,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Invalid login or password.")]
    InvalidCredentials,
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
    #[error("Could not hash the password. {0}")]
    HashingError(String),
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::LoginTaken(login) => Self::LoginTaken(login),
            UserApiError::DatabaseError(e) => {
                error!("💻️ Database error in user management. {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::InvalidOrderNumber(n) => Self::InvalidOrderNumber(n),
            OrderFlowError::OrderOwnedByOther(n) => Self::OrderConflict(n.to_string()),
            OrderFlowError::DatabaseError(e) => {
                error!("💻️ Database error in order flow. {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
            // Handlers deal with empty listings themselves, and accrual errors never escape a listing
            e @ (OrderFlowError::NoOrders | OrderFlowError::Accrual(_)) => Self::BackendError(e.to_string()),
        }
    }
}

impl From<BalanceApiError> for ServerError {
    fn from(e: BalanceApiError) -> Self {
        match e {
            BalanceApiError::InvalidOrderNumber(n) => Self::InvalidOrderNumber(n),
            BalanceApiError::InvalidAmount(p) => Self::InvalidAmount(format!("Withdrawals must be positive, not {p}")),
            BalanceApiError::InsufficientBalance { requested, available } => {
                Self::InsufficientBalance(format!("Requested {requested}, but only {available} is available"))
            },
            BalanceApiError::OrderOwnedByOther(n) => Self::OrderConflict(n.to_string()),
            BalanceApiError::DatabaseError(e) => {
                error!("💻️ Database error in the balance ledger. {e}");
                Self::BackendError(format!("Database error: {e}"))
            },
            e @ BalanceApiError::NoWithdrawals => Self::BackendError(e.to_string()),
        }
    }
}
