//! Input checks applied before anything touches the store.

use lettre::Address;

use crate::error::{ApiError, ApiResult};
use crate::model::cash::{CashFlow, CashTransaction, NewCashTransaction};
use crate::model::upload::UploadFormat;

pub fn validate_cash_transaction(txn: NewCashTransaction) -> ApiResult<CashTransaction> {
    let kind = CashFlow::parse(&txn.kind)
        .ok_or_else(|| ApiError::InvalidArgument("Type must be 'in' or 'out'.".into()))?;

    if !(txn.amount.is_finite() && txn.amount > 0.0) {
        return Err(ApiError::InvalidArgument("Amount must be positive.".into()));
    }

    if txn.description.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Description is required.".into()));
    }

    Ok(CashTransaction {
        id: txn.id,
        kind,
        amount: txn.amount,
        description: txn.description,
    })
}

/// Case-sensitive suffix match on the uploaded file name.
pub fn upload_format(filename: &str) -> ApiResult<UploadFormat> {
    if filename.ends_with(".csv") {
        Ok(UploadFormat::Csv)
    } else if filename.ends_with(".xlsx") {
        Ok(UploadFormat::Xlsx)
    } else {
        Err(ApiError::UnsupportedMediaType(
            "Unsupported file type. Please upload a CSV or Excel file.".into(),
        ))
    }
}

/// Trims and rejects blank required text fields.
pub fn required<'a>(value: Option<&'a str>, message: &str) -> ApiResult<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::BadRequest(message.to_string())),
    }
}

/// Accepts only a syntactically valid `user@domain` address.
pub fn email_address(raw: &str) -> ApiResult<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| ApiError::BadRequest("Invalid email address".into()))
}
