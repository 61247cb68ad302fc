//! Input checks that run before any domain operation touches the store. A
//! failed check never mutates anything.

use chrono::NaiveDate;

use crate::error::LedgerError;
use crate::models::NewLoan;

/// Raw loan input as collected by the borrow form or the `borrow` command.
#[derive(Debug, Clone)]
pub struct LoanRequest {
    pub borrower: String,
    pub item_id: Option<i64>,
    pub borrow_date: NaiveDate,
    pub return_date: NaiveDate,
}

impl LoanRequest {
    /// Check the request against `today` and hand back a loan ready for
    /// persistence. The first failing rule wins.
    pub fn validate(self, today: NaiveDate) -> Result<NewLoan, LedgerError> {
        let borrower = self.borrower.trim();
        if borrower.is_empty() {
            return Err(LedgerError::MissingBorrower);
        }
        if self.borrow_date < today {
            return Err(LedgerError::BorrowDateInPast);
        }
        if self.return_date < self.borrow_date {
            return Err(LedgerError::ReturnBeforeBorrow);
        }
        let item_id = self.item_id.ok_or(LedgerError::NoItemSelected)?;

        Ok(NewLoan {
            borrower_name: borrower.to_string(),
            item_id,
            borrow_date: self.borrow_date,
            return_date: self.return_date,
        })
    }
}

/// Parse an ISO-8601 calendar date typed by the user.
pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, LedgerError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| LedgerError::InvalidDate {
        field,
        value: trimmed.to_string(),
    })
}

/// Record ids start at 1; zero and negatives are rejected before lookup.
pub fn validate_record_id(record_id: i64) -> Result<i64, LedgerError> {
    if record_id <= 0 {
        Err(LedgerError::InvalidRecordId)
    } else {
        Ok(record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn request(borrower: &str, item: Option<i64>, borrow: &str, ret: &str) -> LoanRequest {
        LoanRequest {
            borrower: borrower.to_string(),
            item_id: item,
            borrow_date: date(borrow),
            return_date: date(ret),
        }
    }

    #[rstest]
    #[case(request("", Some(1), "2024-01-10", "2024-01-12"), LedgerError::MissingBorrower)]
    #[case(request("   ", Some(1), "2024-01-10", "2024-01-12"), LedgerError::MissingBorrower)]
    #[case(request("Ann", Some(1), "2024-01-09", "2024-01-12"), LedgerError::BorrowDateInPast)]
    #[case(request("Ann", Some(1), "2024-01-12", "2024-01-11"), LedgerError::ReturnBeforeBorrow)]
    #[case(request("Ann", None, "2024-01-10", "2024-01-10"), LedgerError::NoItemSelected)]
    // borrower is checked before the dates
    #[case(request("", None, "2024-01-01", "2023-01-01"), LedgerError::MissingBorrower)]
    fn rejects_invalid_requests(#[case] request: LoanRequest, #[case] expected: LedgerError) {
        assert_eq!(request.validate(date("2024-01-10")).unwrap_err(), expected);
    }

    #[test]
    fn accepts_same_day_loan_and_trims_borrower() {
        let loan = request("  Ann  ", Some(3), "2024-01-10", "2024-01-10")
            .validate(date("2024-01-10"))
            .unwrap();
        assert_eq!(loan.borrower_name, "Ann");
        assert_eq!(loan.item_id, 3);
    }

    #[test]
    fn parses_iso_dates_only() {
        assert_eq!(parse_date("Borrow Date", " 2024-02-29 ").unwrap(), date("2024-02-29"));
        assert!(matches!(
            parse_date("Return Date", "29/02/2024"),
            Err(LedgerError::InvalidDate { field: "Return Date", .. })
        ));
    }

    #[test]
    fn record_ids_must_be_positive() {
        assert_eq!(validate_record_id(0), Err(LedgerError::InvalidRecordId));
        assert_eq!(validate_record_id(-4), Err(LedgerError::InvalidRecordId));
        assert_eq!(validate_record_id(7), Ok(7));
    }
}
