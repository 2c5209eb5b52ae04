//! Overdue evaluation over committed loans

use chrono::{DateTime, Utc};

use crate::models::loan::{Loan, LoanStatus};

/// A loan is overdue while it is still borrowed past its due date
pub fn is_overdue(loan: &Loan, now: DateTime<Utc>) -> bool {
    loan.status == LoanStatus::Borrowed && loan.due_date < now
}

/// Keep the overdue loans, in their original order
pub fn overdue_at<I>(loans: I, now: DateTime<Utc>) -> Vec<Loan>
where
    I: IntoIterator<Item = Loan>,
{
    loans.into_iter().filter(|loan| is_overdue(loan, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn loan(id: i32, status: LoanStatus, due_in_days: i64) -> Loan {
        let now = Utc::now();
        Loan {
            id,
            book_id: 1,
            reader_id: 1,
            loan_date: now - Duration::days(30),
            due_date: now + Duration::days(due_in_days),
            return_date: None,
            status,
        }
    }

    #[test]
    fn borrowed_past_due_is_overdue() {
        assert!(is_overdue(&loan(1, LoanStatus::Borrowed, -1), Utc::now()));
    }

    #[test]
    fn borrowed_not_yet_due_is_not_overdue() {
        assert!(!is_overdue(&loan(1, LoanStatus::Borrowed, 1), Utc::now()));
    }

    #[test]
    fn returned_past_due_is_not_overdue() {
        assert!(!is_overdue(&loan(1, LoanStatus::Returned, -1), Utc::now()));
    }

    #[test]
    fn due_exactly_now_is_not_overdue() {
        let mut l = loan(1, LoanStatus::Borrowed, 0);
        let now = Utc::now();
        l.due_date = now;
        assert!(!is_overdue(&l, now));
    }

    #[test]
    fn overdue_at_filters_and_keeps_order() {
        let loans = vec![
            loan(1, LoanStatus::Borrowed, -3),
            loan(2, LoanStatus::Returned, -3),
            loan(3, LoanStatus::Borrowed, 3),
            loan(4, LoanStatus::Borrowed, -1),
        ];
        let ids: Vec<i32> = overdue_at(loans, Utc::now()).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
