//! Property-based tests for entry composition.
//!
//! Every composed entry balances exactly, every line carries exactly one
//! non-zero side, and rounding remainders stay within tolerance.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::compose::{PostingSettings, RawLine, balance, evaluate, totals};
use super::entry::{EntrySide, EventKind};
use super::mapping::AccountMappingTable;
use crate::document::{
    Bill, DocumentHeader, DocumentType, ExpenseClaim, Invoice, LineItem, SalesReceipt, Totals,
    WorkflowDocument,
};
use chrono::NaiveDate;
use docflow_shared::types::{Precision, UserId};

/// Strategy to generate a line item with a cent price.
fn line_item() -> impl Strategy<Value = LineItem> {
    (1i64..20, 1i64..1_000_000, prop::option::of(6100u32..6110)).prop_map(|(qty, cents, category)| {
        let item = LineItem::new("item", Decimal::from(qty), Decimal::new(cents, 2), Precision::CENTS);
        match category {
            Some(code) => item.with_category(code.to_string()),
            None => item,
        }
    })
}

/// Strategy to generate a tax rate between 0% and 25% with 4 decimal places.
fn tax_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=2500).prop_map(|bp| Decimal::new(bp, 4))
}

/// Strategy to generate totals-bearing documents of every posted type.
fn document() -> impl Strategy<Value = (WorkflowDocument, EventKind)> {
    (
        prop::collection::vec(line_item(), 1..8),
        tax_rate(),
        0u32..=100,
        0usize..4,
    )
        .prop_map(|(lines, tax_rate, discount_pct, kind)| {
            let subtotal: Decimal = lines.iter().map(|l| l.amount).sum();
            let discount = Precision::CENTS.round(subtotal * Decimal::from(discount_pct) / Decimal::ONE_HUNDRED);
            let totals = Totals::compute(&lines, tax_rate, discount, Precision::CENTS);
            let header = DocumentHeader::draft("X-2026-00001", UserId::new());
            match kind {
                0 => (
                    Invoice {
                        header,
                        customer: "c".into(),
                        due_date: None,
                        source_quote_id: None,
                        lines,
                        totals,
                    }
                    .into(),
                    EventKind::InvoiceIssued,
                ),
                1 => (
                    SalesReceipt {
                        header,
                        customer: "c".into(),
                        payment_method: "card".into(),
                        lines,
                        totals,
                    }
                    .into(),
                    EventKind::ReceiptRecorded,
                ),
                2 => (
                    Bill {
                        header,
                        vendor: "v".into(),
                        due_date: None,
                        source_order_id: None,
                        lines,
                        totals,
                    }
                    .into(),
                    EventKind::BillReceived,
                ),
                _ => (
                    ExpenseClaim {
                        header,
                        expense_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                        merchant: None,
                        lines,
                        totals,
                    }
                    .into(),
                    EventKind::ExpenseApproved,
                ),
            }
        })
}

/// Strategy to generate sub-cent amounts.
fn mill_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000).prop_map(|mills| Decimal::new(mills, 3))
}

fn raw(side: EntrySide, amount: Decimal) -> RawLine {
    RawLine {
        account_code: "1000".into(),
        account_name: "Account".into(),
        side,
        amount,
        description: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* posted document type, the standard mapping yields a balanced
    /// entry whose debit total equals the document total plus its discount.
    #[test]
    fn prop_documents_post_balanced((document, event) in document()) {
        use crate::document::Document;

        let table = AccountMappingTable::standard();
        let rule = table.rule(document.document_type(), event).unwrap();
        let lines = balance(evaluate(&document, rule), &PostingSettings::default()).unwrap();

        let (debit, credit) = totals(&lines);
        prop_assert_eq!(debit, credit);
        let expected = match document.document_type() {
            DocumentType::Invoice | DocumentType::SalesReceipt => {
                document.totals().total + document.totals().discount_amount
            }
            _ => document.totals().subtotal + document.totals().tax_amount,
        };
        prop_assert_eq!(debit, expected);

        for line in &lines {
            prop_assert!(line.debit_amount.is_zero() != line.credit_amount.is_zero());
            prop_assert!(line.amount() > Decimal::ZERO);
        }
        prop_assert!(lines.iter().all(|l| l.account_code != "7990"));
    }

    /// *For any* exactly balanced set of sub-cent lines, rounding produces a
    /// balanced entry and the rounding line stays within half a cent per line.
    #[test]
    fn prop_rounding_remainder_bounded(debits in prop::collection::vec(mill_amount(), 1..10)) {
        let sum: Decimal = debits.iter().copied().sum();
        let mut raw_lines: Vec<RawLine> = debits.iter().map(|d| raw(EntrySide::Debit, *d)).collect();
        raw_lines.push(raw(EntrySide::Credit, sum));
        let count = raw_lines.len();

        let lines = balance(raw_lines, &PostingSettings::default()).unwrap();
        let (debit, credit) = totals(&lines);
        prop_assert_eq!(debit, credit);

        let rounding: Vec<_> = lines.iter().filter(|l| l.account_code == "7990").collect();
        prop_assert!(rounding.len() <= 1);
        if let Some(line) = rounding.first() {
            let tolerance = Decimal::new(5, 3) * Decimal::from(count);
            prop_assert!(line.amount() <= tolerance);
        }
    }

    /// *For any* unbalanced raw lines, composition is rejected.
    #[test]
    fn prop_unbalanced_rejected(debit in mill_amount(), gap in 1i64..1000) {
        let credit = debit + Decimal::new(gap, 3);
        let result = balance(
            vec![raw(EntrySide::Debit, debit), raw(EntrySide::Credit, credit)],
            &PostingSettings::default(),
        );
        prop_assert!(result.is_err());
    }
}

mod edge_case_tests {
    use super::*;

    #[test]
    fn test_zero_tax_and_discount_lines_are_omitted() {
        let lines = vec![LineItem::new("Widget", Decimal::ONE, Decimal::new(1000, 2), Precision::CENTS)];
        let totals = Totals::compute(&lines, Decimal::ZERO, Decimal::ZERO, Precision::CENTS);
        let document: WorkflowDocument = SalesReceipt {
            header: DocumentHeader::draft("SR-2026-00001", UserId::new()),
            customer: "c".into(),
            payment_method: "cash".into(),
            lines,
            totals,
        }
        .into();
        let table = AccountMappingTable::standard();
        let rule = table.rule(DocumentType::SalesReceipt, EventKind::ReceiptRecorded).unwrap();

        let lines = balance(evaluate(&document, rule), &PostingSettings::default()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].account_name, "Cash");
        assert_eq!(lines[1].account_name, "Sales Revenue");
    }

    #[test]
    fn test_zero_precision_rounds_to_whole_units() {
        let settings = PostingSettings {
            precision: Precision::new(0),
            ..PostingSettings::default()
        };
        let lines = balance(
            vec![
                raw(EntrySide::Debit, Decimal::new(105, 1)),
                raw(EntrySide::Credit, Decimal::new(55, 1)),
                raw(EntrySide::Credit, Decimal::new(5, 0)),
            ],
            &settings,
        )
        .unwrap();
        let (debit, credit) = totals(&lines);
        assert_eq!(debit, credit);
    }
}
