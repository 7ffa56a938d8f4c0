// datacheck-core/src/application/evaluators/fixture.rs

// In-memory card transaction database shared by the evaluator tests.
//
// customers    5 rows: phone has 1 NULL and 1 unmasked value; email has
//              1 NULL and 1 empty string; ssn has 2 unmasked values;
//              ssn_hash has 1 non-hex value.
// transactions 7 rows: (card_no, txn_date) '4111-01'/2024-05-01 appears 3
//              times; merchant 999 is an orphan; amount -500 and 120000;
//              approved_at after 2024-06-02 on txn 3, 4 and 5.
// tgt_transactions holds 5 of the 7 transactions.

use chrono::NaiveDate;

use crate::domain::rule::{RuleDefinition, RuleFamily};
use crate::infrastructure::adapters::DuckDbExecutor;
use crate::ports::clock::FixedClock;

pub(crate) fn card_db() -> anyhow::Result<DuckDbExecutor> {
    let executor = DuckDbExecutor::open_in_memory()?;
    executor.execute_batch(
        r#"
        CREATE TABLE customers (
            customer_id INTEGER,
            name VARCHAR,
            phone VARCHAR,
            email VARCHAR,
            ssn VARCHAR,
            ssn_hash VARCHAR
        );
        INSERT INTO customers VALUES
            (1, 'Kim',  '010-****-1234', 'kim@example.com',  '901010-*******', repeat('ab12', 16)),
            (2, 'Lee',  NULL,            NULL,               '850505-1234567', repeat('zz', 32)),
            (3, 'Park', '010-1234-5678', 'park@example.com', '770707-*******', repeat('CD34', 16)),
            (4, 'Choi', '010-****-4321', '',                 NULL,             NULL),
            (5, 'Jung', '010-****-9999', 'jung@example.com', '880808-2345678', repeat('0f', 32));

        CREATE TABLE merchants (
            merchant_id INTEGER,
            name VARCHAR
        );
        INSERT INTO merchants VALUES (1, 'Coffee'), (2, 'Books'), (3, 'Fuel');

        CREATE TABLE transactions (
            txn_id INTEGER,
            card_no VARCHAR,
            customer_id INTEGER,
            merchant_id INTEGER,
            amount DECIMAL(12,2),
            txn_date DATE,
            approved_at TIMESTAMP,
            status VARCHAR
        );
        INSERT INTO transactions VALUES
            (1, '4111-01', 1,    1,    15000.00,  DATE '2024-05-01', TIMESTAMP '2024-05-01 10:00:00', 'APPROVED'),
            (2, '4111-02', 2,    2,    32000.50,  DATE '2024-05-02', TIMESTAMP '2024-05-02 11:00:00', 'APPROVED'),
            (3, '4111-03', 3,    999,  8000.00,   DATE '2024-05-03', TIMESTAMP '2024-06-03 09:00:00', 'APPROVED'),
            (4, '4111-04', NULL, 1,    -500.00,   DATE '2024-05-04', TIMESTAMP '2024-06-10 12:00:00', 'CANCELLED'),
            (5, '4111-05', 5,    NULL, 120000.00, DATE '2024-07-01', TIMESTAMP '2024-12-31 23:59:59', 'APPROVED'),
            (6, '4111-01', 1,    1,    15000.00,  DATE '2024-05-01', TIMESTAMP '2024-05-01 10:00:00', 'APPROVED'),
            (7, '4111-01', 1,    1,    15000.00,  DATE '2024-05-01', TIMESTAMP '2024-05-01 10:00:05', 'APPROVED');

        CREATE TABLE tgt_transactions AS SELECT * FROM transactions WHERE txn_id <= 5;
        CREATE TABLE empty_transactions AS SELECT * FROM transactions WHERE 1 = 0;

        CREATE TABLE src_settlement (txn_id INTEGER, amount DOUBLE);
        INSERT INTO src_settlement VALUES (1, 15000), (2, 32000.5), (3, 8000), (4, NULL), (5, 100);

        CREATE TABLE tgt_settlement (txn_id INTEGER, amount DOUBLE);
        INSERT INTO tgt_settlement VALUES (1, 15000), (2, 32000), (3, NULL), (4, NULL), (6, 10);
        "#,
    )?;
    Ok(executor)
}

/// Parses a YAML rule and tags it with `family`.
#[allow(clippy::unwrap_used)]
pub(crate) fn rule(family: RuleFamily, yaml: &str) -> RuleDefinition {
    serde_yaml::from_str::<RuleDefinition>(yaml)
        .unwrap()
        .with_family(family)
}

/// 2024-06-02 00:00:00
#[allow(clippy::unwrap_used)]
pub(crate) fn june_second() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}
