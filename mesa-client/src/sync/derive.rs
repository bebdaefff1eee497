//! Derived state, always recomputed from the order ledger

use shared::models::{Order, PaymentStatus, Table};

fn billable(orders: &[Order], table_number: i32) -> impl Iterator<Item = &Order> {
    orders
        .iter()
        .filter(move |o| o.table_number == table_number && !o.status.is_cancelled())
}

/// `Paid` iff the table has at least one non-cancelled order and all of them are paid
pub fn derive_payment_status(orders: &[Order], table_number: i32) -> PaymentStatus {
    let mut any = false;
    for order in billable(orders, table_number) {
        if !order.paid {
            return PaymentStatus::Unpaid;
        }
        any = true;
    }
    if any {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Unpaid
    }
}

/// True iff every non-cancelled order of the table is paid (vacuously true)
pub fn can_release_table(orders: &[Order], table_number: i32) -> bool {
    billable(orders, table_number).all(|o| o.paid)
}

/// Ids of the orders that still have to be paid, in ledger order
pub fn unpaid_order_ids(orders: &[Order], table_number: i32) -> Vec<String> {
    billable(orders, table_number)
        .filter(|o| !o.paid)
        .map(|o| o.id.clone())
        .collect()
}

/// One above the highest table number, or 1 for an empty floor
pub fn next_table_number(tables: &[Table]) -> i32 {
    tables.iter().map(|t| t.number).max().map_or(1, |n| n + 1)
}

/// Rebind every order of `from` to `to`; returns how many moved
pub fn rekey_orders(orders: &mut [Order], from: i32, to: i32) -> usize {
    if from == to {
        return 0;
    }
    let mut moved = 0;
    for order in orders.iter_mut().filter(|o| o.table_number == from) {
        order.table_number = to;
        moved += 1;
    }
    moved
}
