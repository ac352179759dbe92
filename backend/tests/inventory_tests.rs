//! Inventory ledger tests
//!
//! Exercises the stock-adjustment semantics the backend enforces inside its
//! database transactions: all-or-nothing order application, signed ledger
//! entries, and the reconciliation invariant (per-product ledger sum equals
//! the authoritative stock count).

use std::collections::BTreeMap;

use proptest::prelude::*;
use shared::models::{AdjustStockInput, CreateOrderInput, OrderLineInput};
use shared::validation::{validate_adjustment_input, validate_order_input};
use uuid::Uuid;

/// In-memory model of the ledger semantics: one shelf per product with an
/// authoritative count and an append-only list of signed entries
#[derive(Default)]
struct Store {
    shelves: BTreeMap<u32, Shelf>,
}

#[derive(Default)]
struct Shelf {
    stock: i32,
    ledger: Vec<i32>,
}

#[derive(Debug, PartialEq)]
enum StoreError {
    UnknownProduct(u32),
    InsufficientStock { product: u32, available: i32 },
}

impl Store {
    fn stock_product(&mut self, id: u32, initial: i32) {
        let shelf = self.shelves.entry(id).or_default();
        shelf.stock += initial;
        if initial != 0 {
            shelf.ledger.push(initial);
        }
    }

    /// Apply an order atomically: validate every line first, then deduct.
    /// A failing line must leave every shelf untouched.
    fn apply_order(&mut self, lines: &[(u32, i32)]) -> Result<(), StoreError> {
        let mut needed: BTreeMap<u32, i32> = BTreeMap::new();
        for &(id, qty) in lines {
            *needed.entry(id).or_insert(0) += qty;
        }

        for (&id, &qty) in &needed {
            let shelf = self
                .shelves
                .get(&id)
                .ok_or(StoreError::UnknownProduct(id))?;
            if shelf.stock < qty {
                return Err(StoreError::InsufficientStock {
                    product: id,
                    available: shelf.stock,
                });
            }
        }

        for (&id, &qty) in &needed {
            let shelf = self.shelves.get_mut(&id).unwrap();
            shelf.stock -= qty;
            shelf.ledger.push(-qty);
        }
        Ok(())
    }

    /// Return an order's stock to the shelves
    fn reverse_order(&mut self, lines: &[(u32, i32)]) {
        for &(id, qty) in lines {
            let shelf = self.shelves.get_mut(&id).unwrap();
            shelf.stock += qty;
            shelf.ledger.push(qty);
        }
    }

    fn adjust(&mut self, id: u32, delta: i32) -> Result<(), StoreError> {
        let shelf = self
            .shelves
            .get_mut(&id)
            .ok_or(StoreError::UnknownProduct(id))?;
        if shelf.stock + delta < 0 {
            return Err(StoreError::InsufficientStock {
                product: id,
                available: shelf.stock,
            });
        }
        shelf.stock += delta;
        shelf.ledger.push(delta);
        Ok(())
    }

    /// The reconciliation invariant
    fn consistent(&self) -> bool {
        self.shelves
            .values()
            .all(|s| s.ledger.iter().map(|&q| i64::from(q)).sum::<i64>() == i64::from(s.stock))
    }
}

mod unit_tests {
    use super::*;

    #[test]
    fn sale_deducts_stock_and_records_negative_entry() {
        let mut store = Store::default();
        store.stock_product(1, 10);

        store.apply_order(&[(1, 4)]).unwrap();

        let shelf = &store.shelves[&1];
        assert_eq!(shelf.stock, 6);
        assert_eq!(shelf.ledger, vec![10, -4]);
        assert!(store.consistent());
    }

    #[test]
    fn oversell_is_rejected_with_available_count() {
        let mut store = Store::default();
        store.stock_product(1, 10);

        // First order of 7 succeeds, second must fail against remaining 3
        store.apply_order(&[(1, 7)]).unwrap();
        let err = store.apply_order(&[(1, 7)]).unwrap_err();

        assert_eq!(
            err,
            StoreError::InsufficientStock {
                product: 1,
                available: 3
            }
        );
        assert_eq!(store.shelves[&1].stock, 3);
        assert!(store.consistent());
    }

    #[test]
    fn failing_line_rolls_back_the_whole_order() {
        let mut store = Store::default();
        store.stock_product(1, 10);
        store.stock_product(2, 1);

        // Second line is short; the first line must not be applied either
        let err = store.apply_order(&[(1, 5), (2, 3)]).unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { product: 2, .. }));

        assert_eq!(store.shelves[&1].stock, 10);
        assert_eq!(store.shelves[&1].ledger, vec![10]);
        assert_eq!(store.shelves[&2].stock, 1);
        assert!(store.consistent());
    }

    #[test]
    fn unknown_product_rolls_back_the_whole_order() {
        let mut store = Store::default();
        store.stock_product(1, 10);

        let err = store.apply_order(&[(1, 2), (99, 1)]).unwrap_err();
        assert_eq!(err, StoreError::UnknownProduct(99));
        assert_eq!(store.shelves[&1].stock, 10);
    }

    #[test]
    fn duplicate_lines_are_checked_against_combined_quantity() {
        let mut store = Store::default();
        store.stock_product(1, 10);

        // 6 + 6 exceeds 10 even though each line alone fits
        assert!(store.apply_order(&[(1, 6), (1, 6)]).is_err());
        assert_eq!(store.shelves[&1].stock, 10);

        store.apply_order(&[(1, 6), (1, 4)]).unwrap();
        assert_eq!(store.shelves[&1].stock, 0);
        assert!(store.consistent());
    }

    #[test]
    fn order_reversal_restores_stock() {
        let mut store = Store::default();
        store.stock_product(1, 10);

        store.apply_order(&[(1, 7)]).unwrap();
        store.reverse_order(&[(1, 7)]);

        assert_eq!(store.shelves[&1].stock, 10);
        assert_eq!(store.shelves[&1].ledger, vec![10, -7, 7]);
        assert!(store.consistent());
    }

    #[test]
    fn manual_adjustment_cannot_take_stock_below_zero() {
        let mut store = Store::default();
        store.stock_product(1, 5);

        assert!(store.adjust(1, -6).is_err());
        assert!(store.adjust(1, -5).is_ok());
        assert_eq!(store.shelves[&1].stock, 0);
        assert!(store.consistent());
    }

    #[test]
    fn empty_order_is_rejected_before_any_state_is_touched() {
        let input = CreateOrderInput {
            customer_id: Uuid::new_v4(),
            items: vec![],
            shipping_address: None,
            notes: None,
        };
        assert!(validate_order_input(&input).is_err());
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for qty in [0, -1] {
            let input = CreateOrderInput {
                customer_id: Uuid::new_v4(),
                items: vec![OrderLineInput {
                    product_id: Uuid::new_v4(),
                    quantity: qty,
                }],
                shipping_address: None,
                notes: None,
            };
            assert!(validate_order_input(&input).is_err(), "quantity {}", qty);
        }
    }

    #[test]
    fn zero_adjustment_is_rejected() {
        let input = AdjustStockInput {
            product_id: Uuid::new_v4(),
            quantity: 0,
            notes: None,
        };
        assert!(validate_adjustment_input(&input).is_err());
    }
}

mod property_tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Order(Vec<(u32, i32)>),
        Reverse(Vec<(u32, i32)>),
        Adjust(u32, i32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let line = (0u32..4, 1i32..20);
        prop_oneof![
            prop::collection::vec(line.clone(), 1..4).prop_map(Op::Order),
            prop::collection::vec(line, 1..3).prop_map(Op::Reverse),
            (0u32..4, -15i32..15).prop_map(|(id, d)| Op::Adjust(id, d)),
        ]
    }

    proptest! {
        /// Whatever sequence of operations runs, the ledger sum always
        /// equals the stock count and stock never goes negative
        #[test]
        fn ledger_always_reconciles(
            initial in prop::collection::vec(0i32..50, 4),
            ops in prop::collection::vec(op_strategy(), 0..40),
        ) {
            let mut store = Store::default();
            for (id, stock) in initial.iter().enumerate() {
                store.stock_product(id as u32, *stock);
            }

            for op in ops {
                match op {
                    Op::Order(lines) => { let _ = store.apply_order(&lines); }
                    Op::Reverse(lines) => {
                        // Only reverse stock that was actually sold; model
                        // returns after a successful order
                        if store.apply_order(&lines).is_ok() {
                            store.reverse_order(&lines);
                        }
                    }
                    Op::Adjust(id, delta) => {
                        if delta != 0 {
                            let _ = store.adjust(id, delta);
                        }
                    }
                }

                prop_assert!(store.consistent());
                prop_assert!(store.shelves.values().all(|s| s.stock >= 0));
            }
        }

        /// A rejected order leaves every shelf exactly as it was
        #[test]
        fn rejected_orders_have_no_side_effects(
            initial in prop::collection::vec(0i32..10, 3),
            lines in prop::collection::vec((0u32..3, 1i32..30), 1..5),
        ) {
            let mut store = Store::default();
            for (id, stock) in initial.iter().enumerate() {
                store.stock_product(id as u32, *stock);
            }

            let before: Vec<i32> = store.shelves.values().map(|s| s.stock).collect();
            let entries_before: usize = store.shelves.values().map(|s| s.ledger.len()).sum();

            if store.apply_order(&lines).is_err() {
                let after: Vec<i32> = store.shelves.values().map(|s| s.stock).collect();
                let entries_after: usize = store.shelves.values().map(|s| s.ledger.len()).sum();
                prop_assert_eq!(before, after);
                prop_assert_eq!(entries_before, entries_after);
            }
        }
    }
}
