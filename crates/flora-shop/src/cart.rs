//! The shopping cart store.
//!
//! [`CartStore`] owns the ordered line items of the current cart and writes
//! them through to a [`KeyValueStore`] after every state change, so that
//! reopening a store on the same medium reconstructs the same cart.
//!
//! # Invariants
//!
//! - At most one line per flower id; adding an id already in the cart bumps
//!   its quantity instead of adding a second line.
//! - Every held line has `quantity >= 1`; setting a quantity of zero or less
//!   removes the line.
//! - Insertion order is kept, across removals and reloads.
//! - [`total`](CartStore::total) and [`item_count`](CartStore::item_count)
//!   are computed from the lines on every call.
//!
//! Persistence failures never reach the caller. They are logged, recorded in
//! [`is_durable`](CartStore::is_durable), and the in-memory cart keeps
//! working.

use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::{debug, warn};

use flora_core::{CartLineItem, CatalogItem, FlowerId, Money};
use flora_storage::KeyValueStore;

/// Default storage key for the serialized cart.
pub const CART_KEY: &str = "cart";

/// Cart state plus the medium it persists to.
pub struct CartStore<S: KeyValueStore> {
    medium: S,
    key: String,
    lines: IndexMap<FlowerId, CartLineItem>,
    durable: bool,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Opens the cart stored under [`CART_KEY`], or an empty cart.
    pub fn open(medium: S) -> Self {
        Self::open_with_key(medium, CART_KEY)
    }

    /// Opens the cart stored under `key`, or an empty cart.
    ///
    /// Never fails: an absent or unreadable snapshot yields an empty cart.
    pub fn open_with_key(medium: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let lines = hydrate(&medium, &key);
        debug!(key = %key, lines = lines.len(), "cart opened");
        CartStore {
            medium,
            key,
            lines,
            durable: true,
        }
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Adds one unit of `item`: a new line with quantity 1, or +1 on the
    /// existing line for the same id. The existing line keeps the name, price
    /// and image captured when it was first added.
    pub fn add_item(&mut self, item: CatalogItem) {
        match self.lines.entry(item.id.clone()) {
            Entry::Occupied(mut entry) => {
                let line = entry.get_mut();
                line.quantity = line.quantity.saturating_add(1);
                debug!(id = %line.id, quantity = line.quantity, "cart line incremented");
            }
            Entry::Vacant(entry) => {
                debug!(id = %item.id, "cart line added");
                entry.insert(CartLineItem::from_catalog(item));
            }
        }
        self.persist();
    }

    /// Removes the line for `id`. Unknown ids are ignored.
    pub fn remove_item(&mut self, id: &str) {
        if self.lines.shift_remove(id).is_some() {
            debug!(id, "cart line removed");
            self.persist();
        }
    }

    /// Sets the quantity of the line for `id` to exactly `quantity`.
    ///
    /// Zero or negative removes the line. Unknown ids are ignored. Setting
    /// the current quantity only writes when the last write failed.
    pub fn set_quantity(&mut self, id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let Some(line) = self.lines.get_mut(id) else {
            return;
        };
        if line.quantity != quantity {
            line.quantity = quantity;
            debug!(id, quantity, "cart line quantity set");
        } else if self.durable {
            return;
        }
        self.persist();
    }

    /// Changes the quantity of the line for `id` by `delta` (the +/- buttons).
    ///
    /// Going to zero or below removes the line. Unknown ids are ignored.
    pub fn adjust_quantity(&mut self, id: &str, delta: i64) {
        if let Some(current) = self.quantity_of(id) {
            self.set_quantity(id, i64::from(current).saturating_add(delta));
        }
    }

    /// Removes every line and persists the empty cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        debug!(key = %self.key, "cart cleared");
        self.persist();
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Sum of unit price times quantity over all lines.
    pub fn total(&self) -> Money {
        self.lines.values().map(CartLineItem::subtotal).sum()
    }

    /// Sum of quantities over all lines (the badge number).
    pub fn item_count(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity)).sum()
    }

    /// Lines in insertion order.
    pub fn items(&self) -> impl ExactSizeIterator<Item = &CartLineItem> + '_ {
        self.lines.values()
    }

    /// Owned copy of the lines in insertion order.
    pub fn snapshot(&self) -> Vec<CartLineItem> {
        self.lines.values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<&CartLineItem> {
        self.lines.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lines.contains_key(id)
    }

    pub fn quantity_of(&self, id: &str) -> Option<u32> {
        self.lines.get(id).map(|line| line.quantity)
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// False when the most recent write-through failed.
    pub fn is_durable(&self) -> bool {
        self.durable
    }

    /// The storage key this cart is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn medium(&self) -> &S {
        &self.medium
    }

    /// Gives the medium back, dropping the in-memory state.
    pub fn into_medium(self) -> S {
        self.medium
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Writes the full line list to the medium.
    fn persist(&mut self) {
        let lines: Vec<&CartLineItem> = self.lines.values().collect();
        match self.medium.save_json(&self.key, &lines) {
            Ok(()) => self.durable = true,
            Err(e) => {
                self.durable = false;
                warn!(key = %self.key, error = %e, "cart write-through failed; keeping in-memory state");
            }
        }
    }
}

/// Reads the stored snapshot, repairing lines that break the invariants.
///
/// Lines with quantity 0 are dropped; repeated ids are merged into the first
/// occurrence with their quantities summed.
fn hydrate<S: KeyValueStore>(medium: &S, key: &str) -> IndexMap<FlowerId, CartLineItem> {
    let stored: Vec<CartLineItem> = match medium.load_json(key) {
        Ok(Some(lines)) => lines,
        Ok(None) => return IndexMap::new(),
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable cart snapshot");
            return IndexMap::new();
        }
    };

    let stored_len = stored.len();
    let mut lines: IndexMap<FlowerId, CartLineItem> = IndexMap::with_capacity(stored_len);
    for line in stored.into_iter().filter(|line| line.quantity > 0) {
        match lines.entry(line.id.clone()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            Entry::Vacant(entry) => {
                entry.insert(line);
            }
        }
    }

    if lines.len() != stored_len {
        warn!(
            key,
            stored = stored_len,
            kept = lines.len(),
            "repaired cart snapshot (empty or duplicate lines)"
        );
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_storage::{InMemoryStore, Namespace, SqliteStore, StorageError};
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn rose() -> CatalogItem {
        CatalogItem::new("f1", "Rose", Money::parse("10000").unwrap()).with_image("r.jpg")
    }

    fn tulip() -> CatalogItem {
        CatalogItem::new("f2", "Tulip", Money::parse("5000").unwrap())
    }

    fn ids<S: KeyValueStore>(cart: &CartStore<S>) -> Vec<(&str, u32)> {
        cart.items()
            .map(|line| (line.id.as_str(), line.quantity))
            .collect()
    }

    #[test]
    fn storefront_scenario() {
        let mut cart = CartStore::open(InMemoryStore::new());
        assert!(cart.is_empty());

        cart.add_item(rose());
        assert_eq!(ids(&cart), vec![("f1", 1)]);
        assert_eq!(cart.total(), Money::from_major(10_000));

        cart.add_item(rose());
        assert_eq!(ids(&cart), vec![("f1", 2)]);
        assert_eq!(cart.total(), Money::from_major(20_000));

        cart.add_item(tulip());
        assert_eq!(ids(&cart), vec![("f1", 2), ("f2", 1)]);
        assert_eq!(cart.total(), Money::from_major(25_000));
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.len(), 2);

        cart.set_quantity("f1", 0);
        assert_eq!(ids(&cart), vec![("f2", 1)]);
        assert_eq!(cart.total(), Money::from_major(5_000));

        cart.clear();
        assert!(cart.snapshot().is_empty());
        assert_eq!(cart.total(), Money::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn repeat_add_keeps_first_snapshot() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        let mut repriced = rose();
        repriced.name = "Red Rose".into();
        repriced.price = Money::from_major(99);
        cart.add_item(repriced);

        let line = cart.get("f1").unwrap();
        assert_eq!(line.name, "Rose");
        assert_eq!(line.price, Money::from_major(10_000));
        assert_eq!(line.quantity, 2);
    }

    #[test]
    fn set_quantity_is_absolute() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        cart.add_item(rose());
        cart.set_quantity("f1", 5);
        assert_eq!(cart.quantity_of("f1"), Some(5));
        cart.set_quantity("f1", 1);
        assert_eq!(cart.quantity_of("f1"), Some(1));
    }

    #[test]
    fn set_quantity_zero_or_negative_removes() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        cart.add_item(tulip());
        cart.set_quantity("f1", 0);
        cart.set_quantity("f2", -1);
        assert!(!cart.contains("f1"));
        assert!(!cart.contains("f2"));
        assert!(cart.is_empty());
    }

    #[test]
    fn adjust_quantity_steps_and_removes_at_zero() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        cart.adjust_quantity("f1", 1);
        assert_eq!(cart.quantity_of("f1"), Some(2));
        cart.adjust_quantity("f1", -1);
        cart.adjust_quantity("f1", -1);
        assert!(!cart.contains("f1"));
        cart.adjust_quantity("unknown", 3);
        assert!(cart.is_empty());
    }

    #[test]
    fn unknown_ids_leave_state_untouched() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        cart.add_item(tulip());
        let before_items = cart.snapshot();
        let before_bytes = cart.medium().get(CART_KEY).unwrap();

        cart.remove_item("unknown");
        cart.set_quantity("unknown", 5);
        cart.set_quantity("unknown", 0);

        assert_eq!(cart.snapshot(), before_items);
        assert_eq!(cart.medium().get(CART_KEY).unwrap(), before_bytes);
    }

    #[test]
    fn order_survives_removal_from_the_middle() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        cart.add_item(tulip());
        cart.add_item(CatalogItem::new("f3", "Lily", Money::from_major(7_000)));
        cart.remove_item("f2");
        cart.add_item(tulip());
        assert_eq!(ids(&cart), vec![("f1", 1), ("f3", 1), ("f2", 1)]);
    }

    #[test]
    fn reload_restores_content_and_order() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(tulip());
        cart.add_item(rose());
        cart.add_item(rose());
        let before = cart.snapshot();

        let reloaded = CartStore::open(cart.into_medium());
        assert_eq!(reloaded.snapshot(), before);
        assert_eq!(reloaded.total(), Money::from_major(25_000));
    }

    #[test]
    fn clear_persists_an_empty_array() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        cart.clear();
        assert_eq!(cart.medium().get(CART_KEY).unwrap().as_deref(), Some("[]"));
        assert!(CartStore::open(cart.into_medium()).is_empty());
    }

    #[test]
    fn persisted_format_is_a_json_array_of_lines() {
        let mut cart = CartStore::open(InMemoryStore::new());
        cart.add_item(rose());
        let raw = cart.medium().get(CART_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([
                {"id": "f1", "name": "Rose", "price": "10000", "imgUrl": "r.jpg", "quantity": 1}
            ])
        );
    }

    #[test]
    fn unreadable_snapshot_starts_empty() {
        let mut medium = InMemoryStore::new();
        medium.set(CART_KEY, "{definitely not a cart").unwrap();
        let mut cart = CartStore::open(medium);
        assert!(cart.is_empty());

        // The next mutation overwrites the garbage.
        cart.add_item(rose());
        assert_eq!(CartStore::open(cart.into_medium()).len(), 1);
    }

    #[test]
    fn hydration_repairs_broken_lines() {
        let mut medium = InMemoryStore::new();
        medium
            .set(
                CART_KEY,
                r#"[
                    {"id":"f1","name":"Rose","price":"10000","quantity":1},
                    {"id":"f2","name":"Tulip","price":"5000","quantity":0},
                    {"id":"f1","name":"Rose","price":"10000","quantity":2}
                ]"#,
            )
            .unwrap();
        let cart = CartStore::open(medium);
        assert_eq!(ids(&cart), vec![("f1", 3)]);
    }

    #[test]
    fn bad_prices_count_as_zero() {
        let mut medium = InMemoryStore::new();
        medium
            .set(
                CART_KEY,
                r#"[
                    {"id":"f1","name":"Rose","price":"10000","quantity":2},
                    {"id":"f2","name":"Mystery","price":"call us","quantity":3},
                    {"id":"f3","name":"Free","quantity":1}
                ]"#,
            )
            .unwrap();
        let cart = CartStore::open(medium);
        assert_eq!(cart.total(), Money::from_major(20_000));
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn write_failure_keeps_cart_usable() {
        // Room for an empty array but not for a line.
        let mut cart = CartStore::open(InMemoryStore::with_quota(CART_KEY.len() + 2));
        cart.add_item(rose());
        assert!(!cart.is_durable());
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total(), Money::from_major(10_000));

        // Emptying the cart fits again and restores durability.
        cart.clear();
        assert!(cart.is_durable());
        assert_eq!(cart.medium().get(CART_KEY).unwrap().as_deref(), Some("[]"));
    }

    /// Medium whose writes can be switched off from outside the cart.
    struct Flaky {
        inner: InMemoryStore,
        failing: Rc<Cell<bool>>,
    }

    impl KeyValueStore for Flaky {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.failing.get() {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: key.len() + value.len(),
                    quota: 0,
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, StorageError> {
            self.inner.keys()
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            self.inner.clear()
        }
    }

    #[test]
    fn unchanged_quantity_retries_a_failed_write() {
        let failing = Rc::new(Cell::new(false));
        let mut cart = CartStore::open(Flaky {
            inner: InMemoryStore::new(),
            failing: Rc::clone(&failing),
        });
        cart.add_item(rose());

        failing.set(true);
        cart.set_quantity("f1", 3);
        assert!(!cart.is_durable());

        failing.set(false);
        cart.set_quantity("f1", 3);
        assert!(cart.is_durable());
        let stored: Vec<CartLineItem> = cart.medium().load_json(CART_KEY).unwrap().unwrap();
        assert_eq!(stored[0].quantity, 3);
    }

    #[test]
    fn unchanged_quantity_skips_the_write_when_durable() {
        let failing = Rc::new(Cell::new(false));
        let mut cart = CartStore::open(Flaky {
            inner: InMemoryStore::new(),
            failing: Rc::clone(&failing),
        });
        cart.add_item(rose());

        failing.set(true);
        cart.set_quantity("f1", 1);
        assert!(cart.is_durable());
    }

    #[test]
    fn custom_key_is_isolated() {
        let mut medium = InMemoryStore::new();
        {
            let mut wishlist = CartStore::open_with_key(&mut medium, "cart:guest");
            wishlist.add_item(rose());
            assert_eq!(wishlist.key(), "cart:guest");
        }
        assert!(CartStore::open(&mut medium).is_empty());
        assert_eq!(CartStore::open_with_key(&mut medium, "cart:guest").len(), 1);
    }

    #[test]
    fn survives_reopen_on_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flora.db");
        let path = path.to_str().unwrap();

        {
            let mut cart = CartStore::open(SqliteStore::new(path, Namespace::Local).unwrap());
            cart.add_item(rose());
            cart.add_item(tulip());
            cart.set_quantity("f2", 4);
        }

        let cart = CartStore::open(SqliteStore::new(path, Namespace::Local).unwrap());
        assert_eq!(ids(&cart), vec![("f1", 1), ("f2", 4)]);
        assert_eq!(cart.total(), Money::from_major(30_000));
    }

    // -----------------------------------------------------------------------
    // Property tests against a plain Vec model
    // -----------------------------------------------------------------------

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize),
        Remove(usize),
        Set(usize, i64),
        Adjust(usize, i64),
        Clear,
    }

    const CATALOG: [(&str, u64); 4] = [("f1", 10_000), ("f2", 5_000), ("f3", 7_250), ("f4", 0)];

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0..CATALOG.len()).prop_map(Op::Add),
            1 => (0..CATALOG.len()).prop_map(Op::Remove),
            2 => ((0..CATALOG.len()), -2i64..6).prop_map(|(i, q)| Op::Set(i, q)),
            1 => ((0..CATALOG.len()), -3i64..3).prop_map(|(i, d)| Op::Adjust(i, d)),
            1 => Just(Op::Clear),
        ]
    }

    fn catalog_item(index: usize) -> CatalogItem {
        let (id, price) = CATALOG[index];
        CatalogItem::new(id, format!("Flower {}", id), Money::from_major(price))
    }

    fn model_set(model: &mut Vec<(usize, i64)>, index: usize, quantity: i64) {
        if let Some(pos) = model.iter().position(|(i, _)| *i == index) {
            if quantity <= 0 {
                model.remove(pos);
            } else {
                model[pos].1 = quantity;
            }
        }
    }

    fn apply(cart: &mut CartStore<InMemoryStore>, model: &mut Vec<(usize, i64)>, op: &Op) {
        match *op {
            Op::Add(i) => {
                cart.add_item(catalog_item(i));
                match model.iter_mut().find(|(idx, _)| *idx == i) {
                    Some(entry) => entry.1 += 1,
                    None => model.push((i, 1)),
                }
            }
            Op::Remove(i) => {
                cart.remove_item(CATALOG[i].0);
                model.retain(|(idx, _)| *idx != i);
            }
            Op::Set(i, q) => {
                cart.set_quantity(CATALOG[i].0, q);
                model_set(model, i, q);
            }
            Op::Adjust(i, d) => {
                cart.adjust_quantity(CATALOG[i].0, d);
                let current = model.iter().find(|(idx, _)| *idx == i).map(|(_, q)| *q);
                if let Some(q) = current {
                    model_set(model, i, q + d);
                }
            }
            Op::Clear => {
                cart.clear();
                model.clear();
            }
        }
    }

    proptest! {
        #[test]
        fn cart_matches_model(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let mut cart = CartStore::open(InMemoryStore::new());
            let mut model: Vec<(usize, i64)> = Vec::new();

            for op in &ops {
                apply(&mut cart, &mut model, op);

                let expected_ids: Vec<(&str, u32)> = model
                    .iter()
                    .map(|(i, q)| (CATALOG[*i].0, *q as u32))
                    .collect();
                prop_assert_eq!(ids(&cart), expected_ids);

                let expected_total: u64 = model.iter().map(|(i, q)| CATALOG[*i].1 * (*q as u64)).sum();
                prop_assert_eq!(cart.total(), Money::from_major(expected_total));

                let expected_count: u64 = model.iter().map(|(_, q)| *q as u64).sum();
                prop_assert_eq!(cart.item_count(), expected_count);
                prop_assert!(cart.items().all(|line| line.quantity >= 1));
            }

            let before = cart.snapshot();
            let reloaded = CartStore::open(cart.into_medium());
            prop_assert_eq!(reloaded.snapshot(), before);
        }

        #[test]
        fn repeated_adds_merge(times in 1usize..30) {
            let mut cart = CartStore::open(InMemoryStore::new());
            for _ in 0..times {
                cart.add_item(rose());
            }
            prop_assert_eq!(cart.len(), 1);
            prop_assert_eq!(cart.quantity_of("f1"), Some(times as u32));
            prop_assert_eq!(cart.total(), Money::from_major(10_000 * times as u64));
        }
    }
}
