//! Observable state store
//!
//! A record wrapped so that every field write synchronously notifies the
//! listeners subscribed to that field, in registration order.
//!
//! Fields are addressed by zero-sized marker types implementing [`Field`],
//! normally generated with the [`fields!`](crate::fields) macro:
//!
//! ```rust
//! use nagan_playback::{fields, Store};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Debug, Default)]
//! pub struct Counter {
//!     count: u32,
//! }
//!
//! fields! {
//!     Counter;
//!     Count("count") => count: u32;
//! }
//!
//! let store = Store::new(Counter::default());
//! let seen = Rc::new(Cell::new(0));
//! let sink = Rc::clone(&seen);
//! store.add_listener::<Count>(move |value| sink.set(*value));
//!
//! store.set::<Count>(3);
//! assert_eq!(seen.get(), 3);
//! assert_eq!(store.get::<Count>(), 3);
//! ```
//!
//! Dispatch is single-threaded and reentrant: a listener may write other
//! fields, and those writes drain their own listeners before the outer
//! `set` returns. A listener that writes the field it observes must guard
//! against re-triggering itself.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

/// Named, typed slot inside a store record
pub trait Field: 'static {
    /// Record type the field lives in
    type Record: 'static;

    /// Value stored in the field
    type Value: Clone + Default + 'static;

    /// Field name used for listener and computed registration
    const NAME: &'static str;

    /// Borrow the stored value
    fn slot(record: &Self::Record) -> &Self::Value;

    /// Mutably borrow the stored value
    fn slot_mut(record: &mut Self::Record) -> &mut Self::Value;
}

/// Declare [`Field`] marker types for the fields of a record
///
/// ```rust
/// # use nagan_playback::fields;
/// #[derive(Default)]
/// pub struct Prefs {
///     volume: u8,
/// }
///
/// fields! {
///     Prefs;
///     /// Output volume
///     Volume("volume") => volume: u8;
/// }
/// ```
#[macro_export]
macro_rules! fields {
    (
        $record:ty;
        $(
            $(#[$meta:meta])*
            $marker:ident($name:literal) => $slot:ident: $value:ty;
        )*
    ) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $marker;

            impl $crate::Field for $marker {
                type Record = $record;
                type Value = $value;
                const NAME: &'static str = $name;

                fn slot(record: &Self::Record) -> &Self::Value {
                    &record.$slot
                }

                fn slot_mut(record: &mut Self::Record) -> &mut Self::Value {
                    &mut record.$slot
                }
            }
        )*
    };
}

/// Handle returned by [`Store::add_listener`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<V> = Box<dyn Fn(&V)>;
type Computation<R, V> = Box<dyn Fn(&R) -> V>;

struct Registration {
    id: ListenerId,
    callback: Rc<dyn Any>,
}

struct Inner<R> {
    record: RefCell<R>,
    listeners: RefCell<HashMap<&'static str, Vec<Registration>>>,
    computed: RefCell<HashMap<&'static str, Rc<dyn Any>>>,
    next_listener: Cell<u64>,
}

/// Shared handle to an observable record
///
/// Cloning the handle shares the record; it never copies it.
pub struct Store<R: 'static> {
    inner: Rc<Inner<R>>,
}

/// Non-owning store handle, for listeners that must not keep the store alive
pub struct WeakStore<R: 'static> {
    inner: Weak<Inner<R>>,
}

impl<R: 'static> Store<R> {
    /// Wrap a record
    pub fn new(record: R) -> Self {
        Self {
            inner: Rc::new(Inner {
                record: RefCell::new(record),
                listeners: RefCell::new(HashMap::new()),
                computed: RefCell::new(HashMap::new()),
                next_listener: Cell::new(1),
            }),
        }
    }

    /// Read a field
    ///
    /// Computed fields are evaluated fresh on every read.
    pub fn get<F: Field<Record = R>>(&self) -> F::Value {
        if let Some(entry) = self.computation(F::NAME) {
            if let Some(compute) = entry.downcast_ref::<Computation<R, F::Value>>() {
                let record = self.inner.record.borrow();
                return compute(&*record);
            }
        }

        let record = self.inner.record.borrow();
        F::slot(&*record).clone()
    }

    /// Inspect a field without cloning it
    ///
    /// The closure must not write to the store.
    pub fn with<F: Field<Record = R>, T>(&self, inspect: impl FnOnce(&F::Value) -> T) -> T {
        if self.is_computed::<F>() {
            let value = self.get::<F>();
            return inspect(&value);
        }

        let record = self.inner.record.borrow();
        inspect(F::slot(&*record))
    }

    /// Store a value, then notify the field's listeners in registration order
    pub fn set<F: Field<Record = R>>(&self, value: F::Value) {
        let notified = self.has_listeners(F::NAME).then(|| value.clone());

        {
            let mut record = self.inner.record.borrow_mut();
            *F::slot_mut(&mut *record) = value;
        }

        if let Some(value) = notified {
            self.notify::<F>(&value);
        }
    }

    /// Replace a field with a value derived from its current one
    pub fn update<F: Field<Record = R>>(&self, derive: impl FnOnce(&F::Value) -> F::Value) {
        let next = {
            let record = self.inner.record.borrow();
            derive(F::slot(&*record))
        };
        self.set::<F>(next);
    }

    /// Remove a field: drops any computed registration and resets the
    /// stored value to its default. Listeners are not notified.
    pub fn delete<F: Field<Record = R>>(&self) {
        if self.inner.computed.borrow_mut().remove(F::NAME).is_some() {
            debug!(field = F::NAME, "Computed field removed");
        }

        let mut record = self.inner.record.borrow_mut();
        *F::slot_mut(&mut *record) = F::Value::default();
    }

    /// Register a derived field, overriding direct reads of that name
    pub fn compute<F: Field<Record = R>>(&self, derive: impl Fn(&R) -> F::Value + 'static) {
        let computation: Computation<R, F::Value> = Box::new(derive);
        self.inner
            .computed
            .borrow_mut()
            .insert(F::NAME, Rc::new(computation));
    }

    /// Whether reads of `F` go through a computed registration
    pub fn is_computed<F: Field<Record = R>>(&self) -> bool {
        self.inner.computed.borrow().contains_key(F::NAME)
    }

    /// Subscribe to writes of `F`
    pub fn add_listener<F: Field<Record = R>>(
        &self,
        listener: impl Fn(&F::Value) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);

        let listener: Listener<F::Value> = Box::new(listener);
        self.inner
            .listeners
            .borrow_mut()
            .entry(F::NAME)
            .or_default()
            .push(Registration {
                id,
                callback: Rc::new(listener),
            });

        trace!(field = F::NAME, listener = id.0, "Listener added");
        id
    }

    /// Unsubscribe a listener from `F`
    ///
    /// Returns `false` if the listener was not subscribed to that field.
    pub fn remove_listener<F: Field<Record = R>>(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let Some(registrations) = listeners.get_mut(F::NAME) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|registration| registration.id != id);
        before != registrations.len()
    }

    /// Number of listeners subscribed to `F`
    pub fn listener_count<F: Field<Record = R>>(&self) -> usize {
        self.inner
            .listeners
            .borrow()
            .get(F::NAME)
            .map_or(0, Vec::len)
    }

    /// Bind a field to an element's `value` attribute, synced on `change`
    pub fn bidi<F, E>(&self, element: &Rc<E>) -> ListenerId
    where
        F: Field<Record = R>,
        F::Value: AttributeValue,
        E: Element + 'static,
    {
        self.bidi_with::<F, E>(element, "value", "change")
    }

    /// Bind a field to an element attribute in both directions
    ///
    /// Pushes the current value onto the element once, pushes every later
    /// field write onto the element (skipped when the element already shows
    /// that value), and writes the element's attribute back into the field
    /// whenever `event` fires on the element.
    pub fn bidi_with<F, E>(&self, element: &Rc<E>, attribute: &str, event: &str) -> ListenerId
    where
        F: Field<Record = R>,
        F::Value: AttributeValue,
        E: Element + 'static,
    {
        element.set_attribute(attribute, &self.get::<F>().to_attribute());

        let store = self.downgrade();
        let source = Rc::downgrade(element);
        let read_attribute = attribute.to_string();
        element.add_event_listener(
            event,
            Box::new(move || {
                let (Some(store), Some(element)) = (store.upgrade(), source.upgrade()) else {
                    return;
                };
                let Some(raw) = element.get_attribute(&read_attribute) else {
                    return;
                };
                match <F::Value as AttributeValue>::from_attribute(&raw) {
                    Some(value) => store.set::<F>(value),
                    None => warn!(field = F::NAME, raw = %raw, "Ignoring unparsable element value"),
                }
            }),
        );

        let target = Rc::clone(element);
        let write_attribute = attribute.to_string();
        self.add_listener::<F>(move |value| {
            let next = value.to_attribute();
            if target.get_attribute(&write_attribute).as_deref() != Some(next.as_str()) {
                target.set_attribute(&write_attribute, &next);
            }
        })
    }

    /// Create a non-owning handle
    pub fn downgrade(&self) -> WeakStore<R> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn computation(&self, name: &'static str) -> Option<Rc<dyn Any>> {
        self.inner.computed.borrow().get(name).cloned()
    }

    fn has_listeners(&self, name: &'static str) -> bool {
        self.inner
            .listeners
            .borrow()
            .get(name)
            .is_some_and(|registrations| !registrations.is_empty())
    }

    fn is_subscribed(&self, name: &'static str, id: ListenerId) -> bool {
        self.inner
            .listeners
            .borrow()
            .get(name)
            .is_some_and(|registrations| registrations.iter().any(|r| r.id == id))
    }

    fn notify<F: Field<Record = R>>(&self, value: &F::Value) {
        // Snapshot so listeners can subscribe and unsubscribe while we dispatch
        let snapshot: Vec<(ListenerId, Rc<dyn Any>)> = match self.inner.listeners.borrow().get(F::NAME) {
            Some(registrations) => registrations
                .iter()
                .map(|registration| (registration.id, Rc::clone(&registration.callback)))
                .collect(),
            None => return,
        };

        for (id, callback) in snapshot {
            if !self.is_subscribed(F::NAME, id) {
                continue;
            }
            if let Some(listener) = callback.downcast_ref::<Listener<F::Value>>() {
                listener(value);
            }
        }
    }
}

impl<R: 'static> Clone for Store<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: fmt::Debug + 'static> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Store");
        match self.inner.record.try_borrow() {
            Ok(record) => debug.field("record", &*record),
            Err(_) => debug.field("record", &"<borrowed>"),
        };
        debug
            .field("computed", &self.inner.computed.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<R: 'static> WeakStore<R> {
    /// Recover a strong handle if the store is still alive
    pub fn upgrade(&self) -> Option<Store<R>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<R: 'static> Clone for WeakStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

/// External widget a field can be bound to with [`Store::bidi`]
///
/// Methods take `&self`: elements are handles with their own interior
/// state, the way DOM nodes are.
pub trait Element {
    /// Current value of an attribute
    fn get_attribute(&self, name: &str) -> Option<String>;

    /// Overwrite an attribute
    fn set_attribute(&self, name: &str, value: &str);

    /// Run `handler` whenever `event` fires on the element
    fn add_event_listener(&self, event: &str, handler: Box<dyn Fn()>);
}

/// Conversion between a field value and an element attribute string
pub trait AttributeValue: Sized {
    /// Render for the element
    fn to_attribute(&self) -> String;

    /// Parse the element's value, `None` if it is not representable
    fn from_attribute(raw: &str) -> Option<Self>;
}

impl AttributeValue for String {
    fn to_attribute(&self) -> String {
        self.clone()
    }

    fn from_attribute(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl AttributeValue for bool {
    fn to_attribute(&self) -> String {
        if *self {
            "true".to_string()
        } else {
            String::new()
        }
    }

    fn from_attribute(raw: &str) -> Option<Self> {
        Some(!(raw.is_empty() || raw == "false"))
    }
}

macro_rules! numeric_attribute {
    ($($ty:ty),*) => {
        $(
            impl AttributeValue for $ty {
                fn to_attribute(&self) -> String {
                    self.to_string()
                }

                fn from_attribute(raw: &str) -> Option<Self> {
                    raw.trim().parse().ok()
                }
            }
        )*
    };
}

numeric_attribute!(u8, u16, u32, i32, i64, f64);
