//! Observable store integration tests
//!
//! Exercises the store through the public API with a record of its own,
//! the way a UI component declares its local state.

use nagan_playback::{fields, AttributeValue, Element, Store};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Editor {
    title: String,
    artist: String,
    display: String,
    rating: u8,
}

fields! {
    Editor;
    Title("title") => title: String;
    Artist("artist") => artist: String;
    Display("display") => display: String;
    Rating("rating") => rating: u8;
}

/// Minimal DOM-like element: attributes plus named event handlers
#[derive(Default)]
struct Input {
    attributes: RefCell<HashMap<String, String>>,
    handlers: RefCell<Vec<(String, Rc<dyn Fn()>)>>,
}

impl Input {
    fn type_text(&self, value: &str) {
        self.attributes
            .borrow_mut()
            .insert("value".to_string(), value.to_string());
        let handlers: Vec<_> = self
            .handlers
            .borrow()
            .iter()
            .filter(|(event, _)| event == "change")
            .map(|(_, handler)| Rc::clone(handler))
            .collect();
        for handler in handlers {
            handler();
        }
    }
}

impl Element for Input {
    fn get_attribute(&self, name: &str) -> Option<String> {
        self.attributes.borrow().get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.attributes
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    fn add_event_listener(&self, event: &str, handler: Box<dyn Fn()>) {
        self.handlers
            .borrow_mut()
            .push((event.to_string(), Rc::from(handler)));
    }
}

#[test]
fn test_computed_field_tracks_dependencies() {
    let store = Store::new(Editor::default());
    store.compute::<Display>(|editor| format!("{} - {}", editor.artist, editor.title));

    store.set::<Title>("Blue".to_string());
    store.set::<Artist>("Ada".to_string());
    assert_eq!(store.get::<Display>(), "Ada - Blue");

    store.set::<Title>("Green".to_string());
    assert_eq!(store.get::<Display>(), "Ada - Green");
}

#[test]
fn test_delete_restores_direct_reads() {
    let store = Store::new(Editor::default());
    store.compute::<Display>(|editor| editor.title.to_uppercase());
    store.set::<Title>("quiet".to_string());
    assert_eq!(store.get::<Display>(), "QUIET");

    store.delete::<Display>();
    store.set::<Display>("manual".to_string());

    assert_eq!(store.get::<Display>(), "manual");
}

#[test]
fn test_listener_chain_drains_synchronously() {
    let store = Store::new(Editor::default());
    let log = Rc::new(RefCell::new(Vec::new()));

    let weak = store.downgrade();
    let sink = Rc::clone(&log);
    store.add_listener::<Title>(move |title| {
        sink.borrow_mut().push(format!("title={title}"));
        if let Some(store) = weak.upgrade() {
            store.set::<Artist>(format!("by {title}"));
        }
    });
    let sink = Rc::clone(&log);
    store.add_listener::<Artist>(move |artist| sink.borrow_mut().push(format!("artist={artist}")));

    store.set::<Title>("x".to_string());
    log.borrow_mut().push("returned".to_string());

    assert_eq!(*log.borrow(), vec!["title=x", "artist=by x", "returned"]);
}

#[test]
fn test_bidi_round_trip_with_numeric_field() {
    let store = Store::new(Editor {
        rating: 3,
        ..Editor::default()
    });
    let input = Rc::new(Input::default());

    store.bidi::<Rating, _>(&input);
    assert_eq!(input.get_attribute("value").as_deref(), Some("3"));

    input.type_text("5");
    assert_eq!(store.get::<Rating>(), 5);

    store.set::<Rating>(1);
    assert_eq!(input.get_attribute("value").as_deref(), Some("1"));

    input.type_text("900");
    assert_eq!(store.get::<Rating>(), 1, "out-of-range input is ignored");
}

#[test]
fn test_bidi_listener_can_be_removed() {
    let store = Store::new(Editor::default());
    let input = Rc::new(Input::default());
    let id = store.bidi::<Title, _>(&input);

    assert!(store.remove_listener::<Title>(id));
    store.set::<Title>("unbound".to_string());

    assert_eq!(input.get_attribute("value").as_deref(), Some(""));
}

#[test]
fn test_bool_attribute_encoding() {
    assert_eq!(true.to_attribute(), "true");
    assert_eq!(false.to_attribute(), "");
    assert_eq!(bool::from_attribute("false"), Some(false));
    assert_eq!(bool::from_attribute("on"), Some(true));
}

#[test]
fn test_dropped_store_silences_weak_listeners() {
    let store = Store::new(Editor::default());
    let weak = store.downgrade();
    drop(store);

    assert!(weak.upgrade().is_none());
}
