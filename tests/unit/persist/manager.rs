use super::*;
use crate::runtime::services::Services;
use crate::runtime::settings::Settings;

fn context() -> RequestContext {
    RequestContext::detached(Arc::new(Services::new(Settings::default())))
}

#[test]
fn session_values_persist_until_cleared() {
    let manager = PersistentFieldManager::new("session");
    let mut rc = context();
    let key = FieldKey::new("Index", "", "count");

    manager.post_change(&mut rc, "", &key, Value::Long(3)).unwrap();
    assert_eq!(manager.gather(&mut rc, "session", &key).unwrap(), Some(Value::Long(3)));
    assert_eq!(manager.gather(&mut rc, "session", &key).unwrap(), Some(Value::Long(3)));

    manager.post_change(&mut rc, "session", &key, Value::Null).unwrap();
    assert_eq!(manager.gather(&mut rc, "session", &key).unwrap(), None);
}

#[test]
fn flash_values_are_read_once() {
    let manager = PersistentFieldManager::new("session");
    let mut rc = context();
    let key = FieldKey::new("Index", "form", "tracker");

    manager.post_change(&mut rc, "flash", &key, Value::from("kept")).unwrap();
    assert_eq!(manager.gather(&mut rc, "flash", &key).unwrap(), Some(Value::from("kept")));
    assert_eq!(manager.gather(&mut rc, "flash", &key).unwrap(), None);
}

#[test]
fn client_values_travel_in_client_state() {
    let manager = PersistentFieldManager::new("session");
    let mut rc = context();
    let key = FieldKey::new("Index", "", "filter");

    manager.post_change(&mut rc, "client", &key, Value::from("open")).unwrap();
    assert_eq!(rc.client_state().len(), 1);
    assert!(rc.encoded_client_state().unwrap().is_some());
    assert_eq!(manager.gather(&mut rc, "client", &key).unwrap(), Some(Value::from("open")));
}

#[test]
fn client_values_must_be_serializable() {
    let manager = PersistentFieldManager::new("session");
    let mut rc = context();
    let key = FieldKey::new("Index", "", "handle");
    let value = Value::object("Thing", Arc::new(5u32));
    assert!(manager.post_change(&mut rc, "client", &key, value).is_err());
}

#[test]
fn discard_forgets_one_page_in_every_strategy() {
    let manager = PersistentFieldManager::new("session");
    let mut rc = context();
    let index = FieldKey::new("Index", "", "a");
    let other = FieldKey::new("Other", "", "a");
    for strategy in ["session", "flash", "client"] {
        manager.post_change(&mut rc, strategy, &index, Value::Long(1)).unwrap();
        manager.post_change(&mut rc, strategy, &other, Value::Long(2)).unwrap();
    }

    manager.discard(&mut rc, "Index").unwrap();
    for strategy in ["session", "client", "flash"] {
        assert_eq!(manager.gather(&mut rc, strategy, &index).unwrap(), None, "{strategy}");
        assert_eq!(manager.gather(&mut rc, strategy, &other).unwrap(), Some(Value::Long(2)), "{strategy}");
    }
}

#[test]
fn unknown_strategy_lists_the_available_ones() {
    let manager = PersistentFieldManager::new("session");
    let err = manager.strategy("cookie").err().unwrap().to_string();
    assert!(err.contains("session, flash, client"), "{err}");
    assert_eq!(manager.default_strategy(), "session");
}
