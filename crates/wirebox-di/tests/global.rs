//! Tests for the process-wide default container

use std::sync::Arc;

use serial_test::serial;
use wirebox_di::{global, ClassRegistry, Container, DIError, Value};

fn container() -> Container {
    Container::new(Arc::new(ClassRegistry::new()))
}

#[test]
#[serial]
fn test_default_container_is_set_once() {
    if !global::is_initialized() {
        assert!(global::container().is_none());

        let container = container();
        container.bind("app.name", Value::from("wirebox")).unwrap();
        global::init(container).unwrap();
    }

    assert!(global::is_initialized());
    let default = global::container().unwrap();
    assert_eq!(default.get("app.name").unwrap().as_str(), Some("wirebox"));

    assert!(matches!(
        global::init(self::container()),
        Err(DIError::GlobalAlreadyInitialized)
    ));
}

#[test]
#[serial]
fn test_default_container_handle_shares_bindings() {
    if !global::is_initialized() {
        let container = container();
        container.bind("app.name", Value::from("wirebox")).unwrap();
        global::init(container).unwrap();
    }

    let default = global::container().unwrap();
    default.put("app.mode", Value::from("test")).unwrap();
    assert_eq!(
        global::container().unwrap().get("app.mode").unwrap().as_str(),
        Some("test")
    );
}
