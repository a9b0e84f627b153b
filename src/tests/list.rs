use insta::assert_snapshot;
use zbus::zvariant::{self, OwnedValue, Value};

use super::fixture::{single_monitor, three_monitors};
use super::*;
use crate::client::print_state;
use crate::error::{DecodeError, FetchError};

fn format_state(f: &Fixture) -> String {
    let mut out = Vec::new();
    print_state(&mut out, &f.fetch()).unwrap();
    String::from_utf8(out).unwrap().trim_end().to_owned()
}

#[test]
fn single_monitor_listing() {
    let f = Fixture::new(single_monitor());

    assert_snapshot!(format_state(&f), @r"
    Monitor [ DP-1 ] ON
      1920x1080@60 [preferred scale = 1] CURRENT
      1920x1080@60 [preferred scale = 1] PREFERRED
    Logical monitor [ 1920x1080+0+0 ], PRIMARY, scale = 1
      DP-1
    Max screen size: unlimited
    Supported scales:
    ");
}

#[test]
fn three_monitor_listing() {
    let f = Fixture::new(three_monitors());

    assert_snapshot!(format_state(&f), @r"
    Monitor [ eDP-1 ] ON BUILTIN
      2560x1600@60.002 [preferred scale = 2] PREFERRED CURRENT
      1920x1200@59.9502 [preferred scale = 1.5]
    Monitor [ DP-1 ] ON
      3840x2160@60 [preferred scale = 1.5] PREFERRED CURRENT
      2560x1440@143.99 [preferred scale = 1]
    Monitor [ HDMI-1 ] OFF
      1920x1080@60 [preferred scale = 1] PREFERRED
    Logical monitor [ 1280x800+0+0 ], PRIMARY, scale = 2
      eDP-1
    Logical monitor [ 2560x1440+1280+0 ], scale = 1.5
      DP-1
    Max screen size: 8192x8192
    Supported scales: 1 1.25 1.5 1.75 2
    ");
}

#[test]
fn json_listing() {
    let f = Fixture::new(single_monitor());
    let json = serde_json::to_value(f.fetch()).unwrap();

    assert_eq!(json["serial"], 1);
    assert_eq!(json["monitors"][0]["spec"]["connector"], "DP-1");
    assert_eq!(json["monitors"][0]["current_mode"], 0);
    assert_eq!(json["monitors"][0]["preferred_mode"], 1);
    assert_eq!(json["logical_monitors"][0]["monitors"][0], 0);
    assert!(json["max_screen_size"].is_null());
}

#[test]
fn queries_on_fetched_state() {
    let f = Fixture::new(three_monitors());
    let state = f.fetch();

    let hdmi = state.monitor_by_connector("HDMI-1").unwrap();
    assert!(!hdmi.is_active());
    assert!(state.logical_monitor_for(hdmi).is_none());

    let dp = state.monitor_by_connector("DP-1").unwrap();
    assert!(dp.supports_underscanning());
    assert_eq!(dp.display_name.as_deref(), Some("LG Electronics 27\""));
    let logical_monitor = state.logical_monitor_for(dp).unwrap();
    assert_eq!(logical_monitor.layout().x, 1280);

    let primary = state.primary_logical_monitor().unwrap();
    let connectors: Vec<_> = state.monitors_of(primary).map(|m| m.connector()).collect();
    assert_eq!(connectors, ["eDP-1"]);
}

#[test]
fn unknown_layout_mode_fails_the_fetch() {
    let mut wire = three_monitors();
    wire.properties.insert(
        String::from("layout-mode"),
        OwnedValue::from(Value::from(7u32)),
    );
    let f = Fixture::new(wire);

    let err = f.manager.fetch_current_state().unwrap_err();
    assert!(matches!(
        err,
        FetchError::Decode(DecodeError::UnknownLayoutMode(7))
    ));
}

#[test]
fn mistyped_property_fails_the_fetch() {
    let mut wire = three_monitors();
    wire.monitors[1].properties.insert(
        String::from("display-name"),
        OwnedValue::from(Value::from(27u32)),
    );
    let f = Fixture::new(wire);

    let err = f.manager.fetch_current_state().unwrap_err();
    assert!(matches!(
        err,
        FetchError::Decode(DecodeError::InvalidProperty {
            key: "display-name"
        })
    ));
}

#[test]
fn malformed_reply_is_a_decode_error() {
    let f = Fixture::new(single_monitor());
    f.server()
        .fail_next(zbus::Error::Variant(zvariant::Error::IncorrectType));

    let err = f.manager.fetch_current_state().unwrap_err();
    assert!(matches!(err, FetchError::Decode(DecodeError::Payload(_))));

    // Nothing sticks around, the next fetch works.
    assert_eq!(f.fetch().serial, 1);
}

#[test]
fn bus_failure_is_a_transport_error() {
    let f = Fixture::new(single_monitor());
    f.server()
        .fail_next(zbus::Error::Failure(String::from("connection closed")));

    let err = f.manager.fetch_current_state().unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}
