// Browser-only checks for the JS surface

#![cfg(target_arch = "wasm32")]

use tarot_link::ChannelConfig;
use tarot_link::platform::bindings::TarotChannel;
use tarot_link::settings::STORAGE_KEY;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn clear_stored_config() {
    if let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten()) {
        let _ = storage.remove_item(STORAGE_KEY);
    }
}

#[wasm_bindgen_test]
fn test_saved_config_is_loaded_by_later_channels() {
    clear_stored_config();

    let channel = TarotChannel::new(Some(
        r#"{"url":"wss://tarot.example/ws","max_retries":4}"#.to_string(),
    ))
    .unwrap();
    assert!(channel.save_config());

    let loaded = ChannelConfig::load();
    assert_eq!(loaded.url, "wss://tarot.example/ws");
    assert_eq!(loaded.max_retries, 4);

    let restored = TarotChannel::new(None).unwrap();
    assert_eq!(restored.phase(), "idle");

    clear_stored_config();
}

#[wasm_bindgen_test]
fn test_invalid_config_json_is_rejected() {
    assert!(TarotChannel::new(Some("{not json".to_string())).is_err());
}

#[wasm_bindgen_test]
fn test_send_before_connect_is_not_transmitted() {
    let channel = TarotChannel::new(Some(r#"{"url":"ws://127.0.0.1:1/ws"}"#.to_string())).unwrap();
    assert!(!channel.send(r#"{"type":"shuffle"}"#));
    assert!(!channel.send(r#"{"type":"not_a_message"}"#));
    assert!(!channel.is_connected());
    assert_eq!(channel.ready_state(), 3);
}
