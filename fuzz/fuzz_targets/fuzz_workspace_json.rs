#![no_main]

use chartdeck_layout::WorkspaceSnapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = WorkspaceSnapshot::from_json(json) else {
        return;
    };

    // Anything that loads has passed validation.
    assert!(snapshot.layout.validate().is_ok());
    assert!(!snapshot.layout.invariant_report().has_errors());

    // And survives a save/load cycle unchanged.
    let saved = snapshot.to_json().expect("loaded snapshot must serialize");
    let reloaded = WorkspaceSnapshot::from_json(&saved).expect("saved snapshot must reload");
    assert_eq!(reloaded.layout, snapshot.layout);
});
