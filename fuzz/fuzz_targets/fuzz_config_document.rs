#![no_main]

use libfuzzer_sys::fuzz_target;
use nspace_config::ConfigStore;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(store) = ConfigStore::parse(text) else {
        return;
    };
    // Anything that parses renders to text that parses to the same document.
    let rendered = store.render();
    let Ok(again) = ConfigStore::parse(&rendered) else {
        panic!("rendered document failed to parse: {rendered:?}");
    };
    assert_eq!(again.render(), rendered);
});
