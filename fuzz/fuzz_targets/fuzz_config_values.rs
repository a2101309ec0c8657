#![no_main]

use libfuzzer_sys::fuzz_target;
use nspace_config::{String2DList, StringDict, StringList};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(list) = StringList::<i64>::parse(text, true) {
        let _ = list.get(list.len() + 3);
        let again = StringList::<i64>::parse(&list.to_string(), true);
        assert_eq!(again.ok(), Some(list));
    }
    if let Ok(rows) = String2DList::<u64>::parse(text, false) {
        let _ = rows.to_string();
    }
    if let Ok(dict) = StringDict::<i64, String>::parse(text) {
        let _ = dict.to_string();
    }
});
