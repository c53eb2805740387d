#![no_main]

use fedql_core::query::{Parser, Predicate};
use libfuzzer_sys::fuzz_target;

fn check_tree(predicate: &Predicate) {
    if let Predicate::Logical { children, .. } = predicate {
        assert!(!children.is_empty());
        children.iter().for_each(check_tree);
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(sql) = std::str::from_utf8(data) else {
        return;
    };
    if sql.len() > 10_000 {
        return;
    }

    // Must never panic; parsed logical nodes always have children
    if let Ok(mut parser) = Parser::new(sql) {
        if let Ok(query) = parser.parse() {
            query.filters.iter().for_each(check_tree);
            let _ = query.to_string();
        }
    }
});
