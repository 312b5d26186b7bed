#![allow(dead_code)]

use proptest::prelude::*;
use std::collections::HashMap;

/// Strategy for generating message type names
pub fn message_type_strategy() -> impl Strategy<Value = String> {
    "[A-Z][a-zA-Z0-9]{0,31}Message"
}

/// Strategy for generating version headers that are not integers
pub fn non_numeric_version_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9.]{0,7}"
}

/// Strategy for generating application headers that do not collide with the
/// well-known keys
pub fn extra_headers_strategy() -> impl Strategy<Value = HashMap<String, String>> {
    prop::collection::hash_map("x-[a-z]{1,12}", "[a-zA-Z0-9 ]{0,24}", 0..6)
}

/// Strategy for generating offsets and partition keys
pub fn offset_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,12}"
}

pub fn partition_key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9-]{1,16}"
}
