//! Cypher function vocabulary recognized by the translator.
//!
//! Maps Cypher function names to a classification with a static lookup
//! table. Names are matched case-insensitively, as Neo4j treats
//! function names.

use std::collections::HashMap;

pub const COUNT: &str = "count";
pub const DATE: &str = "date";
pub const TIME: &str = "time";
pub const LOCAL_TIME: &str = "localtime";
pub const DATE_TIME: &str = "datetime";
pub const LOCAL_DATE_TIME: &str = "localdatetime";
pub const DURATION: &str = "duration";
pub const IDENTITY: &str = "id";
pub const TO_LOWER: &str = "tolower";
pub const TO_UPPER: &str = "toupper";
pub const NODE_LABELS: &str = "labels";
pub const EDGE_TYPE: &str = "type";
pub const STRING_SPLIT_TO_ARRAY: &str = "split";
pub const TO_STRING: &str = "tostring";
pub const TO_INTEGER: &str = "toint";
pub const LIST_SIZE: &str = "size";
pub const COALESCE: &str = "coalesce";
pub const COLLECT: &str = "collect";

// ITTC - Instant Type; Temporal Component
// (https://neo4j.com/docs/cypher-manual/current/functions/temporal/)
pub const ITTC_YEAR: &str = "year";
pub const ITTC_MONTH: &str = "month";
pub const ITTC_DAY: &str = "day";
pub const ITTC_HOUR: &str = "hour";
pub const ITTC_MINUTE: &str = "minute";
pub const ITTC_SECOND: &str = "second";
pub const ITTC_MILLISECOND: &str = "millisecond";
pub const ITTC_MICROSECOND: &str = "microsecond";
pub const ITTC_NANOSECOND: &str = "nanosecond";
pub const ITTC_TIMEZONE: &str = "timezone";
pub const ITTC_EPOCH_SECONDS: &str = "epochseconds";
pub const ITTC_EPOCH_MILLISECONDS: &str = "epochmillis";

/// Rough family of a recognized function, used for dispatch and for
/// consumers that need to distinguish aggregating calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionClass {
    Aggregate,
    Temporal,
    String,
    Entity,
    List,
    Coercion,
    Scalar,
}

lazy_static::lazy_static! {
    static ref FUNCTION_CLASSES: HashMap<&'static str, FunctionClass> = {
        let mut m = HashMap::new();

        m.insert(COUNT, FunctionClass::Aggregate);
        m.insert(COLLECT, FunctionClass::Aggregate);

        m.insert(DATE, FunctionClass::Temporal);
        m.insert(TIME, FunctionClass::Temporal);
        m.insert(LOCAL_TIME, FunctionClass::Temporal);
        m.insert(DATE_TIME, FunctionClass::Temporal);
        m.insert(LOCAL_DATE_TIME, FunctionClass::Temporal);
        m.insert(DURATION, FunctionClass::Temporal);

        m.insert(TO_LOWER, FunctionClass::String);
        m.insert(TO_UPPER, FunctionClass::String);
        m.insert(STRING_SPLIT_TO_ARRAY, FunctionClass::String);

        m.insert(IDENTITY, FunctionClass::Entity);
        m.insert(NODE_LABELS, FunctionClass::Entity);
        m.insert(EDGE_TYPE, FunctionClass::Entity);

        m.insert(LIST_SIZE, FunctionClass::List);

        m.insert(TO_STRING, FunctionClass::Coercion);
        m.insert(TO_INTEGER, FunctionClass::Coercion);

        m.insert(COALESCE, FunctionClass::Scalar);

        m
    };
}

/// Classify a function by name, or `None` when the function is not
/// part of the recognized vocabulary.
pub fn function_class(name: &str) -> Option<FunctionClass> {
    let lowered = name.to_lowercase();
    FUNCTION_CLASSES.get(lowered.as_str()).copied()
}
