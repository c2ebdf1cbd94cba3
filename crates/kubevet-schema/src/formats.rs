//! Format names the validator understands
//!
//! Mirrors the apiserver's allow-list for CRD schema formats; anything
//! outside this set is stripped by the patch engine before validation so a
//! published-but-unenforceable format cannot reject a valid manifest.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;

static SUPPORTED_FORMATS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from([
        "bsonobjectid",
        "uri",
        "email",
        "hostname",
        "ipv4",
        "ipv6",
        "cidr",
        "mac",
        "uuid",
        "uuid3",
        "uuid4",
        "uuid5",
        "isbn",
        "isbn10",
        "isbn13",
        "creditcard",
        "ssn",
        "hexcolor",
        "rgbcolor",
        "byte",
        "password",
        "date",
        "duration",
        "datetime",
        "date-time",
        "int32",
        "int64",
        "float",
        "double",
    ])
});

pub fn is_supported_format(format: &str) -> bool {
    SUPPORTED_FORMATS.contains(format)
}
