/// Exchange suffixes brokers append to tickers. Stripped before comparison
/// so that "AAPL.O" and "AAPL" normalize to the same symbol.
///
/// Suffixes outside this list are kept (share classes such as "BRK.B").
pub const EXCHANGE_SUFFIXES: &[&str] = &[".O", ".N", ".L", ".TO", ".OL", ".ST", ".CO", ".HE"];

/// Characters removed from symbols after suffix stripping.
pub const SYMBOL_SEPARATORS: &[char] = &['-', '_'];

/// Trailing corporate-entity words removed from security names.
pub const ENTITY_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "limited",
    "llc",
    "plc",
    "ag",
    "sa",
    "nv",
    "bv",
    "se",
    "spa",
    "gmbh",
    "ab",
    "publ",
    "asa",
    "as",
    "oyj",
    "abp",
];
