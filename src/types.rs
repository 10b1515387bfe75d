/// Position of a record in the caller's dataset.
/// Example: `0` for the first row, `N - 1` for the last.
pub type RecordIndex = usize;
/// Canonical scaffold key used to group records.
/// Examples: `c1ccccc1`, `O=C1CCCCC1`, `` (acyclic molecules)
pub type ScaffoldKey = String;
/// Structure encoding supplied per record.
/// Examples: `CC(=O)Oc1ccccc1C(=O)O`, `C[C@H](N)C(=O)O`
pub type SmilesStr = str;
/// Ordered record indices that share one scaffold key.
/// Example: `[0, 2, 7]`
pub type ScaffoldGroup = Vec<RecordIndex>;
